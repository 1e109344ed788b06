//! Synthetic layered circuit.
//!
//! ```text
//!   main.in[w] ──▶ layer 0 ──▶ layer 1 ──▶ ... ──▶ layer d-1 ──▶ main.out[w]
//! ```
//!
//! Cell `(l, j)` has two inputs `a` and `b` and computes `out = a * b + 1`.
//! Its output feeds `(l+1, j).a` and `(l+1, (j+1) % w).b`. Layer 0 takes
//! `a = in[j]`, `b = in[(j+1) % w]`. Main is threaded and waits for the last
//! layer, which is always threaded; other cells are threaded every
//! `threaded_every` cells and inline otherwise. Every signal and cell is
//! reached through name-table lookups, the way generated code does it.

use std::sync::Arc;

use anyhow::Result;
use calcwit_core::{fnv1a, Circuit, ComponentDesc, ExecutionMode, Field, FieldElement, NameTable};

pub const BN254_PRIME: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

#[derive(Debug, Clone, Copy)]
pub struct Shape {
    pub width: usize,
    pub depth: usize,
    /// Every n-th cell runs on its own thread; 0 keeps all but the last
    /// layer inline.
    pub threaded_every: usize,
}

impl Shape {
    /// Component index of cell `(layer, column)`. Main is component 0.
    fn cell(&self, layer: usize, column: usize) -> usize {
        1 + layer * self.width + column
    }

    /// First signal of cell `(layer, column)`: `a`, then `b`, then `out`.
    fn cell_base(&self, layer: usize, column: usize) -> usize {
        1 + 2 * self.width + 3 * (layer * self.width + column)
    }

    pub fn n_signals(&self) -> usize {
        1 + 2 * self.width + 3 * self.width * self.depth
    }

    pub fn n_components(&self) -> usize {
        1 + self.width * self.depth
    }

    fn mode(&self, layer: usize, column: usize) -> ExecutionMode {
        let n = layer * self.width + column;
        if layer + 1 == self.depth || (self.threaded_every > 0 && n % self.threaded_every == 0) {
            ExecutionMode::Threaded
        } else {
            ExecutionMode::Inline
        }
    }
}

struct Hashes {
    input: u64,
    layer: u64,
    a: u64,
    b: u64,
    out: u64,
}

impl Hashes {
    fn new() -> Self {
        Self {
            input: fnv1a("in"),
            layer: fnv1a("layer"),
            a: fnv1a("a"),
            b: fnv1a("b"),
            out: fnv1a("out"),
        }
    }
}

/// Build the circuit for `shape`. Width and depth must be non-zero.
pub fn build(shape: Shape) -> Result<Circuit> {
    anyhow::ensure!(shape.width > 0 && shape.depth > 0, "width and depth must be non-zero");
    let hashes = Arc::new(Hashes::new());
    let w = shape.width;
    let width = u32::try_from(w)?;
    let depth = u32::try_from(shape.depth)?;

    let mut circuit = Circuit::new(BN254_PRIME, shape.n_signals());

    let main_names = NameTable::new()
        .with_signal("in", 1, &[width])?
        .with_signal("out", 1 + w, &[width])?
        .with_sub_component("layer", shape.cell(0, 0), &[depth, width])?;
    let h = hashes.clone();
    circuit.push_component(
        ComponentDesc::new("Main", width, ExecutionMode::Threaded, move |ctx, idx| {
            let input = ctx.get_signal_offset(idx, h.input)?;
            let output = ctx.get_signal_offset(idx, h.out)?;
            let first = ctx.get_sub_component_offset(idx, h.layer)?;
            let values = (0..w)
                .map(|j| ctx.get_signal(idx, idx, input + j))
                .collect::<calcwit_core::Result<Vec<_>>>()?;

            for j in 0..w {
                let cell = first + j;
                let a = ctx.get_signal_offset(cell, h.a)?;
                let b = ctx.get_signal_offset(cell, h.b)?;
                ctx.set_signal(idx, cell, a, values[j].clone())?;
                ctx.set_signal(idx, cell, b, values[(j + 1) % w].clone())?;
            }

            let last = first + (shape.depth - 1) * w;
            for j in 0..w {
                let cell = last + j;
                let out = ctx.get_signal_offset(cell, h.out)?;
                let v = ctx.get_signal(idx, cell, out)?;
                ctx.set_signal(idx, idx, output + j, v)?;
            }
            ctx.finished(idx);
            Ok(())
        })
        .with_names(main_names),
    );

    for layer in 0..shape.depth {
        for column in 0..w {
            let base = shape.cell_base(layer, column);
            let names = NameTable::new()
                .with_signal("a", base, &[])?
                .with_signal("b", base + 1, &[])?
                .with_signal("out", base + 2, &[])?;
            let next = (layer + 1 < shape.depth)
                .then(|| (shape.cell(layer + 1, column), shape.cell(layer + 1, (column + 1) % w)));
            let h = hashes.clone();
            circuit.push_component(
                ComponentDesc::new(
                    format!("Cell[{}][{}]", layer, column),
                    2,
                    shape.mode(layer, column),
                    move |ctx, idx| {
                        let a = ctx.get_signal(idx, idx, ctx.get_signal_offset(idx, h.a)?)?;
                        let b = ctx.get_signal(idx, idx, ctx.get_signal_offset(idx, h.b)?)?;
                        let field = ctx.field();
                        let out = field.add(&field.mul(&a, &b), &field.element(1));
                        ctx.set_signal(idx, idx, ctx.get_signal_offset(idx, h.out)?, out.clone())?;
                        if let Some((right, diagonal)) = next {
                            let a_next = ctx.get_signal_offset(right, h.a)?;
                            ctx.set_signal(idx, right, a_next, out.clone())?;
                            let b_next = ctx.get_signal_offset(diagonal, h.b)?;
                            ctx.set_signal(idx, diagonal, b_next, out)?;
                        }
                        ctx.finished(idx);
                        Ok(())
                    },
                )
                .with_names(names),
            );
            circuit.mark_input(base)?;
            circuit.mark_input(base + 1)?;
        }
    }
    for j in 0..w {
        circuit.mark_input(1 + j)?;
    }
    circuit.validate()?;
    Ok(circuit)
}

/// Evaluate the layered recurrence sequentially; returns `main.out`.
pub fn expected_outputs(shape: Shape, field: &Field, inputs: &[u64]) -> Vec<FieldElement> {
    let w = shape.width;
    let mut row: Vec<FieldElement> = inputs.iter().map(|&v| field.element(v)).collect();
    let mut a = row.clone();
    let mut b: Vec<FieldElement> = (0..w).map(|j| row[(j + 1) % w].clone()).collect();
    for _ in 0..shape.depth {
        row = (0..w)
            .map(|j| field.add(&field.mul(&a[j], &b[j]), &field.element(1)))
            .collect();
        a = row.clone();
        b = (0..w).map(|j| row[(j + w - 1) % w].clone()).collect();
    }
    row
}
