//! Compiled circuit description.
//!
//! The description is immutable once loaded and shared by every thread of a
//! witness computation: signal count, prime modulus, the input-signal bitmap,
//! and per-component metadata (required inputs, execution mode, evaluation
//! routine, name table).

use std::fmt;
use std::sync::Arc;

use bitvec::prelude::*;

use crate::calcwit::ComponentContext;
use crate::error::{CircuitError, FieldError, Result};
use crate::field::Field;
use crate::name_table::{EntryKind, NameTable};

/// Generated evaluation routine of a component.
///
/// Receives the scheduler context and the index of the component instance
/// being evaluated. Must call [`ComponentContext::finished`] on its own index
/// after its last `set_signal`.
pub type Routine = Arc<dyn Fn(&dyn ComponentContext, usize) -> Result<()> + Send + Sync>;

/// Where a component's routine runs once triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Synchronously on the thread that delivered the last input.
    Inline,
    /// On a newly spawned thread.
    Threaded,
}

/// Static metadata of one component instance.
#[derive(Clone)]
pub struct ComponentDesc {
    /// Template name, for diagnostics.
    pub name: String,
    /// Number of distinct input signals that must arrive before the routine runs.
    pub required_inputs: u32,
    pub mode: ExecutionMode,
    pub routine: Routine,
    pub names: NameTable,
}

impl ComponentDesc {
    pub fn new<F>(name: impl Into<String>, required_inputs: u32, mode: ExecutionMode, routine: F) -> Self
    where
        F: Fn(&dyn ComponentContext, usize) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            required_inputs,
            mode,
            routine: Arc::new(routine),
            names: NameTable::new(),
        }
    }

    pub fn with_names(mut self, names: NameTable) -> Self {
        self.names = names;
        self
    }

    pub fn runs_on_own_thread(&self) -> bool {
        self.mode == ExecutionMode::Threaded
    }
}

impl fmt::Debug for ComponentDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDesc")
            .field("name", &self.name)
            .field("required_inputs", &self.required_inputs)
            .field("mode", &self.mode)
            .field("names", &self.names.len())
            .finish()
    }
}

/// A compiled circuit.
#[derive(Debug, Clone)]
pub struct Circuit {
    prime: String,
    n_signals: usize,
    components: Vec<ComponentDesc>,
    input_map: BitVec<u64, Lsb0>,
}

impl Circuit {
    /// Empty circuit with `n_signals` signals and no inputs flagged.
    pub fn new(prime: impl Into<String>, n_signals: usize) -> Self {
        Self {
            prime: prime.into(),
            n_signals,
            components: Vec::new(),
            input_map: BitVec::repeat(false, n_signals),
        }
    }

    /// Assemble a circuit from loaded parts and validate it.
    pub fn from_parts(
        prime: impl Into<String>,
        n_signals: usize,
        components: Vec<ComponentDesc>,
        input_map: BitVec<u64, Lsb0>,
    ) -> Result<Self, CircuitError> {
        let circuit = Self {
            prime: prime.into(),
            n_signals,
            components,
            input_map,
        };
        circuit.validate()?;
        Ok(circuit)
    }

    /// Append a component; returns its index.
    pub fn push_component(&mut self, component: ComponentDesc) -> usize {
        self.components.push(component);
        self.components.len() - 1
    }

    pub fn with_component(mut self, component: ComponentDesc) -> Self {
        self.push_component(component);
        self
    }

    /// Flag `signal` as an input: writing it counts towards its owner's trigger.
    pub fn mark_input(&mut self, signal: usize) -> Result<(), CircuitError> {
        if signal == 0 {
            return Err(CircuitError::ConstantIsInput);
        }
        if signal >= self.n_signals {
            return Err(CircuitError::SignalOutOfRange {
                signal,
                n_signals: self.n_signals,
            });
        }
        self.input_map.set(signal, true);
        Ok(())
    }

    pub fn with_inputs(mut self, signals: impl IntoIterator<Item = usize>) -> Result<Self, CircuitError> {
        for signal in signals {
            self.mark_input(signal)?;
        }
        Ok(self)
    }

    /// Structural checks run once at load time. Dependency cycles are not
    /// detected.
    pub fn validate(&self) -> Result<(), CircuitError> {
        if self.n_signals == 0 {
            return Err(CircuitError::NoSignals);
        }
        if self.input_map.len() != self.n_signals {
            return Err(CircuitError::InputMapLen {
                expected: self.n_signals,
                got: self.input_map.len(),
            });
        }
        if self.input_map[0] {
            return Err(CircuitError::ConstantIsInput);
        }
        self.field()?;

        for (idx, component) in self.components.iter().enumerate() {
            if i32::try_from(component.required_inputs).is_err() {
                return Err(CircuitError::TooManyInputs {
                    component: idx,
                    required: component.required_inputs,
                });
            }
            for (hash, entry) in component.names.iter() {
                let limit = match entry.kind() {
                    EntryKind::Signal => self.n_signals,
                    EntryKind::SubComponent => self.components.len(),
                };
                let end = entry
                    .checked_len()
                    .and_then(|len| entry.offset().checked_add(len))
                    .unwrap_or(usize::MAX);
                if end > limit {
                    return Err(CircuitError::EntryOutOfRange {
                        component: idx,
                        name: component.name.clone(),
                        hash,
                        offset: entry.offset(),
                        end,
                        limit,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn field(&self) -> Result<Field, FieldError> {
        Field::from_decimal(&self.prime)
    }

    pub fn prime(&self) -> &str {
        &self.prime
    }

    pub fn n_signals(&self) -> usize {
        self.n_signals
    }

    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    pub fn component(&self, idx: usize) -> &ComponentDesc {
        &self.components[idx]
    }

    pub fn components(&self) -> &[ComponentDesc] {
        &self.components
    }

    #[inline]
    pub fn is_input(&self, signal: usize) -> bool {
        self.input_map[signal]
    }

    /// Number of signals flagged as inputs.
    pub fn input_count(&self) -> usize {
        self.input_map.count_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str, required: u32) -> ComponentDesc {
        ComponentDesc::new(name, required, ExecutionMode::Inline, |ctx, idx| {
            ctx.finished(idx);
            Ok(())
        })
    }

    #[test]
    fn test_build_and_query() {
        let circuit = Circuit::new("7", 4)
            .with_component(noop("Main", 2))
            .with_inputs([1, 2])
            .unwrap();
        circuit.validate().unwrap();
        assert_eq!(circuit.n_signals(), 4);
        assert_eq!(circuit.n_components(), 1);
        assert!(circuit.is_input(1));
        assert!(!circuit.is_input(3));
        assert_eq!(circuit.input_count(), 2);
        assert_eq!(circuit.component(0).name, "Main");
    }

    #[test]
    fn test_mark_input_bounds() {
        let mut circuit = Circuit::new("7", 3);
        assert_eq!(circuit.mark_input(0), Err(CircuitError::ConstantIsInput));
        assert_eq!(
            circuit.mark_input(3),
            Err(CircuitError::SignalOutOfRange { signal: 3, n_signals: 3 })
        );
    }

    #[test]
    fn test_validate_entry_ranges() {
        let names = NameTable::new().with_signal("in", 2, &[4]).unwrap();
        let circuit = Circuit::new("7", 4).with_component(noop("Main", 0).with_names(names));
        assert!(matches!(
            circuit.validate(),
            Err(CircuitError::EntryOutOfRange { end: 6, limit: 4, .. })
        ));

        let names = NameTable::new().with_sub_component("sub", 1, &[]).unwrap();
        let circuit = Circuit::new("7", 4)
            .with_component(noop("Main", 0).with_names(names))
            .with_component(noop("Sub", 0));
        circuit.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_overflowing_shapes() {
        let names = NameTable::new().with_signal("far", usize::MAX, &[2]).unwrap();
        let circuit = Circuit::new("7", 4).with_component(noop("Main", 0).with_names(names));
        assert!(matches!(
            circuit.validate(),
            Err(CircuitError::EntryOutOfRange { end: usize::MAX, limit: 4, .. })
        ));

        let names = NameTable::new()
            .with_signal("huge", 1, &[u32::MAX, u32::MAX, u32::MAX])
            .unwrap();
        let circuit = Circuit::new("7", 4).with_component(noop("Main", 0).with_names(names));
        assert!(matches!(
            circuit.validate(),
            Err(CircuitError::EntryOutOfRange { end: usize::MAX, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unrepresentable_trigger_count() {
        let required = i32::MAX as u32 + 1;
        let circuit = Circuit::new("7", 2).with_component(noop("Wide", required));
        assert_eq!(
            circuit.validate(),
            Err(CircuitError::TooManyInputs { component: 0, required })
        );
        let circuit = Circuit::new("7", 2).with_component(noop("Edge", i32::MAX as u32));
        circuit.validate().unwrap();
    }

    #[test]
    fn test_from_parts_checks_bitmap_and_prime() {
        let err = Circuit::from_parts("7", 4, vec![], BitVec::repeat(false, 3)).unwrap_err();
        assert_eq!(err, CircuitError::InputMapLen { expected: 4, got: 3 });

        let err = Circuit::from_parts("nope", 1, vec![], BitVec::repeat(false, 1)).unwrap_err();
        assert!(matches!(err, CircuitError::Field(FieldError::InvalidPrime(_))));

        let err = Circuit::from_parts("7", 0, vec![], BitVec::new()).unwrap_err();
        assert_eq!(err, CircuitError::NoSignals);
    }
}
