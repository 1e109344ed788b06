//! Witness calculator driver.
//!
//! Owns the circuit and configuration and runs complete computations:
//! reset, feed inputs by name into the main component, join, extract.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::calcwit::CalcWit;
use crate::circuit::Circuit;
use crate::config::Config;
use crate::error::{CircuitError, InputError, Result, WitnessError};
use crate::field::FieldElement;
use crate::hash::fnv1a;
use crate::inputs::Inputs;
use crate::name_table::element_count;
use crate::sanity::{Bare, Instrumentation, SanityChecked};

/// Final value of every signal, indexed by signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    values: Vec<FieldElement>,
}

impl Witness {
    pub fn new(values: Vec<FieldElement>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, signal: usize) -> Option<&FieldElement> {
        self.values.get(signal)
    }

    pub fn values(&self) -> &[FieldElement] {
        &self.values
    }

    /// Decimal rendering of every value.
    pub fn to_decimal_strings(&self) -> Vec<String> {
        self.values.iter().map(ToString::to_string).collect()
    }
}

/// Runs witness computations for one circuit.
pub struct WitnessCalculator {
    config: Config,
    circuit: Arc<Circuit>,
}

impl WitnessCalculator {
    /// Validate `circuit` against `config` and build a calculator.
    pub fn new(circuit: Arc<Circuit>, config: Config) -> Result<Self, CircuitError> {
        circuit.validate()?;
        let main = config.driver.main_component;
        if main >= circuit.n_components() {
            return Err(CircuitError::MainComponentOutOfRange {
                main,
                n_components: circuit.n_components(),
            });
        }
        Ok(Self { config, circuit })
    }

    pub fn circuit(&self) -> &Arc<Circuit> {
        &self.circuit
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compute the witness for `inputs`, blocking the calling thread.
    pub fn calculate(&self, inputs: &Inputs) -> Result<Witness> {
        if self.config.scheduler.sanity_check {
            self.run::<SanityChecked>(inputs)
        } else {
            self.run::<Bare>(inputs)
        }
    }

    /// Compute the witness on tokio's blocking pool.
    pub async fn calculate_async(self: Arc<Self>, inputs: Inputs) -> Result<Witness> {
        tokio::task::spawn_blocking(move || self.calculate(&inputs))
            .await
            .map_err(|e| WitnessError::Task(e.to_string()))?
    }

    fn run<I: Instrumentation>(&self, inputs: &Inputs) -> Result<Witness> {
        let started = Instant::now();
        let calc = CalcWit::<I>::new(self.circuit.clone(), &self.config.scheduler)?;
        let main = self.config.driver.main_component;
        let field = calc.field().clone();

        // Nothing is dispatched until every input resolves with the right shape.
        let mut resolved = Vec::with_capacity(inputs.len());
        for (name, values) in inputs.iter() {
            let hash = fnv1a(name);
            let offset = calc.get_signal_offset(main, hash)?;
            let sizes = calc.get_signal_sizes(main, hash)?;
            let expected = element_count(sizes).unwrap_or(usize::MAX);
            if values.len() != expected {
                return Err(InputError::Shape {
                    name: name.to_string(),
                    sizes: sizes.to_vec(),
                    expected,
                    got: values.len(),
                }
                .into());
            }
            resolved.push((name, offset, values));
        }

        let fed = calc.reset().and_then(|()| {
            for &(name, offset, values) in &resolved {
                debug!(input = name, offset, count = values.len(), "feeding input");
                for (i, v) in values.iter().enumerate() {
                    calc.set_signal(main, main, offset + i, field.reduce_signed(v))?;
                }
            }
            Ok(())
        });
        if let Err(e) = fed {
            calc.abort(e);
        }

        calc.join()?;
        info!(
            signals = self.circuit.n_signals(),
            components = self.circuit.n_components(),
            inputs = inputs.len(),
            sanity = I::ENABLED,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "witness computed"
        );
        Ok(Witness::new(calc.signal_values()))
    }
}
