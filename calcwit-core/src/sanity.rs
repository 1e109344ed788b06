//! Scheduler instrumentation.
//!
//! The scheduler is generic over an [`Instrumentation`]. [`Bare`] carries no
//! state and compiles every hook away. [`SanityChecked`] keeps a per-signal
//! assignment ledger and enforces write-once signals, assigned-before-read
//! and compile-time constraints. A violation means the circuit compiler
//! produced bad code, so it is logged and the process aborts.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::error;

use crate::field::FieldElement;

/// Invariant violated by generated code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanityViolation {
    #[error("signal assigned twice: {signal}")]
    AssignedTwice { signal: usize },
    #[error("accessing a not assigned signal: {signal}")]
    NotAssigned { signal: usize },
    #[error("constraint doesn't match, {description}: {left} != {right}")]
    ConstraintMismatch {
        description: String,
        left: String,
        right: String,
    },
}

/// Hooks the scheduler calls around signal traffic.
pub trait Instrumentation: Send + Sync + 'static {
    /// Whether this instrumentation performs any checks.
    const ENABLED: bool;

    fn new(n_signals: usize) -> Self;

    /// Forget all assignments except the constant signal.
    fn reset(&self);

    fn on_set(&self, component: usize, signal: usize);

    fn on_get(&self, component: usize, signal: usize);

    fn check_constraint(&self, component: usize, a: &FieldElement, b: &FieldElement, description: &str);

    /// Assignment state of `signal`, if tracked.
    fn is_assigned(&self, signal: usize) -> Option<bool>;
}

/// Production mode: no state, no checks.
#[derive(Debug, Default, Clone, Copy)]
pub struct Bare;

impl Instrumentation for Bare {
    const ENABLED: bool = false;

    fn new(_n_signals: usize) -> Self {
        Bare
    }

    #[inline(always)]
    fn reset(&self) {}

    #[inline(always)]
    fn on_set(&self, _component: usize, _signal: usize) {}

    #[inline(always)]
    fn on_get(&self, _component: usize, _signal: usize) {}

    #[inline(always)]
    fn check_constraint(&self, _component: usize, _a: &FieldElement, _b: &FieldElement, _description: &str) {}

    #[inline(always)]
    fn is_assigned(&self, _signal: usize) -> Option<bool> {
        None
    }
}

/// Development mode: tracks which signals have been written.
#[derive(Debug)]
pub struct SanityChecked {
    assigned: Vec<AtomicBool>,
}

impl SanityChecked {
    /// Record a write to `signal`; fails if it was already written.
    pub fn mark_assigned(&self, signal: usize) -> Result<(), SanityViolation> {
        if self.assigned[signal].swap(true, Ordering::AcqRel) {
            return Err(SanityViolation::AssignedTwice { signal });
        }
        Ok(())
    }

    pub fn ensure_assigned(&self, signal: usize) -> Result<(), SanityViolation> {
        if !self.assigned[signal].load(Ordering::Acquire) {
            return Err(SanityViolation::NotAssigned { signal });
        }
        Ok(())
    }

    pub fn compare(a: &FieldElement, b: &FieldElement, description: &str) -> Result<(), SanityViolation> {
        if a != b {
            return Err(SanityViolation::ConstraintMismatch {
                description: description.to_string(),
                left: a.to_string(),
                right: b.to_string(),
            });
        }
        Ok(())
    }

    /// Signals never written since the last reset.
    pub fn unassigned(&self) -> Vec<usize> {
        self.assigned
            .iter()
            .enumerate()
            .filter(|(_, flag)| !flag.load(Ordering::Acquire))
            .map(|(signal, _)| signal)
            .collect()
    }
}

fn fatal(component: usize, violation: SanityViolation) -> ! {
    error!(component, %violation, "sanity check failed");
    std::process::abort()
}

impl Instrumentation for SanityChecked {
    const ENABLED: bool = true;

    fn new(n_signals: usize) -> Self {
        let assigned: Vec<AtomicBool> = (0..n_signals).map(|_| AtomicBool::new(false)).collect();
        if let Some(one) = assigned.first() {
            one.store(true, Ordering::Release);
        }
        Self { assigned }
    }

    fn reset(&self) {
        for (signal, flag) in self.assigned.iter().enumerate() {
            flag.store(signal == 0, Ordering::Release);
        }
    }

    fn on_set(&self, component: usize, signal: usize) {
        if let Err(violation) = self.mark_assigned(signal) {
            fatal(component, violation);
        }
    }

    fn on_get(&self, component: usize, signal: usize) {
        if let Err(violation) = self.ensure_assigned(signal) {
            fatal(component, violation);
        }
    }

    fn check_constraint(&self, component: usize, a: &FieldElement, b: &FieldElement, description: &str) {
        if let Err(violation) = Self::compare(a, b, description) {
            fatal(component, violation);
        }
    }

    fn is_assigned(&self, signal: usize) -> Option<bool> {
        Some(self.assigned[signal].load(Ordering::Acquire))
    }
}
