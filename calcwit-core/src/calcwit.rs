//! Signal store and dependency-triggered scheduler.
//!
//! `CalcWit` owns the mutable state of one witness computation: the signal
//! values, one trigger counter per component, and a bounded pool of
//! lock/condvar slots. Component routines talk to it through
//! [`ComponentContext`].
//!
//! ## Firing rule
//!
//! ```text
//!   reset():       remaining[c] = required_inputs[c]; dispatch every c with 0
//!   set_signal():  store value; if signal is an input: remaining[owner] -= 1
//!                  and dispatch owner when it reaches 0
//!   finished(c):   remaining[c] = -1 under c's slot lock, wake the slot
//!   get_signal():  reading another component's signal when that component is
//!                  threaded waits until remaining[owner] == -1
//!   join():        waits for remaining[c] == -1 for every c, in index order
//! ```
//!
//! Threaded components run on their own named thread; their handles are kept
//! in a join set that `join()` reaps. Inline components run on the stack of
//! whoever delivered their last input.
//!
//! When a routine fails (or panics on its own thread) the first failure is
//! recorded, the computation is marked aborted and every slot is woken:
//! blocked readers return [`WitnessError::Aborted`] and `join()` returns the
//! recorded failure. A circuit whose trigger graph never completes still
//! blocks forever.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, trace, warn};

use crate::circuit::{Circuit, ExecutionMode};
use crate::config::SchedulerConfig;
use crate::error::{CircuitError, ResolutionError, Result, WitnessError};
use crate::field::{Field, FieldElement};
use crate::sanity::{Bare, Instrumentation};
use crate::slot_pool::SlotPool;

/// Trigger-counter value of a component whose routine has completed.
pub const FINISHED: i32 = -1;

/// Scheduler operations available to generated component routines.
///
/// Every call takes the index of the calling component as context.
pub trait ComponentContext: Send + Sync {
    /// Arithmetic context of the circuit prime.
    fn field(&self) -> &Field;

    /// Read `signal`, owned by `owner`. Blocks while `owner` is a threaded
    /// component other than `reader` that has not finished.
    fn get_signal(&self, reader: usize, owner: usize, signal: usize) -> Result<FieldElement>;

    /// Write `signal`, owned by `owner`. When `signal` is an input this may
    /// dispatch `owner`, running it inline before returning.
    fn set_signal(&self, writer: usize, owner: usize, signal: usize, value: FieldElement) -> Result<()>;

    /// Assert `a == b` in sanity mode; no-op otherwise.
    fn check_constraint(&self, component: usize, a: &FieldElement, b: &FieldElement, description: &str);

    /// Emit a value through the serialized diagnostic log.
    fn log(&self, value: &FieldElement);

    /// Mark `component` finished and wake its waiters. Called exactly once,
    /// by the component's own routine, after its last `set_signal`.
    fn finished(&self, component: usize);

    /// Current trigger counter of `component` ([`FINISHED`] once done).
    fn remaining_inputs(&self, component: usize) -> i32;

    fn get_sub_component_offset(&self, component: usize, hash: u64) -> Result<usize, ResolutionError>;

    fn get_sub_component_sizes(&self, component: usize, hash: u64) -> Result<&[u32], ResolutionError>;

    fn get_signal_offset(&self, component: usize, hash: u64) -> Result<usize, ResolutionError>;

    fn get_signal_sizes(&self, component: usize, hash: u64) -> Result<&[u32], ResolutionError>;

    /// Scratch array of `n` zeroed field elements.
    fn alloc_big_ints(&self, n: usize) -> Vec<FieldElement> {
        vec![FieldElement::zero(); n]
    }
}

/// Thread settings taken from [`SchedulerConfig`].
#[derive(Debug, Clone)]
struct ThreadOptions {
    name_prefix: String,
    stack_size: Option<usize>,
}

struct Shared<I: Instrumentation> {
    this: Weak<Shared<I>>,
    circuit: Arc<Circuit>,
    field: Field,
    threads: ThreadOptions,
    values: Vec<RwLock<FieldElement>>,
    required: Vec<i32>,
    remaining: Vec<AtomicI32>,
    pool: SlotPool,
    instrumentation: I,
    workers: Mutex<Vec<JoinHandle<()>>>,
    failure: Mutex<Option<WitnessError>>,
    aborted: AtomicBool,
    log_lock: Mutex<()>,
}

/// Witness calculator for one circuit instance.
///
/// `I` selects the instrumentation: [`Bare`] for production,
/// [`SanityChecked`](crate::sanity::SanityChecked) to enforce signal
/// invariants. A computation is `reset()`, fed through `set_signal`, then
/// `join()`ed; `reset()` must not be called while a computation is running.
pub struct CalcWit<I: Instrumentation = Bare> {
    shared: Arc<Shared<I>>,
}

impl<I: Instrumentation> CalcWit<I> {
    /// Validate `circuit` and allocate scheduler state for it. Signal 0 is
    /// set to one; no component is dispatched until [`reset`](Self::reset).
    pub fn new(circuit: Arc<Circuit>, config: &SchedulerConfig) -> Result<Self, CircuitError> {
        circuit.validate()?;
        let field = circuit.field()?;
        let n_signals = circuit.n_signals();

        let mut values: Vec<RwLock<FieldElement>> = Vec::with_capacity(n_signals);
        values.push(RwLock::new(FieldElement::one()));
        values.extend((1..n_signals).map(|_| RwLock::new(FieldElement::zero())));

        let required = circuit
            .components()
            .iter()
            .enumerate()
            .map(|(idx, c)| {
                i32::try_from(c.required_inputs).map_err(|_| CircuitError::TooManyInputs {
                    component: idx,
                    required: c.required_inputs,
                })
            })
            .collect::<Result<Vec<i32>, CircuitError>>()?;
        let remaining = required.iter().map(|&n| AtomicI32::new(n)).collect();

        let threads = ThreadOptions {
            name_prefix: config.thread_name_prefix.clone(),
            stack_size: config.thread_stack_size_bytes(),
        };
        let pool = SlotPool::new(config.mutex_pool_size);

        debug!(
            signals = n_signals,
            components = circuit.n_components(),
            pool_size = pool.len(),
            sanity = I::ENABLED,
            "witness calculator allocated"
        );

        let shared = Arc::new_cyclic(|this| Shared {
            this: this.clone(),
            circuit,
            field,
            threads,
            values,
            required,
            remaining,
            pool,
            instrumentation: I::new(n_signals),
            workers: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            aborted: AtomicBool::new(false),
            log_lock: Mutex::new(()),
        });
        Ok(Self { shared })
    }

    /// Re-arm every trigger counter and dispatch the zero-input components.
    pub fn reset(&self) -> Result<()> {
        self.shared.reset()
    }

    /// Wait until every component has finished, then reap component threads.
    pub fn join(&self) -> Result<()> {
        self.shared.join()
    }

    /// Abort the running computation with `error`. Blocked readers are
    /// released and the next `join()` returns the first recorded failure.
    pub fn abort(&self, error: WitnessError) {
        self.shared.abort(error)
    }

    /// Scheduler interface as seen by component routines.
    pub fn context(&self) -> &dyn ComponentContext {
        self.shared.as_ref()
    }

    pub fn get_signal(&self, reader: usize, owner: usize, signal: usize) -> Result<FieldElement> {
        self.shared.get_signal(reader, owner, signal)
    }

    pub fn set_signal(&self, writer: usize, owner: usize, signal: usize, value: FieldElement) -> Result<()> {
        self.shared.set_signal(writer, owner, signal, value)
    }

    pub fn finished(&self, component: usize) {
        self.shared.finished(component)
    }

    pub fn remaining_inputs(&self, component: usize) -> i32 {
        self.shared.remaining_inputs(component)
    }

    pub fn get_signal_offset(&self, component: usize, hash: u64) -> Result<usize, ResolutionError> {
        self.shared.get_signal_offset(component, hash)
    }

    pub fn get_signal_sizes(&self, component: usize, hash: u64) -> Result<&[u32], ResolutionError> {
        self.shared.get_signal_sizes(component, hash)
    }

    pub fn get_sub_component_offset(&self, component: usize, hash: u64) -> Result<usize, ResolutionError> {
        self.shared.get_sub_component_offset(component, hash)
    }

    pub fn get_sub_component_sizes(&self, component: usize, hash: u64) -> Result<&[u32], ResolutionError> {
        self.shared.get_sub_component_sizes(component, hash)
    }

    /// Scratch array of `n` zeroed field elements.
    pub fn alloc_big_ints(&self, n: usize) -> Vec<FieldElement> {
        self.shared.alloc_big_ints(n)
    }

    /// Release a scratch array obtained from [`alloc_big_ints`](Self::alloc_big_ints).
    pub fn free_big_ints(&self, scratch: Vec<FieldElement>) {
        drop(scratch);
    }

    /// Value of one signal. Only meaningful for a finished owner.
    pub fn signal(&self, signal: usize) -> FieldElement {
        self.shared.values[signal].read().clone()
    }

    /// Snapshot of every signal value, indexed by signal. Call after `join()`.
    pub fn signal_values(&self) -> Vec<FieldElement> {
        self.shared.values.iter().map(|v| v.read().clone()).collect()
    }

    /// Assignment state of `signal` under sanity checking; `None` in bare mode.
    pub fn is_assigned(&self, signal: usize) -> Option<bool> {
        self.shared.instrumentation.is_assigned(signal)
    }

    pub fn circuit(&self) -> &Arc<Circuit> {
        &self.shared.circuit
    }

    pub fn field(&self) -> &Field {
        &self.shared.field
    }

    /// Number of lock/condvar slots.
    pub fn pool_size(&self) -> usize {
        self.shared.pool.len()
    }
}

impl<I: Instrumentation> Shared<I> {
    fn reset(&self) -> Result<()> {
        self.reap_workers();
        *self.failure.lock() = None;
        self.aborted.store(false, Ordering::Release);
        self.instrumentation.reset();

        // All counters are armed before the first dispatch, so a zero-input
        // component that feeds a later one always sees its fresh count.
        for (counter, &required) in self.remaining.iter().zip(&self.required) {
            counter.store(required, Ordering::Release);
        }
        debug!(components = self.remaining.len(), "trigger counters armed");

        for (idx, component) in self.circuit.components().iter().enumerate() {
            if component.required_inputs == 0 {
                self.trigger_component(idx)?;
            }
        }
        Ok(())
    }

    fn trigger_component(&self, idx: usize) -> Result<()> {
        let component = self.circuit.component(idx);
        match component.mode {
            ExecutionMode::Inline => {
                trace!(component = idx, name = %component.name, "running component inline");
                let ctx: &dyn ComponentContext = self;
                let outcome = (component.routine)(ctx, idx);
                if let Err(e) = &outcome {
                    self.fail(idx, e.clone());
                }
                outcome
            }
            ExecutionMode::Threaded => {
                let shared = self.this.upgrade().ok_or(WitnessError::Aborted)?;
                let mut builder =
                    thread::Builder::new().name(format!("{}-{}", self.threads.name_prefix, idx));
                if let Some(stack_size) = self.threads.stack_size {
                    builder = builder.stack_size(stack_size);
                }
                let handle = builder
                    .spawn(move || shared.run_threaded(idx))
                    .map_err(|e| {
                        let err = WitnessError::Spawn {
                            component: idx,
                            message: e.to_string(),
                        };
                        self.fail(idx, err.clone());
                        err
                    })?;
                trace!(component = idx, name = %component.name, "component dispatched to own thread");
                self.workers.lock().push(handle);
                Ok(())
            }
        }
    }

    fn run_threaded(&self, idx: usize) {
        let component = self.circuit.component(idx);
        let started = Instant::now();
        let ctx: &dyn ComponentContext = self;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (component.routine)(ctx, idx)));
        match outcome {
            Ok(Ok(())) => {
                trace!(
                    component = idx,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "threaded component returned"
                );
            }
            Ok(Err(e)) => self.fail(idx, e),
            Err(payload) => self.fail(
                idx,
                WitnessError::ComponentPanicked {
                    component: idx,
                    message: panic_message(payload.as_ref()),
                },
            ),
        }
    }

    /// Record the first failure, release `idx` and every blocked waiter.
    fn fail(&self, idx: usize, error: WitnessError) {
        {
            let mut failure = self.failure.lock();
            if failure.is_none() {
                error!(
                    component = idx,
                    name = %self.circuit.component(idx).name,
                    error = %error,
                    "component failed, aborting witness computation"
                );
                *failure = Some(error);
            }
        }
        self.remaining[idx].store(FINISHED, Ordering::Release);
        self.release_waiters();
    }

    fn abort(&self, error: WitnessError) {
        {
            let mut failure = self.failure.lock();
            if failure.is_none() {
                warn!(error = %error, "witness computation aborted by driver");
                *failure = Some(error);
            }
        }
        self.release_waiters();
    }

    fn release_waiters(&self) {
        self.aborted.store(true, Ordering::Release);
        self.pool.wake_all();
    }

    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    fn wait_finished(&self, component: usize) -> Result<()> {
        let counter = &self.remaining[component];
        self.pool.wait_until(component, || {
            counter.load(Ordering::Acquire) == FINISHED || self.is_aborted()
        });
        if self.is_aborted() {
            return Err(WitnessError::Aborted);
        }
        Ok(())
    }

    fn join(&self) -> Result<()> {
        let started = Instant::now();
        for (idx, counter) in self.remaining.iter().enumerate() {
            self.pool.wait_until(idx, || {
                counter.load(Ordering::Acquire) == FINISHED || self.is_aborted()
            });
            if self.is_aborted() {
                break;
            }
        }
        let reaped = self.reap_workers();

        if let Some(e) = self.failure.lock().clone() {
            return Err(e);
        }
        info!(
            components = self.remaining.len(),
            threads = reaped,
            join_ms = started.elapsed().as_millis() as u64,
            "all components finished"
        );
        Ok(())
    }

    /// Join every spawned component thread. Returns how many were joined.
    fn reap_workers(&self) -> usize {
        let mut reaped = 0;
        loop {
            let handles = std::mem::take(&mut *self.workers.lock());
            if handles.is_empty() {
                return reaped;
            }
            for handle in handles {
                if let Err(payload) = handle.join() {
                    warn!(panic = %panic_message(payload.as_ref()), "component thread panicked outside its routine");
                }
                reaped += 1;
            }
        }
    }
}

impl<I: Instrumentation> ComponentContext for Shared<I> {
    fn field(&self) -> &Field {
        &self.field
    }

    fn get_signal(&self, reader: usize, owner: usize, signal: usize) -> Result<FieldElement> {
        if owner != reader && self.circuit.component(owner).runs_on_own_thread() {
            self.wait_finished(owner)?;
        }
        self.instrumentation.on_get(reader, signal);
        Ok(self.values[signal].read().clone())
    }

    fn set_signal(&self, writer: usize, owner: usize, signal: usize, value: FieldElement) -> Result<()> {
        if self.is_aborted() {
            return Err(WitnessError::Aborted);
        }
        self.instrumentation.on_set(writer, signal);
        *self.values[signal].write() = value;

        if self.circuit.is_input(signal) {
            let previous = self.remaining[owner].fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n > 0).then(|| n - 1)
            });
            if previous == Ok(1) {
                if self.is_aborted() {
                    return Err(WitnessError::Aborted);
                }
                self.trigger_component(owner)?;
            }
        }
        Ok(())
    }

    fn check_constraint(&self, component: usize, a: &FieldElement, b: &FieldElement, description: &str) {
        self.instrumentation.check_constraint(component, a, b, description);
    }

    fn log(&self, value: &FieldElement) {
        let _guard = self.log_lock.lock();
        info!(target: "calcwit::log", "Log: {}", value);
    }

    fn finished(&self, component: usize) {
        let counter = &self.remaining[component];
        self.pool.publish(component, || counter.store(FINISHED, Ordering::Release));
        trace!(component, "component finished");
    }

    fn remaining_inputs(&self, component: usize) -> i32 {
        self.remaining[component].load(Ordering::Acquire)
    }

    fn get_sub_component_offset(&self, component: usize, hash: u64) -> Result<usize, ResolutionError> {
        self.circuit.component(component).names.sub_component_offset(hash)
    }

    fn get_sub_component_sizes(&self, component: usize, hash: u64) -> Result<&[u32], ResolutionError> {
        self.circuit.component(component).names.sub_component_sizes(hash)
    }

    fn get_signal_offset(&self, component: usize, hash: u64) -> Result<usize, ResolutionError> {
        self.circuit.component(component).names.signal_offset(hash)
    }

    fn get_signal_sizes(&self, component: usize, hash: u64) -> Result<&[u32], ResolutionError> {
        self.circuit.component(component).names.signal_sizes(hash)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::ComponentDesc;
    use crate::hash::fnv1a;
    use crate::name_table::NameTable;
    use crate::sanity::SanityChecked;

    fn config() -> SchedulerConfig {
        SchedulerConfig::default()
    }

    /// Signal 1 is the sole output of a zero-input component.
    fn single_component(mode: ExecutionMode) -> Arc<Circuit> {
        let circuit = Circuit::new("101", 2).with_component(ComponentDesc::new(
            "Const",
            0,
            mode,
            |ctx, idx| {
                let v = ctx.field().element(42);
                ctx.set_signal(idx, idx, 1, v)?;
                ctx.finished(idx);
                Ok(())
            },
        ));
        Arc::new(circuit)
    }

    #[test]
    fn test_constant_signal_is_one() {
        let calc = CalcWit::<Bare>::new(single_component(ExecutionMode::Inline), &config()).unwrap();
        assert_eq!(calc.signal(0), FieldElement::one());
        calc.reset().unwrap();
        calc.join().unwrap();
        assert_eq!(calc.signal(0), FieldElement::one());
    }

    #[test]
    fn test_zero_input_component_runs_on_reset() {
        for mode in [ExecutionMode::Inline, ExecutionMode::Threaded] {
            let calc = CalcWit::<Bare>::new(single_component(mode), &config()).unwrap();
            assert_eq!(calc.remaining_inputs(0), 0);
            calc.reset().unwrap();
            calc.join().unwrap();
            assert_eq!(calc.remaining_inputs(0), FINISHED);
            assert_eq!(calc.signal(1), FieldElement::from(42));
        }
    }

    #[test]
    fn test_read_after_write_same_component() {
        let circuit = Circuit::new("101", 3).with_component(ComponentDesc::new(
            "Echo",
            0,
            ExecutionMode::Threaded,
            |ctx, idx| {
                let v = ctx.field().element(9);
                ctx.set_signal(idx, idx, 1, v.clone())?;
                let back = ctx.get_signal(idx, idx, 1)?;
                if back != v {
                    return Err(WitnessError::component(idx, "read-after-write mismatch"));
                }
                ctx.set_signal(idx, idx, 2, back)?;
                ctx.finished(idx);
                Ok(())
            },
        ));
        let calc = CalcWit::<SanityChecked>::new(Arc::new(circuit), &config()).unwrap();
        calc.reset().unwrap();
        calc.join().unwrap();
        assert_eq!(calc.signal(2), FieldElement::from(9));
        assert!((0..3).all(|s| calc.is_assigned(s) == Some(true)));
    }

    #[test]
    fn test_counter_decrements_then_finishes() {
        // Component 0 feeds both inputs (signals 1, 2) of component 1 and
        // records the counter it observes after each write.
        let observed = Arc::new(Mutex::new(Vec::new()));
        let seen = observed.clone();
        let circuit = Circuit::new("101", 4)
            .with_component(ComponentDesc::new("Feeder", 0, ExecutionMode::Inline, move |ctx, idx| {
                seen.lock().push(ctx.remaining_inputs(1));
                ctx.set_signal(idx, 1, 1, ctx.field().element(3))?;
                seen.lock().push(ctx.remaining_inputs(1));
                ctx.set_signal(idx, 1, 2, ctx.field().element(4))?;
                seen.lock().push(ctx.remaining_inputs(1));
                ctx.finished(idx);
                Ok(())
            }))
            .with_component(ComponentDesc::new("Mul", 2, ExecutionMode::Inline, |ctx, idx| {
                let a = ctx.get_signal(idx, idx, 1)?;
                let b = ctx.get_signal(idx, idx, 2)?;
                ctx.set_signal(idx, idx, 3, ctx.field().mul(&a, &b))?;
                ctx.finished(idx);
                Ok(())
            }))
            .with_inputs([1, 2])
            .unwrap();
        let calc = CalcWit::<Bare>::new(Arc::new(circuit), &config()).unwrap();
        calc.reset().unwrap();
        calc.join().unwrap();
        assert_eq!(*observed.lock(), vec![2, 1, FINISHED]);
        assert_eq!(calc.signal(3), FieldElement::from(12));
    }

    #[test]
    fn test_failure_releases_join() {
        let circuit = Circuit::new("101", 2)
            .with_component(ComponentDesc::new("Broken", 0, ExecutionMode::Threaded, |_ctx, idx| {
                Err(WitnessError::component(idx, "boom"))
            }))
            .with_component(ComponentDesc::new("Never", 1, ExecutionMode::Inline, |ctx, idx| {
                ctx.finished(idx);
                Ok(())
            }));
        let calc = CalcWit::<Bare>::new(Arc::new(circuit), &config()).unwrap();
        calc.reset().unwrap();
        let err = calc.join().unwrap_err();
        assert_eq!(err, WitnessError::component(0, "boom"));
    }

    #[test]
    fn test_panic_in_threaded_component_is_reported() {
        let circuit = Circuit::new("101", 2).with_component(ComponentDesc::new(
            "Panics",
            0,
            ExecutionMode::Threaded,
            |_ctx, _idx| panic!("generated code bug"),
        ));
        let calc = CalcWit::<Bare>::new(Arc::new(circuit), &config()).unwrap();
        calc.reset().unwrap();
        match calc.join() {
            Err(WitnessError::ComponentPanicked { component, message }) => {
                assert_eq!(component, 0);
                assert_eq!(message, "generated code bug");
            }
            other => panic!("unexpected join result: {:?}", other),
        }
    }

    #[test]
    fn test_inline_failure_propagates_from_reset() {
        let circuit = Circuit::new("101", 2).with_component(ComponentDesc::new(
            "Lookup",
            0,
            ExecutionMode::Inline,
            |ctx, idx| {
                ctx.get_signal_offset(idx, fnv1a("absent"))?;
                ctx.finished(idx);
                Ok(())
            },
        ));
        let calc = CalcWit::<Bare>::new(Arc::new(circuit), &config()).unwrap();
        let err = calc.reset().unwrap_err();
        assert_eq!(
            err,
            WitnessError::Resolution(ResolutionError::NotFound { hash: fnv1a("absent") })
        );
        assert_eq!(calc.join().unwrap_err(), err);
        // No write is accepted once the computation is aborted.
        assert_eq!(
            calc.set_signal(0, 0, 1, FieldElement::one()),
            Err(WitnessError::Aborted)
        );
        assert_eq!(calc.signal(1), FieldElement::zero());
    }

    #[test]
    fn test_abort_releases_blocked_reader() {
        // Reader (0) waits on Pending (1), whose single input is never written.
        let circuit = Circuit::new("101", 3)
            .with_component(ComponentDesc::new("Reader", 0, ExecutionMode::Threaded, |ctx, idx| {
                let v = ctx.get_signal(idx, 1, 2)?;
                ctx.set_signal(idx, idx, 1, v)?;
                ctx.finished(idx);
                Ok(())
            }))
            .with_component(ComponentDesc::new("Pending", 1, ExecutionMode::Threaded, |ctx, idx| {
                ctx.finished(idx);
                Ok(())
            }))
            .with_inputs([2])
            .unwrap();
        let calc = CalcWit::<Bare>::new(Arc::new(circuit), &config()).unwrap();
        calc.reset().unwrap();
        calc.abort(WitnessError::Task("cancelled".to_string()));
        assert_eq!(calc.join(), Err(WitnessError::Task("cancelled".to_string())));
        assert_eq!(calc.remaining_inputs(1), 1);
    }

    #[test]
    fn test_rejects_unrepresentable_trigger_count() {
        let required = i32::MAX as u32 + 1;
        let circuit = Circuit::new("101", 2).with_component(ComponentDesc::new(
            "Wide",
            required,
            ExecutionMode::Inline,
            |ctx, idx| {
                ctx.finished(idx);
                Ok(())
            },
        ));
        let err = CalcWit::<Bare>::new(Arc::new(circuit), &config()).err().unwrap();
        assert_eq!(err, CircuitError::TooManyInputs { component: 0, required });
    }

    #[test]
    fn test_reset_allows_recomputation() {
        let calc = CalcWit::<SanityChecked>::new(single_component(ExecutionMode::Threaded), &config()).unwrap();
        for _ in 0..3 {
            calc.reset().unwrap();
            calc.join().unwrap();
            assert_eq!(calc.signal(1), FieldElement::from(42));
            assert_eq!(calc.is_assigned(1), Some(true));
        }
    }

    #[test]
    fn test_name_lookups_through_context() {
        let names = NameTable::new()
            .with_signal("out", 1, &[])
            .unwrap()
            .with_sub_component("child", 1, &[])
            .unwrap();
        let circuit = Circuit::new("101", 2)
            .with_component(
                ComponentDesc::new("Parent", 0, ExecutionMode::Inline, |ctx, idx| {
                    ctx.finished(idx);
                    Ok(())
                })
                .with_names(names),
            )
            .with_component(ComponentDesc::new("Child", 0, ExecutionMode::Inline, |ctx, idx| {
                ctx.finished(idx);
                Ok(())
            }));
        let calc = CalcWit::<Bare>::new(Arc::new(circuit), &config()).unwrap();
        assert_eq!(calc.get_signal_offset(0, fnv1a("out")).unwrap(), 1);
        assert!(calc.get_signal_sizes(0, fnv1a("out")).unwrap().is_empty());
        assert_eq!(calc.get_sub_component_offset(0, fnv1a("child")).unwrap(), 1);
        assert!(calc.get_sub_component_sizes(0, fnv1a("child")).unwrap().is_empty());
        assert!(calc.get_signal_offset(1, fnv1a("out")).is_err());
    }

    #[test]
    fn test_scratch_allocation() {
        let calc = CalcWit::<Bare>::new(single_component(ExecutionMode::Inline), &config()).unwrap();
        let scratch = calc.alloc_big_ints(4);
        assert_eq!(scratch.len(), 4);
        assert!(scratch.iter().all(FieldElement::is_zero));
        calc.free_big_ints(scratch);
    }

    #[test]
    fn test_pool_size_from_config() {
        let mut cfg = config();
        cfg.mutex_pool_size = 3;
        let calc = CalcWit::<Bare>::new(single_component(ExecutionMode::Inline), &cfg).unwrap();
        assert_eq!(calc.pool_size(), 3);
    }
}
