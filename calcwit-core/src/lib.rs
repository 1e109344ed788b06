//! calcwit-core: concurrent witness calculator for compiled arithmetic circuits.
//!
//! A compiled circuit is a set of component instances. Each component reads
//! input signals, computes, and writes output signals into a shared signal
//! store. This crate schedules those components:
//!
//! - A component fires once all of its declared input signals have been
//!   written ([`calcwit`]).
//! - Threaded components run on their own thread and readers of their outputs
//!   block until they finish, using a fixed pool of lock/condvar slots.
//! - Generated code resolves local names through per-component hash tables
//!   ([`name_table`]).
//! - The [`driver`] feeds named inputs into the main component and extracts
//!   the finished witness.
//!
//! ```text
//!   Inputs ──▶ WitnessCalculator ──▶ CalcWit::reset ──▶ set_signal(main, ..)
//!                                        │                    │ counter hits 0
//!                                        ▼                    ▼
//!                                   CalcWit::join ◀── component routines
//!                                        │
//!                                        ▼
//!                                     Witness
//! ```

pub mod calcwit;
pub mod circuit;
pub mod config;
pub mod driver;
pub mod error;
pub mod field;
pub mod hash;
pub mod inputs;
pub mod name_table;
pub mod sanity;
mod slot_pool;

pub use calcwit::{CalcWit, ComponentContext, FINISHED};
pub use circuit::{Circuit, ComponentDesc, ExecutionMode, Routine};
pub use config::Config;
pub use driver::{Witness, WitnessCalculator};
pub use error::{CircuitError, FieldError, InputError, ResolutionError, Result, WitnessError};
pub use field::{Field, FieldElement};
pub use hash::fnv1a;
pub use inputs::Inputs;
pub use name_table::{EntryKind, NameEntry, NameTable};
pub use sanity::{Bare, Instrumentation, SanityChecked};
