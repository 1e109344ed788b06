//! Error types for circuit loading, name resolution and witness computation.

use crate::name_table::EntryKind;

/// Errors raised while building or parsing field elements.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("invalid prime modulus: {0:?}")]
    InvalidPrime(String),
    #[error("invalid field element literal: {0:?}")]
    InvalidLiteral(String),
}

/// Errors raised when a name hash cannot be resolved in a component's table.
///
/// These indicate that generated code and circuit metadata disagree; the
/// driver treats them as fatal for the current computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("hash not found: {hash:#018x}")]
    NotFound { hash: u64 },
    #[error("invalid type for hash {hash:#018x}: expected {expected}, found {found}")]
    TypeMismatch {
        hash: u64,
        expected: EntryKind,
        found: EntryKind,
    },
}

/// Errors raised while assembling or validating a circuit description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CircuitError {
    #[error("name hash 0 is reserved for empty slots")]
    ReservedHash,
    #[error("duplicate name hash {hash:#018x}")]
    DuplicateHash { hash: u64 },
    #[error("name table full, cannot insert {hash:#018x}")]
    TableFull { hash: u64 },
    #[error("circuit has no signals")]
    NoSignals,
    #[error("input bitmap covers {got} signals, circuit has {expected}")]
    InputMapLen { expected: usize, got: usize },
    #[error("signal {signal} out of range ({n_signals} signals)")]
    SignalOutOfRange { signal: usize, n_signals: usize },
    #[error("signal 0 is the constant wire and cannot be an input")]
    ConstantIsInput,
    #[error("component {component} requires {required} inputs, more than a trigger counter holds")]
    TooManyInputs { component: usize, required: u32 },
    #[error(
        "component {component} ({name}): entry {hash:#018x} spans {offset}..{end}, limit is {limit}"
    )]
    EntryOutOfRange {
        component: usize,
        name: String,
        hash: u64,
        offset: usize,
        end: usize,
        limit: usize,
    },
    #[error("main component {main} out of range ({n_components} components)")]
    MainComponentOutOfRange { main: usize, n_components: usize },
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Errors raised while turning a driver input document into signal values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("invalid input document: {0}")]
    Json(String),
    #[error("input document must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("input {name:?} must be a number, a decimal string or an array, got {found}")]
    UnsupportedValue { name: String, found: &'static str },
    #[error("input {name:?}: invalid number {literal:?}")]
    InvalidNumber { name: String, literal: String },
    #[error("input {name:?} has {got} values, signal shape {sizes:?} needs {expected}")]
    Shape {
        name: String,
        sizes: Vec<u32>,
        expected: usize,
        got: usize,
    },
}

/// Error type for witness computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WitnessError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Circuit(#[from] CircuitError),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("component {component} failed: {message}")]
    ComponentFailed { component: usize, message: String },
    #[error("component {component} panicked: {message}")]
    ComponentPanicked { component: usize, message: String },
    #[error("failed to spawn thread for component {component}: {message}")]
    Spawn { component: usize, message: String },
    #[error("witness task failed: {0}")]
    Task(String),
    #[error("witness computation aborted")]
    Aborted,
}

impl WitnessError {
    /// Failure reported by a component routine itself.
    pub fn component(component: usize, message: impl Into<String>) -> Self {
        WitnessError::ComponentFailed {
            component,
            message: message.into(),
        }
    }
}

pub type Result<T, E = WitnessError> = std::result::Result<T, E>;
