use crate::component::Process;
use thiserror::Error;

/// Error type for invalid configurations and operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BiophysError {
    #[error("{0}")]
    Error(String),
    #[error("Unknown variable '{variable}'. Known variables are: {known}")]
    UnknownVariable { variable: String, known: String },
    #[error("Model '{model}' requires a {process} model, but none is bound to this object")]
    MissingProcess { model: String, process: Process },
    #[error("Variable '{variable}' has {length} values, expected 1 or {expected}")]
    MismatchedLength {
        variable: String,
        length: usize,
        expected: usize,
    },
    #[error("Variables must be initialised before simulation: {}", .0.join(", "))]
    UninitializedVariables(Vec<String>),
    #[error("Model '{model}' needs '{variable}' from its {process} model, but '{provider}' does not compute it")]
    MissingOutput {
        model: String,
        process: Process,
        provider: String,
        variable: String,
    },
    #[error("Model '{model}' needs the meteorological variable '{variable}', which is not defined")]
    MissingMeteo { model: String, variable: String },
    #[error("Processes {from} and {to} depend on each other through '{variable}'. Nest one of them inside the other instead")]
    CyclicDependency {
        from: Process,
        to: Process,
        variable: String,
    },
}

/// Convenience type for `Result<T, BiophysError>`.
pub type BiophysResult<T> = Result<T, BiophysError>;
