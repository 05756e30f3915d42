// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid job state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid run phase transition: {from} -> {to}")]
    InvalidRunTransition { from: String, to: String },

    #[error("Job {id} is terminal ({status}) and cannot be mutated")]
    TerminalJob { id: String, status: String },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
