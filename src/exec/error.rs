//! Typed error taxonomy for remote calls

use thiserror::Error;

/// Errors surfaced by the executor and the layers built on it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// Missing or malformed input, detected before any remote call
    #[error("InvalidParameter: {0}")]
    InvalidParameter(String),

    /// Envelope accessor used on the wrong variant
    #[error("InvalidState: {0}")]
    InvalidState(String),

    /// Error reported by the remote API, passed through as-is
    #[error("{code}: {message}")]
    Remote { code: String, message: String },

    /// Transient failure that persisted through every attempt
    #[error("MaxRetriesExceeded after {attempts} attempts ({code}: {message})")]
    MaxRetriesExceeded {
        attempts: u32,
        code: String,
        message: String,
        exit_status: Option<i32>,
    },

    /// Credentials or region could not be established
    #[error("InitializationError: {0}")]
    Initialization(String),
}

impl ExecError {
    /// Process exit code for this error
    ///
    /// Exhausted retries pass the underlying tool's status through; everything
    /// else is a generic failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecError::MaxRetriesExceeded {
                exit_status: Some(status),
                ..
            } if *status != 0 => *status,
            _ => 1,
        }
    }

    /// Short machine-readable code
    pub fn code(&self) -> &str {
        match self {
            ExecError::InvalidParameter(_) => "InvalidParameter",
            ExecError::InvalidState(_) => "InvalidState",
            ExecError::Remote { code, .. } => code,
            ExecError::MaxRetriesExceeded { .. } => "MaxRetriesExceeded",
            ExecError::Initialization(_) => "InitializationError",
        }
    }
}
