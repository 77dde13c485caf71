use alloy_primitives::hex::FromHexError;
use sload_tracer::TracerError;

/// Error types for the sload-evme command
#[derive(Debug, thiserror::Error)]
pub(crate) enum EvmeError {
    /// Failed to read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid hex string
    #[error("Invalid hex string: {0}")]
    InvalidHex(#[from] FromHexError),

    /// Malformed JSON input or unrenderable output
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tracer lookup or rendering failed
    #[error("Tracer error: {0}")]
    Tracer(#[from] TracerError),

    /// The transaction was rejected before execution
    #[error("EVM execution error: {0}")]
    ExecutionError(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for the sload-evme command
pub(crate) type Result<T> = std::result::Result<T, EvmeError>;
