//! Error types for snapshot acquisition and decoding.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Fatal inventory failures. Malformed individual fields never surface
/// here; they are defaulted during parsing.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("{program}: command not found")]
    CommandNotFound { program: String },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {secs} seconds")]
    Timeout { program: String, secs: u64 },

    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} produced output that is not valid UTF-8")]
    NotUtf8 { program: String },

    #[error("interrupted while waiting for the inventory")]
    Interrupted,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read inventory from stdin: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("invalid JSON inventory: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid JSON inventory: {0}")]
    Shape(String),
}
