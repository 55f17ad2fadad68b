//! Error types for sdof-io

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IoError>;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Shared segment not found: {0}")]
    SegmentNotFound(String),

    #[error("Shared segment '{name}' holds {actual_bytes} bytes, expected {expected_bytes}")]
    SegmentSizeMismatch {
        name: String,
        expected_bytes: u64,
        actual_bytes: u64,
    },

    #[error("Invalid segment name: {0:?}")]
    InvalidSegmentName(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
