//! Error types for sdof-solver

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SolverError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Unknown solver: {0}")]
    UnknownSolver(String),

    #[error("No back-end is listed for the auto strategy")]
    NoCandidates,

    #[error("Unknown material kind: {0}")]
    UnknownMaterial(String),

    #[error("Invalid parameters for {kind}: {message}")]
    MaterialParameters { kind: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Back-end {backend} failed")]
    Backend {
        backend: String,
        #[source]
        source: Box<SolverError>,
    },
}
