//! SDOF time-history solver layer.
//!
//! This crate holds everything a worker needs between the copied numeric
//! inputs and the recorded response:
//!
//! - [`spectrum`]: elastic spectral acceleration at an arbitrary period
//! - [`material`]: the material description produced by a material function
//! - [`hysteresis`]: force-deformation laws the built-in back-ends understand
//! - [`backend`]: interchangeable time-integration back-ends behind one
//!   contract, plus the registry that dispatches to them (including the
//!   `"auto"` fallback ladder)
//! - [`history`]: the twelve-channel response history and its extremes
//!
//! Units follow the usual N-mm-s convention of the worker: ground motions are
//! given in g and converted with [`GRAVITY`].

pub mod backend;
pub mod error;
pub mod history;
pub mod hysteresis;
pub mod material;
pub mod spectrum;

/// Gravitational acceleration in mm/s².
pub const GRAVITY: f64 = 9800.0;

pub use backend::{
    AUTO, Dispatched, IntegrationBackend, NEWMARK_NEWTON, NEWMARK_SUBSTEP, NewmarkNewton,
    NewmarkOptions, NewmarkSubstep, SolveRequest, SolverOptions, SolverRegistry, SolverResult,
    SolverStrategy, SubstepOptions, free_vibration_duration,
};
pub use error::{Result, SolverError};
pub use history::{CHANNELS, ResponseHistory, ResponsePeaks, ResponseSample};
pub use hysteresis::{Elastic, Hysteretic, ParallelMaterial, Steel01};
pub use material::{MaterialDescription, MaterialEntry, MaterialParams};
pub use spectrum::SpectralInterpolator;
