//! Time-integration back-ends and their dispatch.
//!
//! Every back-end implements [`IntegrationBackend`]: it receives a
//! [`SolveRequest`] and returns a [`SolverResult`] whose `converged` flag says
//! whether the whole record could be integrated. Non-convergence is a normal
//! outcome, not an error; errors are reserved for requests a back-end cannot
//! even start on.
//!
//! # Back-ends
//!
//! - **Newmark-Newton**: average-acceleration Newmark with Newton-Raphson
//!   equilibrium iterations at every step.
//! - **Newmark-Substep**: the same scheme, retrying a non-converging step on
//!   recursively halved increments.
//!
//! # Dispatch
//!
//! ```text
//! solver id ──▶ SolverRegistry::resolve
//!                 ├─ "auto"  → Auto([Newmark-Newton, Newmark-Substep])
//!                 ├─ name    → Single(backend)
//!                 └─ other   → SolverError::UnknownSolver
//! ```

pub mod newmark;
pub mod options;
pub mod registry;
pub mod substep;
pub mod traits;

pub use newmark::{NEWMARK_NEWTON, NewmarkNewton};
pub use options::{NewmarkOptions, SolverOptions, SubstepOptions};
pub use registry::{AUTO, Dispatched, SolverRegistry, SolverStrategy, free_vibration_duration};
pub use substep::{NEWMARK_SUBSTEP, NewmarkSubstep};
pub use traits::*;
