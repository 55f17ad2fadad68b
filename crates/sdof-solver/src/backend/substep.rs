//! Newmark with adaptive step halving.

use crate::backend::newmark::Integrator;
use crate::backend::traits::{IntegrationBackend, SolveRequest, SolverResult};
use crate::error::Result;

pub const NEWMARK_SUBSTEP: &str = "Newmark-Substep";

/// Retries a non-converging step on two half steps, recursively, before
/// giving up. The ground acceleration is interpolated linearly inside the
/// recorded step and only recorded instants enter the history.
///
/// Halving helps when the step increment is too large for the iteration
/// budget or tolerance. A bilinear law needs the same few iterations to
/// cross yield at any step size.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewmarkSubstep;

impl IntegrationBackend for NewmarkSubstep {
    fn name(&self) -> &str {
        NEWMARK_SUBSTEP
    }

    fn solve(&self, request: &SolveRequest<'_>) -> Result<SolverResult> {
        let subdivisions = request.options.substep.max_subdivisions;
        Ok(Integrator::new(request)?.run(NEWMARK_SUBSTEP, subdivisions))
    }
}
