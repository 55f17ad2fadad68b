//! Strategy table mapping solver identifiers to back-ends.

use std::sync::Arc;

use log::{debug, info};

use crate::backend::newmark::{NEWMARK_NEWTON, NewmarkNewton};
use crate::backend::substep::{NEWMARK_SUBSTEP, NewmarkSubstep};
use crate::backend::traits::{IntegrationBackend, SolveRequest, SolverResult};
use crate::error::{Result, SolverError};

/// Identifier of the composite fallback strategy.
pub const AUTO: &str = "auto";

/// Free-vibration duration handed to the back-ends: the configured duration
/// or `factor` natural periods, whichever is longer.
pub fn free_vibration_duration(configured: f64, factor: f64, period: Option<f64>) -> f64 {
    match period {
        Some(period) => configured.max(factor * period),
        None => configured,
    }
}

pub struct SolverRegistry {
    backends: Vec<Arc<dyn IntegrationBackend>>,
    auto_priority: Vec<String>,
}

impl SolverRegistry {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            auto_priority: Vec::new(),
        }
    }

    /// Register a back-end, replacing any previous one with the same name.
    pub fn register(&mut self, backend: Arc<dyn IntegrationBackend>) {
        self.backends.retain(|existing| existing.name() != backend.name());
        self.backends.push(backend);
    }

    pub fn with_backend(mut self, backend: Arc<dyn IntegrationBackend>) -> Self {
        self.register(backend);
        self
    }

    /// Declare the order in which `"auto"` tries back-ends.
    ///
    /// # Errors
    /// Returns `UnknownSolver` for a name that is not registered.
    pub fn set_auto_priority<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let names = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                if self.get(name).is_some() {
                    Ok(name.to_string())
                } else {
                    Err(SolverError::UnknownSolver(name.to_string()))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        self.auto_priority = names;
        Ok(())
    }

    pub fn auto_priority(&self) -> &[String] {
        &self.auto_priority
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|backend| backend.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn IntegrationBackend> {
        self.backends
            .iter()
            .find(|backend| backend.name() == name)
            .map(|backend| backend.as_ref())
    }

    /// Resolve a solver identifier without running anything.
    pub fn resolve(&self, id: &str) -> Result<SolverStrategy<'_>> {
        if id == AUTO {
            let ladder = self
                .auto_priority
                .iter()
                .filter_map(|name| self.get(name))
                .collect::<Vec<_>>();
            if ladder.is_empty() {
                return Err(SolverError::NoCandidates);
            }
            return Ok(SolverStrategy::Auto(ladder));
        }
        self.get(id)
            .map(SolverStrategy::Single)
            .ok_or_else(|| SolverError::UnknownSolver(id.to_string()))
    }
}

impl Default for SolverRegistry {
    /// Both Newmark back-ends, Newton first in the `"auto"` ladder.
    fn default() -> Self {
        Self {
            backends: vec![Arc::new(NewmarkNewton), Arc::new(NewmarkSubstep)],
            auto_priority: vec![NEWMARK_NEWTON.to_string(), NEWMARK_SUBSTEP.to_string()],
        }
    }
}

/// A resolved solver identifier.
pub enum SolverStrategy<'r> {
    Single(&'r dyn IntegrationBackend),
    /// Candidates in priority order
    Auto(Vec<&'r dyn IntegrationBackend>),
}

/// Result of a strategy run together with the back-ends that were tried.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub result: SolverResult,
    pub attempts: Vec<String>,
}

impl SolverStrategy<'_> {
    /// Run the strategy.
    ///
    /// A back-end error ends the run immediately, also inside the `"auto"`
    /// ladder. When no candidate converges the last result is returned.
    pub fn run(&self, request: &SolveRequest<'_>) -> Result<Dispatched> {
        let candidates: &[&dyn IntegrationBackend] = match self {
            SolverStrategy::Single(backend) => std::slice::from_ref(backend),
            SolverStrategy::Auto(ladder) => ladder,
        };

        let mut attempts = Vec::with_capacity(candidates.len());
        let mut last = None;
        for backend in candidates {
            let name = backend.name();
            attempts.push(name.to_string());
            let result = backend.solve(request).map_err(|source| SolverError::Backend {
                backend: name.to_string(),
                source: Box::new(source),
            })?;

            if result.converged {
                if attempts.len() > 1 {
                    info!("{name} converged after {} attempts", attempts.len());
                }
                return Ok(Dispatched { result, attempts });
            }
            debug!("{name} did not converge");
            last = Some(result);
        }

        last.map(|result| Dispatched { result, attempts })
            .ok_or(SolverError::NoCandidates)
    }
}
