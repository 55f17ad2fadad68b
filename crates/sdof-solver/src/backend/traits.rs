//! Back-end contract shared by every integration scheme.

use std::f64::consts::PI;

use crate::GRAVITY;
use crate::backend::options::SolverOptions;
use crate::error::{Result, SolverError};
use crate::history::{ResponseHistory, ResponsePeaks};
use crate::material::MaterialDescription;

/// Everything a back-end needs to integrate one oscillator.
///
/// The free-vibration duration is final: the dispatcher has already applied
/// the period multiple to it.
#[derive(Debug, Clone, Copy)]
pub struct SolveRequest<'a> {
    pub period: Option<f64>,
    /// Ground acceleration in g, one value per `dt`
    pub trace: &'a [f64],
    pub dt: f64,
    pub material: &'a MaterialDescription,
    pub yield_disp: f64,
    pub fv_duration: f64,
    pub scale: f64,
    pub axial_load: f64,
    pub height: f64,
    pub damping_ratio: f64,
    /// Overrides the damping derived from `damping_ratio` when present
    pub damping_coefficient: Option<f64>,
    pub mass: f64,
    pub options: &'a SolverOptions,
}

impl SolveRequest<'_> {
    pub fn validate(&self) -> Result<()> {
        let positive = |value: f64, what: &str| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SolverError::InvalidInput(format!("{what} must be positive, got {value}")))
            }
        };
        let non_negative = |value: f64, what: &str| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(SolverError::InvalidInput(format!("{what} must be non-negative, got {value}")))
            }
        };

        if self.trace.is_empty() {
            return Err(SolverError::InvalidInput("ground motion trace is empty".to_string()));
        }
        positive(self.dt, "time step")?;
        positive(self.mass, "mass")?;
        positive(self.yield_disp, "yield displacement")?;
        non_negative(self.fv_duration, "free-vibration duration")?;
        non_negative(self.damping_ratio, "damping ratio")?;
        non_negative(self.height, "height")?;
        if let Some(c) = self.damping_coefficient {
            non_negative(c, "damping coefficient")?;
        }
        if let Some(period) = self.period {
            positive(period, "period")?;
        }
        if !self.scale.is_finite() || !self.axial_load.is_finite() {
            return Err(SolverError::InvalidInput(
                "scaling factor and axial load must be finite".to_string(),
            ));
        }
        if self.axial_load != 0.0 && self.height <= 0.0 {
            return Err(SolverError::InvalidInput(
                "an axial load needs a positive height for the P-Delta term".to_string(),
            ));
        }
        let newmark = &self.options.newmark;
        positive(newmark.beta, "Newmark beta")?;
        positive(newmark.gamma, "Newmark gamma")?;
        positive(newmark.tolerance, "Newton tolerance")?;
        if newmark.max_iterations == 0 {
            return Err(SolverError::InvalidInput(
                "at least one Newton iteration is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Viscous damping coefficient `c`.
    ///
    /// Uses the explicit coefficient when given, otherwise `2 m ζ ω` with
    /// `ω = 2π / T`, or `ω = √(k / m)` when the period is undefined.
    pub fn damping_for(&self, stiffness: f64) -> f64 {
        if let Some(c) = self.damping_coefficient {
            return c;
        }
        let omega = match self.period {
            Some(period) => 2.0 * PI / period,
            None => (stiffness.max(0.0) / self.mass).sqrt(),
        };
        2.0 * self.mass * self.damping_ratio * omega
    }

    /// Geometric stiffness `P / h` subtracted from the restoring force.
    pub fn pdelta_stiffness(&self) -> f64 {
        if self.axial_load == 0.0 || self.height <= 0.0 {
            0.0
        } else {
            self.axial_load / self.height
        }
    }

    /// Recorded samples: the trace followed by free vibration.
    pub fn total_samples(&self) -> usize {
        let free = (self.fv_duration / self.dt - 1e-9).ceil().max(0.0) as usize;
        self.trace.len() + free
    }

    /// Scaled ground acceleration in g at a recorded sample.
    pub fn scaled_input(&self, sample: usize) -> f64 {
        self.trace.get(sample).map_or(0.0, |a| a * self.scale)
    }

    /// Ground acceleration in mm/s² at a recorded sample.
    pub fn ground_accel(&self, sample: usize) -> f64 {
        self.scaled_input(sample) * GRAVITY
    }
}

/// Outcome of one back-end run.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverResult {
    /// Name of the back-end that produced the result
    pub backend: String,
    pub converged: bool,
    pub peaks: ResponsePeaks,
    /// Samples up to the last converged step
    pub history: ResponseHistory,
}

impl SolverResult {
    pub fn from_history(backend: impl Into<String>, converged: bool, history: ResponseHistory) -> Self {
        Self {
            backend: backend.into(),
            converged,
            peaks: history.peaks(),
            history,
        }
    }
}

/// A time-integration scheme.
pub trait IntegrationBackend: Send + Sync {
    /// Identifier used in work items and in the registry.
    fn name(&self) -> &str;

    /// Integrate the request.
    ///
    /// Returns `Err` only when the request cannot be started; a run that
    /// loses equilibrium returns `Ok` with `converged == false`.
    fn solve(&self, request: &SolveRequest<'_>) -> Result<SolverResult>;
}
