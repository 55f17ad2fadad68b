//! Piecewise-linear spectral acceleration lookup.

use crate::error::{Result, SolverError};

/// Continuous function over a (period, spectral ordinate) grid.
///
/// Inside the grid the value is interpolated linearly between the two
/// bracketing points. Outside it the nearest edge segment is extended, so
/// `evaluate` is defined for every period.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralInterpolator {
    periods: Vec<f64>,
    ordinates: Vec<f64>,
}

impl SpectralInterpolator {
    /// # Errors
    /// Returns `InvalidInput` if the grids differ in length, hold fewer than
    /// two points, or the periods are not strictly increasing.
    pub fn new(periods: Vec<f64>, ordinates: Vec<f64>) -> Result<Self> {
        if periods.len() != ordinates.len() {
            return Err(SolverError::InvalidInput(format!(
                "period grid has {} points but spectrum has {}",
                periods.len(),
                ordinates.len()
            )));
        }
        if periods.len() < 2 {
            return Err(SolverError::InvalidInput(
                "spectrum needs at least two points".to_string(),
            ));
        }
        if let Some(i) = periods.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(SolverError::InvalidInput(format!(
                "period grid is not strictly increasing at index {}",
                i + 1
            )));
        }
        Ok(Self { periods, ordinates })
    }

    pub fn evaluate(&self, period: f64) -> f64 {
        let last_segment = self.periods.len() - 2;
        let i = self
            .periods
            .partition_point(|&p| p <= period)
            .saturating_sub(1)
            .min(last_segment);

        let (x0, x1) = (self.periods[i], self.periods[i + 1]);
        let (y0, y1) = (self.ordinates[i], self.ordinates[i + 1]);
        y0 + (y1 - y0) * (period - x0) / (x1 - x0)
    }

    pub fn periods(&self) -> &[f64] {
        &self.periods
    }

    pub fn ordinates(&self) -> &[f64] {
        &self.ordinates
    }
}
