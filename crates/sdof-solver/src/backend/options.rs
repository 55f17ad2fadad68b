//! Typed options for the built-in back-ends.
//!
//! Options travel with a work item, so all of them deserialize with
//! defaults for missing fields.

use serde::{Deserialize, Serialize};

/// Newmark time integration parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewmarkOptions {
    /// Newmark β parameter (controls acceleration)
    pub beta: f64,
    /// Newmark γ parameter (controls velocity)
    pub gamma: f64,
    /// Relative displacement-increment tolerance of the Newton iterations
    pub tolerance: f64,
    /// Newton iterations allowed per step
    pub max_iterations: usize,
}

impl NewmarkOptions {
    /// Average acceleration method (unconditionally stable, 2nd order accurate)
    ///
    /// γ = 1/2, β = 1/4
    pub fn average_acceleration() -> Self {
        Self {
            beta: 0.25,
            gamma: 0.5,
            tolerance: 1e-10,
            max_iterations: 50,
        }
    }

    /// Linear acceleration method (conditionally stable)
    ///
    /// γ = 1/2, β = 1/6
    pub fn linear_acceleration() -> Self {
        Self {
            beta: 1.0 / 6.0,
            ..Self::average_acceleration()
        }
    }
}

impl Default for NewmarkOptions {
    fn default() -> Self {
        Self::average_acceleration()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstepOptions {
    /// Halvings allowed for one recorded step; 6 allows increments of dt/64
    pub max_subdivisions: usize,
}

impl Default for SubstepOptions {
    fn default() -> Self {
        Self {
            max_subdivisions: 6,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub newmark: NewmarkOptions,
    pub substep: SubstepOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let options: SolverOptions =
            serde_json::from_str(r#"{"newmark": {"max_iterations": 8}}"#).unwrap();
        assert_eq!(options.newmark.max_iterations, 8);
        assert_eq!(options.newmark.beta, 0.25);
        assert_eq!(options.substep.max_subdivisions, 6);
    }

    #[test]
    fn linear_acceleration_changes_beta_only() {
        let config = NewmarkOptions::linear_acceleration();
        assert_eq!(config.beta, 1.0 / 6.0);
        assert_eq!(config.gamma, 0.5);
        assert_eq!(config.max_iterations, 50);
    }
}
