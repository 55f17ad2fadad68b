//! Force-deformation laws for the restoring element.
//!
//! Each law follows the trial/commit protocol of an implicit integrator:
//! `set_trial` evaluates force and tangent at a trial deformation without
//! touching the converged history, `commit` accepts the trial state once the
//! step has converged, and `revert` throws it away.
//!
//! # Kinds
//!
//! | kind      | parameters        |
//! |-----------|-------------------|
//! | `Elastic` | `E`               |
//! | `Steel01` | `Fy`, `E`, `b`    |
//!
//! `Steel01` is the bilinear law with kinematic hardening, `b` being the ratio
//! of post-yield to elastic stiffness.

use crate::error::{Result, SolverError};
use crate::material::{MaterialDescription, MaterialEntry};

pub trait Hysteretic: Send {
    fn kind(&self) -> &'static str;

    /// Evaluate `(force, tangent)` at a trial deformation.
    fn set_trial(&mut self, deformation: f64) -> (f64, f64);

    fn commit(&mut self);

    fn revert(&mut self);

    fn initial_stiffness(&self) -> f64;

    /// Magnitude of the plastic deformation between the committed and the
    /// trial state.
    fn plastic_increment(&self) -> f64 {
        0.0
    }
}

#[derive(Debug, Clone)]
pub struct Elastic {
    stiffness: f64,
}

impl Elastic {
    pub fn new(stiffness: f64) -> Result<Self> {
        if !stiffness.is_finite() {
            return Err(SolverError::MaterialParameters {
                kind: "Elastic".to_string(),
                message: format!("stiffness must be finite, got {stiffness}"),
            });
        }
        Ok(Self { stiffness })
    }
}

impl Hysteretic for Elastic {
    fn kind(&self) -> &'static str {
        "Elastic"
    }

    fn set_trial(&mut self, deformation: f64) -> (f64, f64) {
        (self.stiffness * deformation, self.stiffness)
    }

    fn commit(&mut self) {}

    fn revert(&mut self) {}

    fn initial_stiffness(&self) -> f64 {
        self.stiffness
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PlasticState {
    plastic_deformation: f64,
    back_force: f64,
}

/// Bilinear law with kinematic hardening.
#[derive(Debug, Clone)]
pub struct Steel01 {
    yield_force: f64,
    stiffness: f64,
    hardening_ratio: f64,
    /// Plastic modulus `H = bE / (1 - b)`
    plastic_modulus: f64,
    committed: PlasticState,
    trial: PlasticState,
}

impl Steel01 {
    pub fn new(yield_force: f64, stiffness: f64, hardening_ratio: f64) -> Result<Self> {
        let invalid = |message: String| SolverError::MaterialParameters {
            kind: "Steel01".to_string(),
            message,
        };
        if !(yield_force.is_finite() && yield_force > 0.0) {
            return Err(invalid(format!("Fy must be positive, got {yield_force}")));
        }
        if !(stiffness.is_finite() && stiffness > 0.0) {
            return Err(invalid(format!("E must be positive, got {stiffness}")));
        }
        if !(0.0..1.0).contains(&hardening_ratio) {
            return Err(invalid(format!("b must lie in [0, 1), got {hardening_ratio}")));
        }

        Ok(Self {
            yield_force,
            stiffness,
            hardening_ratio,
            plastic_modulus: hardening_ratio * stiffness / (1.0 - hardening_ratio),
            committed: PlasticState::default(),
            trial: PlasticState::default(),
        })
    }

    pub fn hardening_ratio(&self) -> f64 {
        self.hardening_ratio
    }
}

impl Hysteretic for Steel01 {
    fn kind(&self) -> &'static str {
        "Steel01"
    }

    fn set_trial(&mut self, deformation: f64) -> (f64, f64) {
        let e = self.stiffness;
        let h = self.plastic_modulus;
        let base = self.committed;

        let trial_force = e * (deformation - base.plastic_deformation);
        let relative = trial_force - base.back_force;
        let excess = relative.abs() - self.yield_force;

        if excess <= 0.0 {
            self.trial = base;
            return (trial_force, e);
        }

        // Return mapping onto the shifted yield surface
        let direction = relative.signum();
        let consistency = excess / (e + h);
        self.trial = PlasticState {
            plastic_deformation: base.plastic_deformation + consistency * direction,
            back_force: base.back_force + h * consistency * direction,
        };
        let force = trial_force - e * consistency * direction;
        (force, e * h / (e + h))
    }

    fn commit(&mut self) {
        self.committed = self.trial;
    }

    fn revert(&mut self) {
        self.trial = self.committed;
    }

    fn initial_stiffness(&self) -> f64 {
        self.stiffness
    }

    fn plastic_increment(&self) -> f64 {
        (self.trial.plastic_deformation - self.committed.plastic_deformation).abs()
    }
}

/// Entries of a material description acting side by side.
pub struct ParallelMaterial {
    parts: Vec<Box<dyn Hysteretic>>,
}

impl ParallelMaterial {
    pub fn from_description(description: &MaterialDescription) -> Result<Self> {
        if description.is_empty() {
            return Err(SolverError::InvalidInput(
                "material description has no entries".to_string(),
            ));
        }
        let parts = description
            .entries()
            .iter()
            .map(build_entry)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { parts })
    }

    pub fn set_trial(&mut self, deformation: f64) -> (f64, f64) {
        self.parts.iter_mut().fold((0.0, 0.0), |(force, tangent), part| {
            let (f, k) = part.set_trial(deformation);
            (force + f, tangent + k)
        })
    }

    pub fn commit(&mut self) {
        self.parts.iter_mut().for_each(|part| part.commit());
    }

    pub fn revert(&mut self) {
        self.parts.iter_mut().for_each(|part| part.revert());
    }

    pub fn initial_stiffness(&self) -> f64 {
        self.parts.iter().map(|part| part.initial_stiffness()).sum()
    }

    /// Largest plastic increment among the parts.
    pub fn plastic_increment(&self) -> f64 {
        self.parts
            .iter()
            .map(|part| part.plastic_increment())
            .fold(0.0, f64::max)
    }
}

fn build_entry(entry: &MaterialEntry) -> Result<Box<dyn Hysteretic>> {
    let values = entry.params.values();
    let arity = |expected: usize| {
        if values.len() == expected {
            Ok(())
        } else {
            Err(SolverError::MaterialParameters {
                kind: entry.kind.clone(),
                message: format!("expected {expected} parameters, got {}", values.len()),
            })
        }
    };

    match entry.kind.as_str() {
        "Elastic" => {
            arity(1)?;
            Ok(Box::new(Elastic::new(values[0])?))
        }
        "Steel01" => {
            arity(3)?;
            Ok(Box::new(Steel01::new(values[0], values[1], values[2])?))
        }
        other => Err(SolverError::UnknownMaterial(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn steel01_is_elastic_below_yield() {
        let mut steel = Steel01::new(100.0, 1000.0, 0.02).unwrap();
        let (force, tangent) = steel.set_trial(0.05);
        assert_relative_eq!(force, 50.0);
        assert_relative_eq!(tangent, 1000.0);
        assert_eq!(steel.plastic_increment(), 0.0);
    }

    #[test]
    fn steel01_hardens_after_yield_and_unloads_elastically() {
        let mut steel = Steel01::new(100.0, 1000.0, 0.02).unwrap();

        // uy = 0.1; push to 0.3 → F = Fy + bE (u - uy)
        let (force, tangent) = steel.set_trial(0.3);
        assert_relative_eq!(force, 100.0 + 0.02 * 1000.0 * 0.2, epsilon = 1e-9);
        assert_relative_eq!(tangent, 20.0, epsilon = 1e-9);
        assert!(steel.plastic_increment() > 0.0);
        steel.commit();

        // Small unloading step follows the elastic slope
        let (unloaded, tangent) = steel.set_trial(0.29);
        assert_relative_eq!(unloaded, force - 10.0, epsilon = 1e-9);
        assert_relative_eq!(tangent, 1000.0);
    }

    #[test]
    fn revert_discards_trial_plasticity() {
        let mut steel = Steel01::new(100.0, 1000.0, 0.0).unwrap();
        steel.set_trial(0.5);
        steel.revert();
        let (force, _) = steel.set_trial(0.05);
        assert_relative_eq!(force, 50.0);
    }

    #[test]
    fn parallel_entries_add_forces_and_tangents() {
        let description = MaterialDescription::new()
            .with("Steel01", [100.0, 1000.0, 0.0])
            .with("Elastic", 10.0);
        let mut material = ParallelMaterial::from_description(&description).unwrap();
        assert_relative_eq!(material.initial_stiffness(), 1010.0);

        let (force, tangent) = material.set_trial(1.0);
        assert_relative_eq!(force, 100.0 + 10.0, epsilon = 1e-9);
        assert_relative_eq!(tangent, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn rejects_unknown_kinds_and_wrong_arity() {
        let unknown = MaterialDescription::new().with("Pinching4", [1.0, 2.0]);
        assert!(matches!(
            ParallelMaterial::from_description(&unknown),
            Err(SolverError::UnknownMaterial(kind)) if kind == "Pinching4"
        ));

        let short = MaterialDescription::new().with("Steel01", [1.0, 2.0]);
        assert!(matches!(
            ParallelMaterial::from_description(&short),
            Err(SolverError::MaterialParameters { .. })
        ));

        assert!(ParallelMaterial::from_description(&MaterialDescription::new()).is_err());
    }
}
