//! Material functions and the adapter that guards calls into them.
//!
//! A material function turns the item's hysteretic parameters into a
//! [`MaterialDescription`] plus the yield force `Fy` and elastic stiffness
//! `E` of the oscillator, optionally with an explicit damping coefficient.
//! The worker treats it as an opaque strategy.

use std::error::Error as StdError;
use std::f64::consts::PI;
use std::panic::{self, AssertUnwindSafe};

use sdof_solver::{GRAVITY, MaterialDescription};

use crate::error::{EngineError, Result, panic_message};

pub type CallbackError = Box<dyn StdError + Send + Sync>;

/// What a material function returns.
pub type MaterialResult = std::result::Result<MaterialDefinition, CallbackError>;

/// Arguments of one material function call.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialInput {
    pub period: Option<f64>,
    pub mass: f64,
    /// Elastic spectral acceleration in g, defined when the period is
    pub spectral_accel: Option<f64>,
    pub params: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDefinition {
    pub description: MaterialDescription,
    pub yield_force: f64,
    pub stiffness: f64,
    pub damping_coefficient: Option<f64>,
}

impl MaterialDefinition {
    pub fn new(description: MaterialDescription, yield_force: f64, stiffness: f64) -> Self {
        Self {
            description,
            yield_force,
            stiffness,
            damping_coefficient: None,
        }
    }

    pub fn with_damping(mut self, coefficient: f64) -> Self {
        self.damping_coefficient = Some(coefficient);
        self
    }

    /// `uy = Fy / E`
    pub fn yield_displacement(&self) -> f64 {
        self.yield_force / self.stiffness
    }
}

pub trait MaterialFunction: Send + Sync {
    fn define(&self, input: &MaterialInput) -> MaterialResult;
}

impl<F> MaterialFunction for F
where
    F: Fn(&MaterialInput) -> MaterialResult + Send + Sync,
{
    fn define(&self, input: &MaterialInput) -> MaterialResult {
        self(input)
    }
}

/// Calls a material function and checks what comes back.
pub struct MaterialAdapter<'f> {
    function: &'f dyn MaterialFunction,
}

impl<'f> MaterialAdapter<'f> {
    pub fn new(function: &'f dyn MaterialFunction) -> Self {
        Self { function }
    }

    /// # Errors
    /// `Material` when the function fails or panics, returns a stiffness that
    /// is not strictly positive, or a yield displacement that is not finite.
    pub fn define(&self, input: &MaterialInput) -> Result<MaterialDefinition> {
        let definition = match panic::catch_unwind(AssertUnwindSafe(|| self.function.define(input))) {
            Ok(Ok(definition)) => definition,
            Ok(Err(err)) => return Err(EngineError::Material(err.to_string())),
            Err(payload) => {
                return Err(EngineError::Material(format!(
                    "panicked: {}",
                    panic_message(payload.as_ref())
                )));
            }
        };

        if !(definition.stiffness.is_finite() && definition.stiffness > 0.0) {
            return Err(EngineError::Material(format!(
                "elastic stiffness must be positive, got {}",
                definition.stiffness
            )));
        }
        let uy = definition.yield_displacement();
        if !uy.is_finite() {
            return Err(EngineError::Material(format!(
                "yield displacement Fy/E is undefined (Fy = {}, E = {})",
                definition.yield_force, definition.stiffness
            )));
        }
        Ok(definition)
    }
}

/// Bilinear oscillator from a strength coefficient and a hardening ratio.
///
/// Parameters are `[Cy, alpha]`: `Fy = Cy m g`, `E = (2π/T)² m`, producing
/// `Steel01(Fy, E, alpha)`. Needs a period.
#[derive(Debug, Clone, Copy, Default)]
pub struct BilinearMaterial;

impl MaterialFunction for BilinearMaterial {
    fn define(&self, input: &MaterialInput) -> MaterialResult {
        let &[strength, hardening] = input.params.as_slice() else {
            return Err(format!(
                "expected parameters [Cy, alpha], got {} values",
                input.params.len()
            )
            .into());
        };
        let period = input
            .period
            .ok_or("the bilinear material needs a natural period")?;

        let stiffness = (2.0 * PI / period).powi(2) * input.mass;
        let yield_force = input.mass * GRAVITY * strength;
        let description =
            MaterialDescription::new().with("Steel01", [yield_force, stiffness, hardening]);
        Ok(MaterialDefinition::new(description, yield_force, stiffness))
    }
}
