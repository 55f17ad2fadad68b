//! Handling of analyses that lost equilibrium.

use log::warn;
use serde::{Deserialize, Serialize};

use sdof_io::{ArtifactLayout, save_json};
use sdof_solver::{Dispatched, MaterialDescription, SolveRequest};

use crate::error::Result;
use crate::lock::ArtifactLock;
use crate::material::MaterialDefinition;
use crate::progress::{ProgressMessage, ProgressSender};

/// Inputs needed to rerun an unconverged analysis by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub period: Option<f64>,
    pub ground_motion: String,
    pub dt: f64,
    pub material: MaterialDescription,
    pub yield_disp: f64,
    pub fv_duration: f64,
    pub scale: f64,
    pub axial_load: f64,
    pub height: f64,
    pub damping_ratio: f64,
    pub mass: f64,
    pub stiffness: f64,
    pub yield_force: f64,
    /// Back-ends tried, in order
    pub attempts: Vec<String>,
    /// Time of the last converged step
    pub reached_time: f64,
}

impl DiagnosticRecord {
    pub fn new(
        ground_motion: &str,
        request: &SolveRequest<'_>,
        material: &MaterialDefinition,
        dispatched: &Dispatched,
    ) -> Self {
        Self {
            period: request.period,
            ground_motion: ground_motion.to_string(),
            dt: request.dt,
            material: request.material.clone(),
            yield_disp: request.yield_disp,
            fv_duration: request.fv_duration,
            scale: request.scale,
            axial_load: request.axial_load,
            height: request.height,
            damping_ratio: request.damping_ratio,
            mass: request.mass,
            stiffness: material.stiffness,
            yield_force: material.yield_force,
            attempts: dispatched.attempts.clone(),
            reached_time: dispatched.result.history.time.last().copied().unwrap_or(0.0),
        }
    }
}

pub struct ConvergenceGuard<'c> {
    lock: &'c dyn ArtifactLock,
    progress: &'c ProgressSender,
    layout: &'c ArtifactLayout,
}

impl<'c> ConvergenceGuard<'c> {
    pub fn new(
        lock: &'c dyn ArtifactLock,
        progress: &'c ProgressSender,
        layout: &'c ArtifactLayout,
    ) -> Self {
        Self {
            lock,
            progress,
            layout,
        }
    }

    /// Write the diagnostic and send the warning of an unconverged result;
    /// a converged result passes untouched. Returns the convergence flag.
    pub fn check(
        &self,
        dispatched: &Dispatched,
        record: impl FnOnce() -> DiagnosticRecord,
        hysteretic_params: &[f64],
    ) -> Result<bool> {
        if dispatched.result.converged {
            return Ok(true);
        }

        let record = record();
        warn!(
            "unconverged analysis: ground motion {}, period {:?}, stopped at t = {} s, material {}",
            record.ground_motion, record.period, record.reached_time, record.material
        );
        {
            let _guard = self.lock.acquire(self.layout.dir(), &record.ground_motion)?;
            save_json(
                self.layout
                    .diagnostic_path(&record.ground_motion, record.period),
                &record,
            )?;
        }

        self.progress.send(ProgressMessage::Unconverged {
            ground_motion: record.ground_motion,
            period: record.period,
            material: record.material,
            hysteretic_params: hysteretic_params.to_vec(),
        });
        Ok(false)
    }
}
