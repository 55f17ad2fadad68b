//! Response histories recorded by the integration back-ends.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Serialized column order of a response history.
pub const CHANNELS: [&str; 12] = [
    "time",
    "scaled_input_accel",
    "displacement",
    "velocity",
    "acceleration",
    "dissipated_energy",
    "viscous_energy",
    "cumulative_ductility",
    "peak_ductility",
    "reaction",
    "element_force",
    "damping_force",
];

/// Response of the oscillator at one recorded instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResponseSample {
    pub time: f64,
    /// Ground acceleration after scaling, in g
    pub ground_accel: f64,
    /// Displacement relative to the ground
    pub displacement: f64,
    /// Velocity relative to the ground
    pub velocity: f64,
    /// Absolute acceleration
    pub acceleration: f64,
    pub dissipated_energy: f64,
    pub viscous_energy: f64,
    pub cumulative_ductility: f64,
    pub peak_ductility: f64,
    pub reaction: f64,
    pub element_force: f64,
    pub damping_force: f64,
}

/// Twelve response channels sampled on the input time grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseHistory {
    pub time: Vec<f64>,
    pub ground_accel: Vec<f64>,
    pub displacement: Vec<f64>,
    pub velocity: Vec<f64>,
    pub acceleration: Vec<f64>,
    pub dissipated_energy: Vec<f64>,
    pub viscous_energy: Vec<f64>,
    pub cumulative_ductility: Vec<f64>,
    pub peak_ductility: Vec<f64>,
    pub reaction: Vec<f64>,
    pub element_force: Vec<f64>,
    pub damping_force: Vec<f64>,
}

impl ResponseHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let channel = || Vec::with_capacity(capacity);
        Self {
            time: channel(),
            ground_accel: channel(),
            displacement: channel(),
            velocity: channel(),
            acceleration: channel(),
            dissipated_energy: channel(),
            viscous_energy: channel(),
            cumulative_ductility: channel(),
            peak_ductility: channel(),
            reaction: channel(),
            element_force: channel(),
            damping_force: channel(),
        }
    }

    pub fn push(&mut self, sample: ResponseSample) {
        self.time.push(sample.time);
        self.ground_accel.push(sample.ground_accel);
        self.displacement.push(sample.displacement);
        self.velocity.push(sample.velocity);
        self.acceleration.push(sample.acceleration);
        self.dissipated_energy.push(sample.dissipated_energy);
        self.viscous_energy.push(sample.viscous_energy);
        self.cumulative_ductility.push(sample.cumulative_ductility);
        self.peak_ductility.push(sample.peak_ductility);
        self.reaction.push(sample.reaction);
        self.element_force.push(sample.element_force);
        self.damping_force.push(sample.damping_force);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Channels in [`CHANNELS`] order.
    pub fn channels(&self) -> [&[f64]; 12] {
        [
            &self.time,
            &self.ground_accel,
            &self.displacement,
            &self.velocity,
            &self.acceleration,
            &self.dissipated_energy,
            &self.viscous_energy,
            &self.cumulative_ductility,
            &self.peak_ductility,
            &self.reaction,
            &self.element_force,
            &self.damping_force,
        ]
    }

    /// Stack the channels column-wise into a `len × 12` matrix.
    pub fn to_matrix(&self) -> DMatrix<f64> {
        let channels = self.channels();
        DMatrix::from_fn(self.len(), CHANNELS.len(), |row, col| channels[col][row])
    }

    pub fn peaks(&self) -> ResponsePeaks {
        let abs_max = |values: &[f64]| values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let last = |values: &[f64]| values.last().copied().unwrap_or(0.0);
        ResponsePeaks {
            max_disp: abs_max(&self.displacement),
            max_vel: abs_max(&self.velocity),
            max_accel: abs_max(&self.acceleration),
            dissipated_energy: last(&self.dissipated_energy),
            viscous_energy: last(&self.viscous_energy),
            max_reaction: abs_max(&self.reaction),
            cumulative_ductility: last(&self.cumulative_ductility),
            peak_ductility: last(&self.peak_ductility),
            residual_disp: last(&self.displacement),
        }
    }
}

/// Scalar extremes of a response history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsePeaks {
    pub max_disp: f64,
    pub max_vel: f64,
    pub max_accel: f64,
    pub dissipated_energy: f64,
    pub viscous_energy: f64,
    pub max_reaction: f64,
    pub cumulative_ductility: f64,
    pub peak_ductility: f64,
    pub residual_disp: f64,
}
