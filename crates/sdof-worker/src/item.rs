//! Work items handed from a coordinator to a worker.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use sdof_io::{ArtifactLayout, SegmentRef};
use sdof_solver::{AUTO, SolverOptions, free_vibration_duration};

/// Coordinator-owned segments an item reads from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedInputs {
    /// Acceleration trace in g
    pub ground_motion: SegmentRef,
    /// Period grid of the elastic spectrum
    pub periods: SegmentRef,
    /// Spectral ordinates matching `periods`
    pub spectrum: SegmentRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputTarget {
    pub working_dir: PathBuf,
    pub subfolder: String,
}

impl OutputTarget {
    pub fn dir(&self) -> PathBuf {
        self.working_dir.join(&self.subfolder)
    }

    pub fn layout(&self) -> ArtifactLayout {
        ArtifactLayout::new(self.dir())
    }
}

/// One oscillator under one ground motion.
///
/// Items are consumed once and never modified by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Natural period; `None` analyses the material as given
    pub period: Option<f64>,
    pub ground_motion: String,
    pub mass: f64,
    pub height: f64,
    pub damping_ratio: f64,
    /// P-Delta coefficient θ
    #[serde(default)]
    pub pdelta_coefficient: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
    /// Arguments forwarded to the material function
    pub hysteretic_params: Vec<f64>,
    #[serde(default = "auto_solver")]
    pub solver: String,
    #[serde(default)]
    pub solver_options: SolverOptions,
    pub inputs: SharedInputs,
    pub dt: f64,
    #[serde(default)]
    pub fv_duration: f64,
    /// Free vibration lasts at least this many periods
    #[serde(default)]
    pub fv_factor: f64,
    pub output: OutputTarget,
}

fn unit_scale() -> f64 {
    1.0
}

fn auto_solver() -> String {
    AUTO.to_string()
}

impl WorkItem {
    /// Axial load `P = θ E h` for an elastic stiffness `E`.
    pub fn axial_load(&self, stiffness: f64) -> f64 {
        if self.pdelta_coefficient == 0.0 {
            0.0
        } else {
            self.pdelta_coefficient * stiffness * self.height
        }
    }

    pub fn free_vibration(&self) -> f64 {
        free_vibration_duration(self.fv_duration, self.fv_factor, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEM: &str = r#"{
        "period": 0.5,
        "ground_motion": "ChiChi",
        "mass": 1000.0,
        "height": 3000.0,
        "damping_ratio": 0.05,
        "hysteretic_params": [0.5, 0.02],
        "inputs": {
            "ground_motion": {"name": "gm_0", "len": 4000},
            "periods": {"name": "periods", "len": 60},
            "spectrum": {"name": "sa_0", "len": 60}
        },
        "dt": 0.01,
        "fv_duration": 2.0,
        "fv_factor": 10.0,
        "output": {"working_dir": "/tmp/run", "subfolder": "results"}
    }"#;

    #[test]
    fn optional_fields_take_defaults() {
        let item: WorkItem = serde_json::from_str(ITEM).unwrap();
        assert_eq!(item.solver, "auto");
        assert_eq!(item.scale, 1.0);
        assert_eq!(item.pdelta_coefficient, 0.0);
        assert_eq!(item.solver_options, SolverOptions::default());
        assert_eq!(item.inputs.ground_motion.len, 4000);
        assert_eq!(item.output.dir(), PathBuf::from("/tmp/run/results"));
    }

    #[test]
    fn derives_axial_load_and_free_vibration() {
        let mut item: WorkItem = serde_json::from_str(ITEM).unwrap();
        assert_eq!(item.axial_load(200.0), 0.0);
        item.pdelta_coefficient = 0.1;
        assert_eq!(item.axial_load(200.0), 0.1 * 200.0 * 3000.0);

        assert_eq!(item.free_vibration(), 5.0);
        item.period = None;
        assert_eq!(item.free_vibration(), 2.0);
    }
}
