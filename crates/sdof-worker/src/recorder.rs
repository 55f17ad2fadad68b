//! Summary rows and time-series artifacts of completed items.

use log::debug;

use sdof_io::{ArtifactLayout, SummaryRow, append_summary, write_npy};
use sdof_solver::{GRAVITY, SolverResult};

use crate::error::Result;
use crate::lock::ArtifactLock;
use crate::material::MaterialDefinition;

/// Summary row of one analysis.
///
/// `R = m Sa g / Fy` and `μ = maxDisp / uy`; `R` is undefined together
/// with `Sa`.
pub fn analysis_record(
    period: Option<f64>,
    mass: f64,
    spectral_accel: Option<f64>,
    material: &MaterialDefinition,
    result: &SolverResult,
) -> SummaryRow {
    let uy = material.yield_displacement();
    let peaks = &result.peaks;
    SummaryRow {
        period,
        stiffness: material.stiffness,
        yield_force: material.yield_force,
        yield_disp: uy,
        spectral_accel,
        strength_ratio: spectral_accel.map(|sa| mass * sa * GRAVITY / material.yield_force),
        ductility: peaks.max_disp / uy,
        max_disp: peaks.max_disp,
        max_vel: peaks.max_vel,
        max_accel: peaks.max_accel,
        dissipated_energy: peaks.dissipated_energy,
        viscous_energy: peaks.viscous_energy,
        max_reaction: peaks.max_reaction,
        cumulative_ductility: peaks.cumulative_ductility,
        peak_ductility: peaks.peak_ductility,
        residual_disp: peaks.residual_disp,
        converged: result.converged,
    }
}

pub struct ResultRecorder<'c> {
    lock: &'c dyn ArtifactLock,
    layout: &'c ArtifactLayout,
}

impl<'c> ResultRecorder<'c> {
    pub fn new(lock: &'c dyn ArtifactLock, layout: &'c ArtifactLayout) -> Self {
        Self { lock, layout }
    }

    /// Append the row to the ground motion's summary and write the time
    /// series, both under that ground motion's lock.
    ///
    /// Returns the number of rows in the summary afterwards.
    pub fn record(&self, ground_motion: &str, row: SummaryRow, result: &SolverResult) -> Result<usize> {
        let history_path = self.layout.history_path(ground_motion, row.period);
        let summary_path = self.layout.summary_path(ground_motion);
        let series = result.history.to_matrix();

        let _guard = self.lock.acquire(self.layout.dir(), ground_motion)?;
        let rows = append_summary(&summary_path, row)?;
        write_npy(&history_path, &series)?;
        debug!(
            "{}: {rows} summary rows, {} samples in {}",
            ground_motion,
            series.nrows(),
            history_path.display()
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::KeyedLock;
    use approx::assert_relative_eq;
    use sdof_io::{read_npy_f64, read_summary};
    use sdof_solver::{MaterialDescription, ResponseHistory, ResponseSample};

    fn result(converged: bool) -> SolverResult {
        let mut history = ResponseHistory::default();
        for i in 0..3 {
            history.push(ResponseSample {
                time: i as f64 * 0.01,
                displacement: -(i as f64) * 20.0,
                ..Default::default()
            });
        }
        SolverResult::from_history("Newmark-Newton", converged, history)
    }

    fn material() -> MaterialDefinition {
        MaterialDefinition::new(
            MaterialDescription::new().with("Steel01", [4.9e6, 157_913.67, 0.02]),
            4.9e6,
            157_913.67,
        )
    }

    #[test]
    fn derives_strength_ratio_and_ductility() {
        let row = analysis_record(Some(0.5), 1000.0, Some(0.4), &material(), &result(true));
        assert_relative_eq!(row.strength_ratio.unwrap(), 0.8, epsilon = 1e-12);
        assert_eq!(row.yield_disp, 4.9e6 / 157_913.67);
        assert_relative_eq!(row.ductility, 40.0 / row.yield_disp, epsilon = 1e-12);
        assert!(row.converged);

        let row = analysis_record(None, 1000.0, None, &material(), &result(false));
        assert_eq!(row.spectral_accel, None);
        assert_eq!(row.strength_ratio, None);
        assert!(!row.converged);
    }

    #[test]
    fn appends_rows_and_writes_one_series_per_period() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path().join("out"));
        let lock = KeyedLock::new();
        let recorder = ResultRecorder::new(&lock, &layout);

        for period in [0.5, 1.0] {
            let solved = result(true);
            let row = analysis_record(Some(period), 1000.0, Some(0.4), &material(), &solved);
            recorder.record("Kobe", row, &solved).unwrap();
        }

        let rows = read_summary(layout.summary_path("Kobe")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].period, Some(1.0));

        let series = read_npy_f64(layout.history_path("Kobe", Some(0.5))).unwrap();
        assert_eq!(series.shape, (3, 12));
        assert_eq!(series.get(2, 2), Some(-40.0));
        assert!(layout.history_path("Kobe", Some(1.0)).exists());
    }
}
