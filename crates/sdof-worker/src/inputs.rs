//! Owned copies of the coordinator's shared inputs.

use log::debug;

use sdof_io::{IoError, SegmentRef, SegmentSource};
use sdof_solver::SpectralInterpolator;

use crate::error::{EngineError, Result};
use crate::item::SharedInputs;

/// Copies segments out of a [`SegmentSource`]; nothing stays attached.
pub struct SharedInputBroker<'s> {
    source: &'s dyn SegmentSource,
}

impl<'s> SharedInputBroker<'s> {
    pub fn new(source: &'s dyn SegmentSource) -> Self {
        Self { source }
    }

    pub fn fetch(&self, segment: &SegmentRef) -> Result<Vec<f64>> {
        self.source
            .attach(&segment.name, segment.len)
            .map_err(|source| EngineError::Attach {
                segment: segment.name.clone(),
                source,
            })
    }

    /// Copy the ground motion and build the spectrum lookup.
    pub fn load(&self, inputs: &SharedInputs) -> Result<ItemInputs> {
        let trace = self.fetch(&inputs.ground_motion)?;
        let periods = self.fetch(&inputs.periods)?;
        let ordinates = self.fetch(&inputs.spectrum)?;
        debug!(
            "loaded {} trace samples and a {}-point spectrum",
            trace.len(),
            periods.len()
        );

        let spectrum = SpectralInterpolator::new(periods, ordinates).map_err(|err| {
            EngineError::Attach {
                segment: inputs.spectrum.name.clone(),
                source: IoError::InvalidData(err.to_string()),
            }
        })?;
        Ok(ItemInputs { trace, spectrum })
    }
}

#[derive(Debug, Clone)]
pub struct ItemInputs {
    /// Ground acceleration in g
    pub trace: Vec<f64>,
    pub spectrum: SpectralInterpolator,
}

impl ItemInputs {
    /// Elastic spectral acceleration, undefined without a period.
    pub fn spectral_accel(&self, period: Option<f64>) -> Option<f64> {
        period.map(|period| self.spectrum.evaluate(period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdof_io::{SegmentHost, ShmDirectory};

    fn host(root: &std::path::Path) -> (SegmentHost, SharedInputs) {
        let mut host = SegmentHost::new(ShmDirectory::new(root));
        let inputs = SharedInputs {
            ground_motion: host.create("gm", &[0.0, 0.1, -0.1]).unwrap(),
            periods: host.create("periods", &[0.1, 1.0]).unwrap(),
            spectrum: host.create("sa", &[0.2, 0.65]).unwrap(),
        };
        (host, inputs)
    }

    #[test]
    fn loads_trace_and_spectrum() {
        let root = tempfile::tempdir().unwrap();
        let (host, inputs) = host(root.path());
        let loaded = SharedInputBroker::new(host.directory()).load(&inputs).unwrap();
        assert_eq!(loaded.trace, [0.0, 0.1, -0.1]);
        assert_eq!(loaded.spectral_accel(None), None);
        let sa = loaded.spectral_accel(Some(0.5)).unwrap();
        assert!((sa - 0.4).abs() < 1e-12);
    }

    #[test]
    fn missing_or_malformed_segments_are_attach_errors() {
        let root = tempfile::tempdir().unwrap();
        let (mut host, mut inputs) = host(root.path());

        inputs.ground_motion.len = 4;
        let err = SharedInputBroker::new(host.directory()).load(&inputs).unwrap_err();
        assert!(matches!(err, EngineError::Attach { ref segment, .. } if segment == "gm"));

        inputs.ground_motion.len = 3;
        inputs.spectrum = host.create("sa_short", &[0.2, 0.3]).unwrap();
        inputs.periods = host.create("periods_flat", &[0.5, 0.5]).unwrap();
        let err = SharedInputBroker::new(host.directory()).load(&inputs).unwrap_err();
        assert!(matches!(err, EngineError::Attach { ref segment, .. } if segment == "sa_short"));
    }
}
