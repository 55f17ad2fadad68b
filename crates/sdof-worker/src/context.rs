//! Everything a worker shares with its coordinator, passed explicitly.

use std::sync::Arc;

use sdof_io::{SegmentSource, ShmDirectory};
use sdof_solver::SolverRegistry;

use crate::cancel::{PauseGate, StopSignal};
use crate::lock::{ArtifactLock, KeyedLock};
use crate::material::MaterialFunction;
use crate::progress::ProgressSender;

#[derive(Clone)]
pub struct ExecutionContext {
    pub progress: ProgressSender,
    pub stop: StopSignal,
    pub pause: PauseGate,
    pub lock: Arc<dyn ArtifactLock>,
    pub segments: Arc<dyn SegmentSource>,
    pub material: Arc<dyn MaterialFunction>,
    pub solvers: Arc<SolverRegistry>,
}

impl ExecutionContext {
    pub fn builder(
        progress: ProgressSender,
        material: Arc<dyn MaterialFunction>,
    ) -> ExecutionContextBuilder {
        ExecutionContextBuilder {
            progress,
            material,
            stop: None,
            pause: None,
            lock: None,
            segments: None,
            solvers: None,
        }
    }
}

/// Builder for [`ExecutionContext`].
///
/// Unset parts default to fresh signals, an in-process [`KeyedLock`],
/// segments under [`ShmDirectory::from_env`] and the default solver table.
pub struct ExecutionContextBuilder {
    progress: ProgressSender,
    material: Arc<dyn MaterialFunction>,
    stop: Option<StopSignal>,
    pause: Option<PauseGate>,
    lock: Option<Arc<dyn ArtifactLock>>,
    segments: Option<Arc<dyn SegmentSource>>,
    solvers: Option<Arc<SolverRegistry>>,
}

impl ExecutionContextBuilder {
    pub fn stop(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn pause(mut self, pause: PauseGate) -> Self {
        self.pause = Some(pause);
        self
    }

    pub fn lock(mut self, lock: Arc<dyn ArtifactLock>) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn segments(mut self, segments: Arc<dyn SegmentSource>) -> Self {
        self.segments = Some(segments);
        self
    }

    pub fn solvers(mut self, solvers: Arc<SolverRegistry>) -> Self {
        self.solvers = Some(solvers);
        self
    }

    pub fn build(self) -> ExecutionContext {
        ExecutionContext {
            progress: self.progress,
            stop: self.stop.unwrap_or_default(),
            pause: self.pause.unwrap_or_default(),
            lock: self.lock.unwrap_or_else(|| Arc::new(KeyedLock::new())),
            segments: self
                .segments
                .unwrap_or_else(|| Arc::new(ShmDirectory::from_env())),
            material: self.material,
            solvers: self
                .solvers
                .unwrap_or_else(|| Arc::new(SolverRegistry::default())),
        }
    }
}
