//! Per-item worker of a seismic SDOF time-history campaign.
//!
//! A coordinator publishes the shared numeric inputs (ground-motion traces,
//! period grid, elastic spectra), then hands each worker a [`WorkItem`] and
//! an [`ExecutionContext`]. For one item the worker:
//!
//! 1. honours the stop signal and pause gate
//! 2. copies its inputs out of the shared segments
//! 3. looks up the elastic spectral acceleration at the item's period
//! 4. asks the material function for the oscillator's material
//! 5. integrates the response with the chosen back-end (or the `"auto"`
//!    ladder)
//! 6. records a diagnostic when the analysis did not converge
//! 7. appends a summary row and writes the time series under the ground
//!    motion's lock
//! 8. reports a single terminal message on the progress queue
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sdof_worker::{BilinearMaterial, ExecutionContext, WorkItem, progress_channel, run_item};
//!
//! # fn example(item: WorkItem) {
//! let (progress, messages) = progress_channel();
//! let ctx = ExecutionContext::builder(progress, Arc::new(BilinearMaterial)).build();
//! run_item(&item, &ctx);
//! for message in messages.try_iter() {
//!     println!("{message:?}");
//! }
//! # }
//! ```

pub mod cancel;
pub mod context;
pub mod engine;
pub mod error;
pub mod guard;
pub mod inputs;
pub mod item;
pub mod lock;
pub mod material;
pub mod pool;
pub mod progress;
pub mod recorder;

pub use cancel::{PauseGate, StopSignal};
pub use context::{ExecutionContext, ExecutionContextBuilder};
pub use engine::{ItemOutcome, run_item};
pub use error::{EngineError, Result, format_trace};
pub use guard::{ConvergenceGuard, DiagnosticRecord};
pub use inputs::{ItemInputs, SharedInputBroker};
pub use item::{OutputTarget, SharedInputs, WorkItem};
pub use lock::{ArtifactGuard, ArtifactLock, KeyedLock, LockFiles};
pub use material::{
    BilinearMaterial, CallbackError, MaterialAdapter, MaterialDefinition, MaterialFunction,
    MaterialInput, MaterialResult,
};
pub use pool::{BatchReport, run_batch};
pub use progress::{ProgressMessage, ProgressSender, progress_channel};
pub use recorder::{ResultRecorder, analysis_record};
