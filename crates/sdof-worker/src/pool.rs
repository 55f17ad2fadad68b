//! Local worker pool running many items against one context.

use log::info;
use rayon::prelude::*;

use crate::context::ExecutionContext;
use crate::engine::{ItemOutcome, run_item};
use crate::error::Result;
use crate::item::WorkItem;

/// Counts of terminal states over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub converged: usize,
    pub unconverged: usize,
    pub cancelled: usize,
    pub failed: usize,
}

impl BatchReport {
    fn tally(outcomes: &[ItemOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut report, outcome| {
            match outcome {
                ItemOutcome::Completed { converged: true } => report.converged += 1,
                ItemOutcome::Completed { converged: false } => report.unconverged += 1,
                ItemOutcome::Cancelled => report.cancelled += 1,
                ItemOutcome::Failed => report.failed += 1,
            }
            report
        })
    }

    pub fn total(&self) -> usize {
        self.converged + self.unconverged + self.cancelled + self.failed
    }
}

/// Run `items` in parallel, each to its own terminal message.
///
/// `threads` of `None` uses rayon's default thread count. A failing item
/// never stops the others.
pub fn run_batch(items: &[WorkItem], ctx: &ExecutionContext, threads: Option<usize>) -> Result<BatchReport> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build()?;

    let outcomes: Vec<ItemOutcome> =
        pool.install(|| items.par_iter().map(|item| run_item(item, ctx)).collect());
    let report = BatchReport::tally(&outcomes);
    info!(
        "batch of {}: {} converged, {} unconverged, {} cancelled, {} failed",
        report.total(),
        report.converged,
        report.unconverged,
        report.cancelled,
        report.failed
    );
    Ok(report)
}
