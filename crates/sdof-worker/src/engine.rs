//! Execution of one work item.
//!
//! ```text
//! start ─▶ stop set? ──yes──▶ Cancelled
//!             │ no
//!             ▼
//!          pause wait ─▶ resolve solver ─▶ fetch inputs ─▶ material
//!             ─▶ dispatch (auto ladder) ─▶ convergence guard ─▶ record
//!             ─▶ Completed
//! ```
//!
//! Any error or panic after the stop check ends the item with a single
//! `Fatal` message; the worker itself always returns normally. A panic's
//! trace carries its location and backtrace.

use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use log::{error, info};

use sdof_solver::SolveRequest;

use crate::context::ExecutionContext;
use crate::error::{
    EngineError, Result, format_trace, install_panic_capture, panic_message, take_panic_report,
};
use crate::guard::{ConvergenceGuard, DiagnosticRecord};
use crate::inputs::SharedInputBroker;
use crate::item::WorkItem;
use crate::material::{MaterialAdapter, MaterialInput};
use crate::progress::ProgressMessage;
use crate::recorder::{ResultRecorder, analysis_record};

/// Terminal state of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Completed { converged: bool },
    Cancelled,
    Failed,
}

/// Run one item to its terminal message.
pub fn run_item(item: &WorkItem, ctx: &ExecutionContext) -> ItemOutcome {
    if ctx.stop.is_stopped() {
        info!("{}: stop requested, item skipped", item.ground_motion);
        ctx.progress.send(ProgressMessage::Cancelled {
            message: format!("analysis of {} cancelled before start", item.ground_motion),
        });
        return ItemOutcome::Cancelled;
    }
    ctx.pause.wait();

    install_panic_capture();
    // reports of panics already handled on this thread
    take_panic_report();
    let started_at = Utc::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| execute(item, ctx, started_at)));
    let (err, panic_report) = match outcome {
        Ok(Ok(converged)) => return ItemOutcome::Completed { converged },
        Ok(Err(err)) => (err, None),
        Err(payload) => (
            EngineError::Unhandled(panic_message(payload.as_ref())),
            take_panic_report(),
        ),
    };

    error!("{} (period {:?}): {err}", item.ground_motion, item.period);
    let mut trace = format_trace(&err);
    if let Some(report) = panic_report {
        trace.push('\n');
        trace.push_str(&report);
    }
    ctx.progress.send(ProgressMessage::Fatal {
        error: err.to_string(),
        trace,
    });
    ItemOutcome::Failed
}

fn execute(item: &WorkItem, ctx: &ExecutionContext, started_at: DateTime<Utc>) -> Result<bool> {
    let strategy = ctx
        .solvers
        .resolve(&item.solver)
        .map_err(|err| EngineError::Configuration(err.to_string()))?;

    let inputs = SharedInputBroker::new(ctx.segments.as_ref()).load(&item.inputs)?;
    let spectral_accel = inputs.spectral_accel(item.period);

    let material = MaterialAdapter::new(ctx.material.as_ref()).define(&MaterialInput {
        period: item.period,
        mass: item.mass,
        spectral_accel,
        params: item.hysteretic_params.clone(),
    })?;

    let request = SolveRequest {
        period: item.period,
        trace: &inputs.trace,
        dt: item.dt,
        material: &material.description,
        yield_disp: material.yield_displacement(),
        fv_duration: item.free_vibration(),
        scale: item.scale,
        axial_load: item.axial_load(material.stiffness),
        height: item.height,
        damping_ratio: item.damping_ratio,
        damping_coefficient: material.damping_coefficient,
        mass: item.mass,
        options: &item.solver_options,
    };
    let dispatched = strategy
        .run(&request)
        .map_err(|source| EngineError::SolverInvocation {
            solver: item.solver.clone(),
            source,
        })?;

    let layout = item.output.layout();
    let converged = ConvergenceGuard::new(ctx.lock.as_ref(), &ctx.progress, &layout).check(
        &dispatched,
        || DiagnosticRecord::new(&item.ground_motion, &request, &material, &dispatched),
        &item.hysteretic_params,
    )?;

    let row = analysis_record(
        item.period,
        item.mass,
        spectral_accel,
        &material,
        &dispatched.result,
    );
    ResultRecorder::new(ctx.lock.as_ref(), &layout).record(
        &item.ground_motion,
        row,
        &dispatched.result,
    )?;

    ctx.progress.send(ProgressMessage::Completed {
        ground_motion: item.ground_motion.clone(),
        item_count: 1,
        delta: 1,
        converged,
        started_at,
        finished_at: Utc::now(),
    });
    Ok(converged)
}
