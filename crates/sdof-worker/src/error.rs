//! Error types for sdof-worker

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::error::Error as StdError;
use std::fmt::Write as _;
use std::panic;
use std::sync::Once;

use sdof_io::IoError;
use sdof_solver::SolverError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Everything that ends a work item with a fatal report.
///
/// An unconverged analysis is not an error: it is recorded with its
/// convergence flag cleared.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Material function failed: {0}")]
    Material(String),

    #[error("Shared input '{segment}' is unavailable")]
    Attach {
        segment: String,
        #[source]
        source: IoError,
    },

    #[error("Solver '{solver}' failed")]
    SolverInvocation {
        solver: String,
        #[source]
        source: SolverError,
    },

    #[error("Artifact I/O failed")]
    Io(#[from] IoError),

    #[error("Unhandled panic: {0}")]
    Unhandled(String),

    #[error("Worker pool could not start")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(IoError::Io(err))
    }
}

/// Render an error with its whole source chain, one cause per line.
pub fn format_trace(err: &(dyn StdError + 'static)) -> String {
    let mut trace = format!("{err}");
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(trace, "\n  caused by: {cause}");
        source = cause.source();
    }
    trace
}

thread_local! {
    static PANIC_REPORT: RefCell<Option<String>> = const { RefCell::new(None) };
}

static PANIC_CAPTURE: Once = Once::new();

/// Chain a panic hook that keeps the location and backtrace of the last
/// panic on each thread, for [`take_panic_report`].
pub(crate) fn install_panic_capture() {
    PANIC_CAPTURE.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map_or_else(|| "an unknown location".to_string(), ToString::to_string);
            let report = format!(
                "panicked at {location}\nbacktrace:\n{}",
                Backtrace::force_capture()
            );
            PANIC_REPORT.with(|slot| *slot.borrow_mut() = Some(report));
            previous(info);
        }));
    });
}

/// Location and backtrace of the last panic on this thread, if any.
pub(crate) fn take_panic_report() -> Option<String> {
    PANIC_REPORT.with(|slot| slot.borrow_mut().take())
}

/// Text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_walks_the_source_chain() {
        let err = EngineError::SolverInvocation {
            solver: "auto".to_string(),
            source: SolverError::Backend {
                backend: "Newmark-Newton".to_string(),
                source: Box::new(SolverError::UnknownMaterial("Pinching4".to_string())),
            },
        };
        let trace = format_trace(&err);
        let lines: Vec<_> = trace.lines().collect();
        assert_eq!(lines.len(), 3, "{trace}");
        assert_eq!(lines[0], "Solver 'auto' failed");
        assert!(lines[1].ends_with("Back-end Newmark-Newton failed"));
        assert!(lines[2].ends_with("Unknown material kind: Pinching4"));
    }

    #[test]
    fn panic_payloads_become_text() {
        let payload = std::panic::catch_unwind(|| panic!("boom {}", 7)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom 7");
        let payload = std::panic::catch_unwind(|| panic!("static")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static");
    }

    #[test]
    fn panic_capture_keeps_location_and_backtrace() {
        install_panic_capture();
        take_panic_report();
        let _ = std::panic::catch_unwind(|| panic!("captured"));

        let report = take_panic_report().unwrap();
        assert!(report.starts_with("panicked at "), "{report}");
        assert!(report.contains("error.rs"), "{report}");
        assert!(report.contains("backtrace:"), "{report}");
        assert!(take_panic_report().is_none());
    }
}
