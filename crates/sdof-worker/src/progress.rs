//! Messages from workers to the coordinator.
//!
//! Every item ends with exactly one terminal message: `Completed`, `Fatal`
//! or `Cancelled`. `Unconverged` is a warning sent in addition to, never
//! instead of, `Completed`.

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::debug;
use serde::{Deserialize, Serialize};

use sdof_solver::MaterialDescription;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressMessage {
    Completed {
        ground_motion: String,
        /// Analyses finished for this item
        item_count: usize,
        /// Increment of the coordinator's progress counter
        delta: usize,
        converged: bool,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    },
    Unconverged {
        ground_motion: String,
        period: Option<f64>,
        material: MaterialDescription,
        hysteretic_params: Vec<f64>,
    },
    Fatal {
        error: String,
        trace: String,
    },
    Cancelled {
        message: String,
    },
}

impl ProgressMessage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressMessage::Unconverged { .. })
    }

    /// One JSON object without a trailing newline.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Sending half of the unbounded progress queue.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: Sender<ProgressMessage>,
}

impl ProgressSender {
    pub fn new(tx: Sender<ProgressMessage>) -> Self {
        Self { tx }
    }

    /// Queue a message. A coordinator that stopped listening is not an
    /// error for the worker.
    pub fn send(&self, message: ProgressMessage) {
        if let Err(err) = self.tx.send(message) {
            debug!("progress receiver gone, dropping {:?}", err.into_inner());
        }
    }
}

pub fn progress_channel() -> (ProgressSender, Receiver<ProgressMessage>) {
    let (tx, rx) = unbounded();
    (ProgressSender::new(tx), rx)
}
