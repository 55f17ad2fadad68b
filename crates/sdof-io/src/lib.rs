//! I/O support for SDOF time-history workers.
//!
//! This crate provides:
//! - **Shared input segments**: named regions of 8-byte floats that a
//!   coordinator publishes and workers copy out by name
//! - **Summary tables** (`<ground motion>.csv`), one row per analysed item,
//!   always rewritten as a whole
//! - **Time-series arrays** in NPY v1.0 format (`<f8`, C order)
//! - **JSON documents** for diagnostics of unconverged analyses
//! - **Artifact layout** naming the files of one output area

pub mod error;
pub mod json;
pub mod layout;
pub mod npy;
pub mod segment;
pub mod summary;
mod replace;

pub use error::{IoError, Result};
pub use json::{load_json, save_json};
pub use layout::ArtifactLayout;
pub use npy::{NpyArray, read_npy_f64, write_npy};
pub use replace::write_replace;
pub use segment::{SegmentHost, SegmentRef, SegmentSource, ShmDirectory};
pub use summary::{SUMMARY_COLUMNS, SummaryRow, append_summary, read_summary, write_summary};
