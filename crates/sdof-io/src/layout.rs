//! File naming inside one output area.
//!
//! ```text
//! <dir>/<gm>.csv                    summary table, one row per item
//! <dir>/<gm>.npy                    time series (item without a period)
//! <dir>/<gm>_T<period>.npy          time series (item with a period)
//! <dir>/warnings/<gm>_T<period>.json  diagnostic of an unconverged item
//! <dir>/.<gm>.lock                  writer lock of a ground motion
//! ```

use std::path::{Path, PathBuf};

pub const WARNINGS_DIR: &str = "warnings";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    dir: PathBuf,
}

impl ArtifactLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn summary_path(&self, ground_motion: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", file_stem(ground_motion)))
    }

    pub fn history_path(&self, ground_motion: &str, period: Option<f64>) -> PathBuf {
        self.dir
            .join(format!("{}.npy", item_stem(ground_motion, period)))
    }

    pub fn diagnostic_path(&self, ground_motion: &str, period: Option<f64>) -> PathBuf {
        self.dir
            .join(WARNINGS_DIR)
            .join(format!("{}.json", item_stem(ground_motion, period)))
    }

    pub fn lock_path(&self, ground_motion: &str) -> PathBuf {
        self.dir.join(format!(".{}.lock", file_stem(ground_motion)))
    }
}

fn item_stem(ground_motion: &str, period: Option<f64>) -> String {
    match period {
        Some(period) => format!("{}_T{period}", file_stem(ground_motion)),
        None => file_stem(ground_motion),
    }
}

/// Ground-motion names become file stems; path separators are replaced.
fn file_stem(ground_motion: &str) -> String {
    ground_motion
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect()
}
