//! Per-ground-motion summary tables.
//!
//! A table is a comma-separated file with a fixed header and one row per
//! analysed item. Updates never edit a row in place: the whole table is read,
//! extended and rewritten through [`write_replace`], so a concurrent reader
//! sees either the previous table or the new one.
//!
//! Floats are written with Rust's shortest round-trip formatting, so a value
//! read back compares equal to the value written. Undefined values are empty
//! fields.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IoError, Result};
use crate::replace::write_replace;

pub const SUMMARY_COLUMNS: [&str; 17] = [
    "T",
    "E",
    "Fy",
    "uy",
    "Sa",
    "R",
    "miu",
    "maxDisp",
    "maxVel",
    "maxAccel",
    "Ec",
    "Ev",
    "maxReaction",
    "CD",
    "CPD",
    "resDisp",
    "solving_converge",
];

/// One analysed item of a ground motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// `T`, undefined for analyses without a period
    pub period: Option<f64>,
    /// `E`, elastic stiffness
    pub stiffness: f64,
    /// `Fy`
    pub yield_force: f64,
    /// `uy`, always `Fy / E`
    pub yield_disp: f64,
    /// `Sa` in g
    pub spectral_accel: Option<f64>,
    /// `R`, strength-reduction ratio
    pub strength_ratio: Option<f64>,
    /// `miu`, displacement ductility
    pub ductility: f64,
    pub max_disp: f64,
    pub max_vel: f64,
    pub max_accel: f64,
    /// `Ec`, dissipated hysteretic energy
    pub dissipated_energy: f64,
    /// `Ev`, viscous energy
    pub viscous_energy: f64,
    pub max_reaction: f64,
    /// `CD`, cumulative ductility
    pub cumulative_ductility: f64,
    /// `CPD`, peak ductility
    pub peak_ductility: f64,
    pub residual_disp: f64,
    pub converged: bool,
}

impl SummaryRow {
    fn to_fields(&self) -> [String; 17] {
        [
            opt(self.period),
            self.stiffness.to_string(),
            self.yield_force.to_string(),
            self.yield_disp.to_string(),
            opt(self.spectral_accel),
            opt(self.strength_ratio),
            self.ductility.to_string(),
            self.max_disp.to_string(),
            self.max_vel.to_string(),
            self.max_accel.to_string(),
            self.dissipated_energy.to_string(),
            self.viscous_energy.to_string(),
            self.max_reaction.to_string(),
            self.cumulative_ductility.to_string(),
            self.peak_ductility.to_string(),
            self.residual_disp.to_string(),
            if self.converged { "1" } else { "0" }.to_string(),
        ]
    }

    fn from_fields(fields: &[&str], line_no: usize) -> Result<Self> {
        if fields.len() != SUMMARY_COLUMNS.len() {
            return Err(IoError::Parse(format!(
                "line {line_no}: expected {} fields, found {}",
                SUMMARY_COLUMNS.len(),
                fields.len()
            )));
        }
        let num = |i: usize| parse_f64(fields[i], SUMMARY_COLUMNS[i], line_no);
        let opt_num = |i: usize| {
            if fields[i].is_empty() {
                Ok(None)
            } else {
                num(i).map(Some)
            }
        };
        let converged = match fields[16] {
            "1" | "True" | "true" => true,
            "0" | "False" | "false" => false,
            other => {
                return Err(IoError::Parse(format!(
                    "line {line_no}: invalid solving_converge value {other:?}"
                )));
            }
        };

        Ok(Self {
            period: opt_num(0)?,
            stiffness: num(1)?,
            yield_force: num(2)?,
            yield_disp: num(3)?,
            spectral_accel: opt_num(4)?,
            strength_ratio: opt_num(5)?,
            ductility: num(6)?,
            max_disp: num(7)?,
            max_vel: num(8)?,
            max_accel: num(9)?,
            dissipated_energy: num(10)?,
            viscous_energy: num(11)?,
            max_reaction: num(12)?,
            cumulative_ductility: num(13)?,
            peak_ductility: num(14)?,
            residual_disp: num(15)?,
            converged,
        })
    }
}

pub fn read_summary(path: impl AsRef<Path>) -> Result<Vec<SummaryRow>> {
    let text = fs::read_to_string(path)?;
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    match lines.next() {
        Some((_, header)) if header.trim() == SUMMARY_COLUMNS.join(",") => {}
        Some((_, header)) => {
            return Err(IoError::Parse(format!("unexpected summary header: {header}")));
        }
        None => return Ok(Vec::new()),
    }

    lines
        .map(|(idx, line)| {
            let fields: Vec<&str> = line.trim_end().split(',').collect();
            SummaryRow::from_fields(&fields, idx + 1)
        })
        .collect()
}

/// Rewrite the whole table with `rows`.
pub fn write_summary(path: impl AsRef<Path>, rows: &[SummaryRow]) -> Result<()> {
    let mut body = SUMMARY_COLUMNS.join(",");
    body.push('\n');
    for row in rows {
        body.push_str(&row.to_fields().join(","));
        body.push('\n');
    }
    write_replace(path, body.as_bytes())?;
    Ok(())
}

/// Append `row` to the table at `path`, creating it if needed.
///
/// Callers must serialize concurrent appends to the same table; this function
/// only guarantees that readers never observe a half-written file.
/// Returns the number of rows now in the table.
pub fn append_summary(path: impl AsRef<Path>, row: SummaryRow) -> Result<usize> {
    let path = path.as_ref();
    let mut rows = match read_summary(path) {
        Ok(rows) => rows,
        Err(IoError::Io(err)) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(err) => return Err(err),
    };
    rows.push(row);
    write_summary(path, &rows)?;
    Ok(rows.len())
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_f64(field: &str, column: &str, line_no: usize) -> Result<f64> {
    field.trim().parse::<f64>().map_err(|err| {
        IoError::Parse(format!("line {line_no}: column {column}: {err} ({field:?})"))
    })
}
