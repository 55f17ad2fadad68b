//! Two-dimensional `f64` arrays in NPY format.
//!
//! Only what the time-series artifacts need is supported: little-endian
//! 8-byte floats (`<f8`), C order, two dimensions. The writer emits format
//! version 1.0 with the header padded so the data starts on a 64-byte
//! boundary; the reader accepts versions 1.0 and 2.0.

use std::fs;
use std::path::Path;

use nalgebra::DMatrix;

use crate::error::{IoError, Result};
use crate::replace::write_replace;

const MAGIC: &[u8] = b"\x93NUMPY";
const ALIGNMENT: usize = 64;

/// A row-major array read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub shape: (usize, usize),
    /// Row-major values, `shape.0 * shape.1` of them
    pub data: Vec<f64>,
}

impl NpyArray {
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.shape.0 && col < self.shape.1 {
            self.data.get(row * self.shape.1 + col).copied()
        } else {
            None
        }
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.shape.0).filter_map(|row| self.get(row, col)).collect()
    }

    pub fn into_matrix(self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.shape.0, self.shape.1, &self.data)
    }
}

pub fn write_npy(path: impl AsRef<Path>, matrix: &DMatrix<f64>) -> Result<()> {
    let (rows, cols) = matrix.shape();
    let mut header = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({rows}, {cols}), }}"
    );
    // magic(6) + version(2) + header length(2) + header + '\n'
    let unpadded = MAGIC.len() + 4 + header.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    header.extend(std::iter::repeat_n(' ', padding));
    header.push('\n');

    let header_len = u16::try_from(header.len())
        .map_err(|_| IoError::InvalidData("NPY header too long".to_string()))?;

    let mut bytes = Vec::with_capacity(MAGIC.len() + 4 + header.len() + rows * cols * 8);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&[1, 0]);
    bytes.extend_from_slice(&header_len.to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    for r in 0..rows {
        for c in 0..cols {
            bytes.extend_from_slice(&matrix[(r, c)].to_le_bytes());
        }
    }

    write_replace(path, &bytes)?;
    Ok(())
}

pub fn read_npy_f64(path: impl AsRef<Path>) -> Result<NpyArray> {
    let bytes = fs::read(path)?;
    if bytes.len() < MAGIC.len() + 4 || &bytes[..MAGIC.len()] != MAGIC {
        return Err(IoError::Parse("missing NPY magic string".to_string()));
    }

    let major = bytes[MAGIC.len()];
    let (header_len, header_start) = match major {
        1 => {
            let raw = [bytes[8], bytes[9]];
            (u16::from_le_bytes(raw) as usize, 10)
        }
        2 => {
            if bytes.len() < 12 {
                return Err(IoError::Parse("truncated NPY header".to_string()));
            }
            let raw = [bytes[8], bytes[9], bytes[10], bytes[11]];
            (u32::from_le_bytes(raw) as usize, 12)
        }
        other => {
            return Err(IoError::Parse(format!("unsupported NPY version {other}")));
        }
    };

    let data_start = header_start + header_len;
    let header = bytes
        .get(header_start..data_start)
        .and_then(|raw| std::str::from_utf8(raw).ok())
        .ok_or_else(|| IoError::Parse("truncated NPY header".to_string()))?;

    if !header.contains("'descr': '<f8'") {
        return Err(IoError::InvalidData(format!("unsupported dtype in header {header}")));
    }
    if !header.contains("'fortran_order': False") {
        return Err(IoError::InvalidData("Fortran-ordered arrays are not supported".to_string()));
    }
    let shape = parse_shape(header)?;

    let payload = &bytes[data_start..];
    let expected = shape.0 * shape.1 * 8;
    if payload.len() != expected {
        return Err(IoError::InvalidData(format!(
            "NPY payload holds {} bytes, shape {shape:?} needs {expected}",
            payload.len()
        )));
    }

    let data = payload
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect();

    Ok(NpyArray { shape, data })
}

fn parse_shape(header: &str) -> Result<(usize, usize)> {
    let bad = || IoError::Parse(format!("cannot read shape from header {header}"));
    let start = header.find("'shape': (").ok_or_else(bad)? + "'shape': (".len();
    let end = start + header[start..].find(')').ok_or_else(bad)?;
    let dims: Vec<usize> = header[start..end]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().map_err(|_| bad()))
        .collect::<Result<_>>()?;
    match dims.as_slice() {
        [rows, cols] => Ok((*rows, *cols)),
        [len] => Ok((*len, 1)),
        _ => Err(bad()),
    }
}
