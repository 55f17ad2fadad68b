//! Named shared segments of 8-byte floats.
//!
//! A coordinator publishes read-only numeric inputs (ground-motion traces,
//! period grids, spectral ordinates) as named segments under a shared-memory
//! root, `/dev/shm` on Linux. Workers attach by name, copy exactly the declared
//! number of elements and release the attachment before returning, so no
//! worker ever holds a live view into coordinator-owned memory.
//!
//! ```text
//! coordinator                         worker
//! SegmentHost::create("gm_0", ..) ──▶ ShmDirectory::attach("gm_0", npts)
//!        │                                  │ open, size check, copy, close
//!        ▼                                  ▼
//! drop(SegmentHost) removes files     owned Vec<f64>
//! ```

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{IoError, Result};
use crate::replace::write_replace;

const ELEMENT_BYTES: usize = std::mem::size_of::<f64>();

/// Environment variable overriding the shared-memory root directory.
pub const SHM_ROOT_ENV: &str = "SDOF_SHM_ROOT";

static SEGMENT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Name and element count of a published segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRef {
    pub name: String,
    pub len: usize,
}

impl SegmentRef {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
        }
    }

    pub fn byte_len(&self) -> u64 {
        (self.len * ELEMENT_BYTES) as u64
    }
}

/// Source of coordinator-owned numeric segments.
///
/// `attach` returns an owned copy; implementations must not keep any handle
/// to the segment once they return.
pub trait SegmentSource: Send + Sync {
    fn attach(&self, name: &str, len: usize) -> Result<Vec<f64>>;
}

/// Segments stored as files in a shared-memory directory.
#[derive(Debug, Clone)]
pub struct ShmDirectory {
    root: PathBuf,
}

impl ShmDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root from `SDOF_SHM_ROOT`, else `/dev/shm` when present, else the
    /// system temporary directory.
    pub fn from_env() -> Self {
        if let Some(root) = std::env::var_os(SHM_ROOT_ENV) {
            return Self::new(root);
        }
        let dev_shm = Path::new("/dev/shm");
        if dev_shm.is_dir() {
            Self::new(dev_shm)
        } else {
            Self::new(std::env::temp_dir())
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn segment_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

impl SegmentSource for ShmDirectory {
    fn attach(&self, name: &str, len: usize) -> Result<Vec<f64>> {
        let path = self.segment_path(name)?;
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(IoError::SegmentNotFound(name.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        let expected_bytes = (len * ELEMENT_BYTES) as u64;
        let actual_bytes = file.metadata()?.len();
        if actual_bytes != expected_bytes {
            return Err(IoError::SegmentSizeMismatch {
                name: name.to_string(),
                expected_bytes,
                actual_bytes,
            });
        }

        let mut bytes = vec![0u8; len * ELEMENT_BYTES];
        file.read_exact(&mut bytes)?;
        drop(file);

        debug!("copied {len} elements from segment '{name}'");
        Ok(decode_f64_le(&bytes))
    }
}

/// Coordinator-side owner of published segments.
///
/// Every segment created through a host is removed when the host is dropped,
/// so segment lifetime follows the coordinator, never the workers.
#[derive(Debug)]
pub struct SegmentHost {
    directory: ShmDirectory,
    owned: Vec<PathBuf>,
}

impl SegmentHost {
    pub fn new(directory: ShmDirectory) -> Self {
        Self {
            directory,
            owned: Vec::new(),
        }
    }

    pub fn directory(&self) -> &ShmDirectory {
        &self.directory
    }

    /// Publish `data` under `name`, replacing a segment of the same name.
    pub fn create(&mut self, name: &str, data: &[f64]) -> Result<SegmentRef> {
        let path = self.directory.segment_path(name)?;
        fs::create_dir_all(self.directory.root())?;
        write_replace(&path, &encode_f64_le(data))?;
        if !self.owned.contains(&path) {
            self.owned.push(path);
        }
        Ok(SegmentRef::new(name, data.len()))
    }

    /// Publish `data` under a fresh name starting with `prefix`.
    pub fn create_unique(&mut self, prefix: &str, data: &[f64]) -> Result<SegmentRef> {
        let seq = SEGMENT_COUNTER.fetch_add(1, Ordering::Relaxed);
        let name = format!("{prefix}_{}_{seq}", std::process::id());
        self.create(&name, data)
    }
}

impl Drop for SegmentHost {
    fn drop(&mut self) {
        for path in self.owned.drain(..) {
            if let Err(err) = fs::remove_file(&path) {
                debug!("could not remove segment {}: {err}", path.display());
            }
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(IoError::InvalidSegmentName(name.to_string()));
    }
    Ok(())
}

fn encode_f64_le(data: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(data.len() * ELEMENT_BYTES);
    for value in data {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn decode_f64_le(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(ELEMENT_BYTES)
        .map(|chunk| {
            let mut raw = [0u8; ELEMENT_BYTES];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_copies_published_values() {
        let root = tempfile::tempdir().expect("temp dir");
        let mut host = SegmentHost::new(ShmDirectory::new(root.path()));
        let trace = [0.0, 0.125, -0.5, 1.0e-3, f64::MIN_POSITIVE];
        let segment = host.create("gm_kobe", &trace).expect("create segment");
        assert_eq!(segment.len, 5);
        assert_eq!(segment.byte_len(), 40);

        let copy = ShmDirectory::new(root.path())
            .attach(&segment.name, segment.len)
            .expect("attach should succeed");
        assert_eq!(copy, trace);
    }

    #[test]
    fn attach_reports_missing_segment() {
        let root = tempfile::tempdir().expect("temp dir");
        let err = ShmDirectory::new(root.path())
            .attach("absent", 3)
            .expect_err("missing segment should fail");
        assert!(matches!(err, IoError::SegmentNotFound(name) if name == "absent"));
    }

    #[test]
    fn attach_rejects_size_mismatch() {
        let root = tempfile::tempdir().expect("temp dir");
        let mut host = SegmentHost::new(ShmDirectory::new(root.path()));
        host.create("periods", &[0.1, 0.2, 0.3]).expect("create");

        let err = host
            .directory()
            .attach("periods", 4)
            .expect_err("declared count differs");
        match err {
            IoError::SegmentSizeMismatch {
                expected_bytes,
                actual_bytes,
                ..
            } => {
                assert_eq!(expected_bytes, 32);
                assert_eq!(actual_bytes, 24);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn names_cannot_escape_the_root() {
        let root = tempfile::tempdir().expect("temp dir");
        let dir = ShmDirectory::new(root.path());
        for name in ["", "..", "../etc/passwd", "a/b"] {
            let err = dir.attach(name, 1).expect_err("invalid name");
            assert!(matches!(err, IoError::InvalidSegmentName(_)), "{name:?}");
        }
    }

    #[test]
    fn host_removes_segments_on_drop() {
        let root = tempfile::tempdir().expect("temp dir");
        let path;
        {
            let mut host = SegmentHost::new(ShmDirectory::new(root.path()));
            let segment = host.create_unique("sa", &[1.0, 2.0]).expect("create");
            assert!(segment.name.starts_with("sa_"));
            path = root.path().join(&segment.name);
            assert!(path.exists());
        }
        assert!(!path.exists(), "segment should be released with its host");
    }
}
