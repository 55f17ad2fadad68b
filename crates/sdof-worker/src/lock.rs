//! Writer locks for the artifacts of one ground motion.
//!
//! Writers of the same ground motion in the same output area are serialized;
//! writers of different ground motions never wait on each other. The lock
//! covers file writes only, never computation.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use log::debug;
use parking_lot::Mutex;

use sdof_io::ArtifactLayout;

trait Held {}

impl<T> Held for T {}

/// Proof of holding a ground-motion lock; releases it on drop.
pub struct ArtifactGuard<'a> {
    _held: Box<dyn Held + 'a>,
}

impl<'a> ArtifactGuard<'a> {
    fn new(held: impl Held + 'a) -> Self {
        Self {
            _held: Box::new(held),
        }
    }
}

pub trait ArtifactLock: Send + Sync {
    fn acquire(&self, dir: &Path, ground_motion: &str) -> io::Result<ArtifactGuard<'_>>;
}

/// In-process lock table keyed by output area and ground motion.
///
/// An entry lives only while someone holds or waits for its key.
#[derive(Debug, Default)]
pub struct KeyedLock {
    slots: Mutex<HashMap<(PathBuf, String), Arc<Mutex<()>>>>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

struct KeyedHold<'a, G> {
    table: &'a KeyedLock,
    key: (PathBuf, String),
    held: Option<G>,
}

impl<G> Drop for KeyedHold<'_, G> {
    fn drop(&mut self) {
        self.held = None;
        // slots are only cloned under the table lock
        let mut slots = self.table.slots.lock();
        if slots
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.key);
        }
    }
}

impl ArtifactLock for KeyedLock {
    fn acquire(&self, dir: &Path, ground_motion: &str) -> io::Result<ArtifactGuard<'_>> {
        let key = (dir.to_path_buf(), ground_motion.to_string());
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(key.clone()).or_default())
        };
        Ok(ArtifactGuard::new(KeyedHold {
            table: self,
            key,
            held: Some(slot.lock_arc()),
        }))
    }
}

/// Cross-process lock: an exclusive advisory lock on `.<gm>.lock`.
///
/// The operating system drops the lock when its holder exits, so a worker
/// killed mid-write never blocks the ones after it. The file itself stays
/// in place and records the pid of the last holder.
#[derive(Debug, Clone)]
pub struct LockFiles {
    timeout: Duration,
    poll: Duration,
}

impl LockFiles {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll: Duration::from_millis(10),
        }
    }
}

impl Default for LockFiles {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.raw_os_error().is_some() && err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl ArtifactLock for LockFiles {
    fn acquire(&self, dir: &Path, ground_motion: &str) -> io::Result<ArtifactGuard<'_>> {
        fs::create_dir_all(dir)?;
        let path = ArtifactLayout::new(dir).lock_path(ground_motion);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        let started = Instant::now();

        loop {
            match file.try_lock_exclusive() {
                Ok(()) => break,
                Err(err) if is_contended(&err) => {
                    if started.elapsed() >= self.timeout {
                        let holder = fs::read_to_string(&path).unwrap_or_default();
                        return Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            format!(
                                "lock {} held by process {} for more than {:?}",
                                path.display(),
                                holder.trim(),
                                self.timeout
                            ),
                        ));
                    }
                    thread::sleep(self.poll);
                }
                Err(err) => return Err(err),
            }
        }

        file.set_len(0)?;
        write!(file, "{}", process::id())?;
        file.flush()?;
        debug!("acquired {}", path.display());
        Ok(ArtifactGuard::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn serializes_same_key(lock: Arc<dyn ArtifactLock>, dir: PathBuf) {
        let guard = lock.acquire(&dir, "Kobe").unwrap();
        let entered = Arc::new(AtomicBool::new(false));

        let waiter = {
            let lock = Arc::clone(&lock);
            let entered = Arc::clone(&entered);
            let dir = dir.clone();
            thread::spawn(move || {
                let _guard = lock.acquire(&dir, "Kobe").unwrap();
                entered.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!entered.load(Ordering::SeqCst));
        // another ground motion is free meanwhile
        drop(lock.acquire(&dir, "Northridge").unwrap());

        drop(guard);
        waiter.join().unwrap();
        assert!(entered.load(Ordering::SeqCst));
    }

    #[test]
    fn keyed_lock_serializes_one_ground_motion_only() {
        serializes_same_key(Arc::new(KeyedLock::new()), PathBuf::from("/out"));
    }

    #[test]
    fn keyed_lock_forgets_released_keys() {
        let lock = Arc::new(KeyedLock::new());
        let dir = PathBuf::from("/out");
        for ground_motion in ["Kobe", "Northridge", "ChiChi"] {
            drop(lock.acquire(&dir, ground_motion).unwrap());
        }
        assert_eq!(lock.len(), 0);

        let guard = lock.acquire(&dir, "Kobe").unwrap();
        let waiter = {
            let lock = Arc::clone(&lock);
            let dir = dir.clone();
            thread::spawn(move || drop(lock.acquire(&dir, "Kobe").unwrap()))
        };
        thread::sleep(Duration::from_millis(50));
        drop(guard);
        // the waiter still needs the entry after the first holder is gone
        waiter.join().unwrap();
        assert_eq!(lock.len(), 0);
    }

    #[test]
    fn lock_files_serialize_one_ground_motion_only() {
        let dir = tempfile::tempdir().unwrap();
        serializes_same_key(Arc::new(LockFiles::default()), dir.path().to_path_buf());
        let holder = fs::read_to_string(dir.path().join(".Kobe.lock")).unwrap();
        assert_eq!(holder, process::id().to_string());
    }

    #[test]
    fn lock_files_time_out() {
        let dir = tempfile::tempdir().unwrap();
        let lock = LockFiles::new(Duration::from_millis(30));
        let _held = lock.acquire(dir.path(), "Kobe").unwrap();
        let err = lock.acquire(dir.path(), "Kobe").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(err.to_string().contains(&process::id().to_string()), "{err}");
    }

    #[test]
    fn lock_file_left_by_a_dead_holder_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".Kobe.lock");
        // a holder that exited without cleaning up leaves its pid behind
        fs::write(&path, "4194301").unwrap();

        let lock = LockFiles::new(Duration::from_millis(200));
        let guard = lock.acquire(dir.path(), "Kobe").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), process::id().to_string());
        drop(guard);
    }

    #[test]
    fn closing_the_holder_handle_releases_the_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".Kobe.lock");
        let holder = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .unwrap();
        holder.try_lock_exclusive().unwrap();

        let lock = LockFiles::new(Duration::from_millis(30));
        let err = lock.acquire(dir.path(), "Kobe").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);

        // what the kernel does when the holding process dies
        drop(holder);
        assert!(lock.acquire(dir.path(), "Kobe").is_ok());
    }
}
