//! Cooperative stop and pause signals shared by coordinator and workers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

/// One-way stop request, polled by a worker before it touches any input.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct PauseState {
    paused: Mutex<bool>,
    resumed: Condvar,
}

/// Blocking gate; open unless paused.
#[derive(Debug, Clone, Default)]
pub struct PauseGate {
    state: Arc<PauseState>,
}

impl PauseGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        *self.state.paused.lock() = true;
    }

    pub fn resume(&self) {
        let mut paused = self.state.paused.lock();
        *paused = false;
        self.state.resumed.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        *self.state.paused.lock()
    }

    /// Block while the gate is paused.
    pub fn wait(&self) {
        let mut paused = self.state.paused.lock();
        while *paused {
            self.state.resumed.wait(&mut paused);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn stop_is_seen_by_every_clone() {
        let stop = StopSignal::new();
        let seen_by_worker = stop.clone();
        assert!(!seen_by_worker.is_stopped());
        stop.stop();
        assert!(seen_by_worker.is_stopped());
    }

    #[test]
    fn open_gate_does_not_block() {
        let gate = PauseGate::new();
        gate.wait();
        assert!(!gate.is_paused());
    }

    #[test]
    fn paused_gate_blocks_until_resumed() {
        let gate = PauseGate::new();
        gate.pause();
        let passed = Arc::new(AtomicUsize::new(0));

        let worker = {
            let gate = gate.clone();
            let passed = Arc::clone(&passed);
            thread::spawn(move || {
                gate.wait();
                passed.fetch_add(1, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(passed.load(Ordering::SeqCst), 0);
        gate.resume();
        worker.join().unwrap();
        assert_eq!(passed.load(Ordering::SeqCst), 1);
    }
}
