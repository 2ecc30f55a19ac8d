//! Bounded pending-emission intake
//!
//! Antenna scans on the transmit phase push `(signal, emission)` pairs from
//! any thread; the owning receiver drains them once per frame. The lock only
//! guards the push or the batch swap. When the intake is full the new pair
//! is dropped and counted, and the caller is never blocked.

use crate::emission::Emission;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Received signal power (W) paired with the emission that produced it
#[derive(Debug, Clone)]
pub struct PendingEmission {
    pub signal: f64,
    pub emission: Arc<Emission>,
}

#[derive(Debug)]
pub struct EmissionIntake {
    pending: Mutex<Vec<PendingEmission>>,
    capacity: usize,
    dropped: AtomicU64,
}

impl EmissionIntake {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Queue a pair. Returns false (and releases the emission) when full.
    pub fn push(&self, signal: f64, emission: Arc<Emission>) -> bool {
        let mut pending = self.pending.lock();
        if pending.len() >= self.capacity {
            drop(pending);
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            trace!(capacity = self.capacity, dropped = total, "emission intake full, dropping");
            return false;
        }
        pending.push(PendingEmission { signal, emission });
        true
    }

    /// Take everything queued so far, most recent first
    pub fn drain(&self) -> Vec<PendingEmission> {
        let mut batch = std::mem::take(&mut *self.pending.lock());
        batch.reverse();
        batch
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pairs rejected because the intake was full, since construction
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
