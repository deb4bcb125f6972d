//! Capacity-1 admission control for the accelerator
//!
//! Exactly one unit of work may hold the gate at a time. The permit is an
//! RAII guard: dropping it releases the gate, whichever way the holder exits.

use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::error::{AppError, Result};

/// Point-in-time view of the gate. `released` counts every permit drop,
/// whether the holder succeeded, failed or was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateSnapshot {
    pub held: bool,
    pub waiting: usize,
    pub released: u64,
}

/// Serializes access to the single accelerator
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    waiting: Arc<AtomicUsize>,
    released: Arc<AtomicU64>,
}

/// Proof of holding the gate. Released on drop.
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
    released: Arc<AtomicU64>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        let released = self.released.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(released, "Admission gate released");
    }
}

/// Keeps `waiting` accurate when an acquire future is dropped mid-wait
struct WaitingGuard(Arc<AtomicUsize>);

impl Drop for WaitingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AdmissionGate {
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            waiting: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Wait, without timeout, until the gate is free and take it
    pub async fn acquire(&self) -> Result<AdmissionPermit> {
        let ahead = self.waiting.fetch_add(1, Ordering::Relaxed);
        let waiting = WaitingGuard(self.waiting.clone());
        debug!(ahead, "Waiting for admission gate");

        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AppError::Internal("Admission gate closed".to_string()))?;
        drop(waiting);

        debug!("Admission gate acquired");
        Ok(AdmissionPermit {
            _permit: permit,
            released: self.released.clone(),
        })
    }

    /// Run `work` while holding the gate; the gate is released however `work` ends
    pub async fn run<F, Fut, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _permit = self.acquire().await?;
        work().await
    }

    pub fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            held: self.semaphore.available_permits() == 0,
            waiting: self.waiting.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
        }
    }
}
