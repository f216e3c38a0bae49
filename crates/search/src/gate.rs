//! RAG backpressure gate
//!
//! Caps concurrent in-flight generations per process. Requests beyond
//! the cap wait in a small bounded queue; once the queue is full, new
//! arrivals are rejected with `Overloaded`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use voucher_search_core::{Error, Result};

/// Bounded admission gate for generator calls
pub struct RagGate {
    semaphore: Arc<Semaphore>,
    queued: AtomicUsize,
    queue_capacity: usize,
}

impl RagGate {
    pub fn new(concurrency_limit: usize, queue_capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency_limit.max(1))),
            queued: AtomicUsize::new(0),
            queue_capacity,
        }
    }

    /// Acquire a generation slot
    ///
    /// Waits in the bounded queue when the cap is reached; `remaining`
    /// bounds the wait. A full queue rejects immediately.
    pub async fn acquire(&self, remaining: Option<Duration>) -> Result<OwnedSemaphorePermit> {
        if let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() {
            return Ok(permit);
        }

        let queued = self.queued.fetch_add(1, Ordering::SeqCst);
        if queued >= self.queue_capacity {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::Overloaded(format!(
                "generation queue full ({} waiting)",
                queued
            )));
        }

        tracing::debug!(queued = queued + 1, "generation slot busy, queueing");

        let wait = Arc::clone(&self.semaphore).acquire_owned();
        let outcome = match remaining {
            Some(budget) => match tokio::time::timeout(budget, wait).await {
                Ok(result) => result.map_err(|_| closed_error()),
                Err(_) => {
                    self.queued.fetch_sub(1, Ordering::SeqCst);
                    return Err(Error::DeadlineExceeded);
                }
            },
            None => wait.await.map_err(|_| closed_error()),
        };

        self.queued.fetch_sub(1, Ordering::SeqCst);
        outcome
    }

    /// Requests currently waiting for a slot
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }
}

fn closed_error() -> Error {
    Error::Overloaded("generation gate closed".to_string())
}
