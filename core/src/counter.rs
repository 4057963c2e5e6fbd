//! Consecutive failure counting

use std::sync::atomic::{AtomicU32, Ordering};

/// Counts consecutive failures for one circuit
///
/// Each update is a single atomic read-modify-write. Ordering between the
/// counter and the circuit state comes from the owning `CircuitBreaker`'s
/// state lock, so `Relaxed` is enough here. It lives behind an `Arc` only so
/// the state machine guards can read it.
#[derive(Debug, Default)]
pub struct FailureCounter {
    consecutive: AtomicU32,
}

impl FailureCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more failure, returning the new count
    pub fn increment(&self) -> u32 {
        let previous = self
            .consecutive
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_add(1))
            })
            .unwrap_or_else(|n| n);
        previous.saturating_add(1)
    }

    /// Forget the current streak
    pub fn reset(&self) {
        self.consecutive.store(0, Ordering::Relaxed);
    }

    /// Length of the current failure streak
    pub fn value(&self) -> u32 {
        self.consecutive.load(Ordering::Relaxed)
    }
}
