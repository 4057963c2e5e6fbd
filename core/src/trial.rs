//! Single-permit slot for HalfOpen trial calls
//!
//! While a circuit is HalfOpen exactly one caller may probe the dependency.
//! The slot is a single atomic flag claimed with compare-and-set, so losing
//! callers are turned away without waiting on anything.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Slot granting at most one outstanding trial
#[derive(Debug, Default)]
pub struct TrialSlot {
    in_flight: AtomicBool,
}

impl TrialSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim the slot without blocking
    ///
    /// Returns `Some(TrialGuard)` for the single winner, `None` while another
    /// trial is outstanding.
    pub fn try_acquire(self: &Arc<Self>) -> Option<TrialGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TrialGuard {
                slot: Arc::clone(self),
            })
    }

    /// Whether a trial is currently outstanding
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn release(&self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Guard that frees the trial slot when dropped
///
/// Dropping happens on every exit path, including a panicking operation, so a
/// crashed probe never wedges the circuit in HalfOpen.
#[derive(Debug)]
pub struct TrialGuard {
    slot: Arc<TrialSlot>,
}

impl Drop for TrialGuard {
    fn drop(&mut self) {
        self.slot.release();
    }
}
