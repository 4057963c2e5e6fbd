//! Time sources for circuit breaker timeouts
//!
//! This module provides two clocks:
//! - `MonotonicClock`: anchored on `Instant`, immune to NTP adjustments
//! - `ManualClock`: advanced by hand, for deterministic tests and simulations
//!
//! Both report time as a `Duration` offset from their own anchor. Offsets from
//! different clocks are not comparable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source used by the circuit breaker
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Time elapsed since this clock's anchor. Never decreases.
    fn now(&self) -> Duration;
}

/// Wall-independent clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start_time: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Clock that only moves when told to
///
/// Share it with a breaker through an `Arc` and keep a handle to advance it:
///
/// ```rust
/// use breaker_gateway::{CircuitBreaker, Clock, ManualClock};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let clock = Arc::new(ManualClock::new());
/// let circuit = CircuitBreaker::builder("inventory")
///     .clock(clock.clone())
///     .build()
///     .unwrap();
///
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(clock.now(), Duration::from_secs(5));
/// # drop(circuit);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    /// Create a clock reading zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `by`
    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(saturating_nanos(by), Ordering::SeqCst);
    }

    /// Jump to `at`. Ignored if `at` is earlier than the current reading.
    pub fn set(&self, at: Duration) {
        self.nanos.fetch_max(saturating_nanos(at), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

fn saturating_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
