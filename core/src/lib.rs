//! breaker-gateway - Circuit breaker for calls to unreliable dependencies
//!
//! This crate provides:
//! - A thread-safe circuit breaker (Closed → Open → HalfOpen) shared through `Arc`
//! - Single-trial recovery: exactly one probe call while HalfOpen
//! - Injectable monotonic clocks for deterministic timeout tests
//! - A fallback decorator that substitutes degraded values for failures
//!
//! # Example
//!
//! ```rust
//! use breaker_gateway::{CallOutcome, CircuitBreaker, Rejection};
//! use std::time::Duration;
//!
//! let circuit = CircuitBreaker::builder("payment_api")
//!     .failure_threshold(3)
//!     .recovery_timeout(Duration::from_secs(30))
//!     .on_open(|t| eprintln!("circuit {} opened", t.circuit))
//!     .build()
//!     .expect("valid config");
//!
//! match circuit.call(|| Ok::<_, String>("charged")) {
//!     CallOutcome::Success(receipt) => println!("{}", receipt),
//!     CallOutcome::Failure(err) => eprintln!("payment failed: {}", err),
//!     CallOutcome::Rejected(Rejection::CircuitOpen) => eprintln!("skipping, circuit open"),
//!     CallOutcome::Rejected(Rejection::TrialAlreadyInFlight) => eprintln!("recovery probe busy"),
//! }
//! ```

pub mod builder;
pub mod callbacks;
pub mod circuit;
pub mod clock;
pub mod counter;
pub mod errors;
pub mod fallback;
pub mod outcome;
pub mod trial;

pub use builder::CircuitBuilder;
pub use callbacks::Transition;
pub use circuit::{CircuitBreaker, CircuitStats, Config};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use counter::FailureCounter;
pub use errors::{CircuitError, ConfigError, Rejection};
pub use fallback::{FallbackCause, FallbackContext, FallbackDecorator};
pub use outcome::CallOutcome;
pub use trial::{TrialGuard, TrialSlot};

/// Lifecycle state of a circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    /// Calls pass through to the dependency
    Closed,
    /// Calls are rejected without contacting the dependency
    Open,
    /// One trial call is allowed to probe for recovery
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "Closed",
            CircuitState::Open => "Open",
            CircuitState::HalfOpen => "HalfOpen",
        }
    }

    /// Parse a state name as reported by the state machine
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Closed" => Some(CircuitState::Closed),
            "Open" => Some(CircuitState::Open),
            "HalfOpen" => Some(CircuitState::HalfOpen),
            _ => None,
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
