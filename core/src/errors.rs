//! Error types for circuit breaker operations

use std::time::Duration;
use thiserror::Error;

/// Why the breaker declined to run an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Circuit is open and the recovery timeout has not elapsed
    CircuitOpen,
    /// Circuit is half-open and another caller holds the trial slot
    TrialAlreadyInFlight,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::CircuitOpen => "circuit open",
            Rejection::TrialAlreadyInFlight => "trial already in flight",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during circuit breaker operations
#[derive(Debug, Error)]
pub enum CircuitError<E = Box<dyn std::error::Error + Send + Sync>> {
    /// Circuit is open, calls are being rejected
    #[error("Circuit '{circuit}' is open (opened at {opened_at:?})")]
    Open { circuit: String, opened_at: Duration },
    /// Half-open trial slot is taken
    #[error("Circuit '{circuit}' is half-open and a trial call is already in flight")]
    TrialInFlight { circuit: String },
    /// The wrapped operation failed
    #[error("Circuit execution failed: {0}")]
    Execution(#[source] E),
}

impl<E> CircuitError<E> {
    /// The rejection kind, or `None` when the operation itself failed
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            CircuitError::Open { .. } => Some(Rejection::CircuitOpen),
            CircuitError::TrialInFlight { .. } => Some(Rejection::TrialAlreadyInFlight),
            CircuitError::Execution(_) => None,
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.rejection().is_some()
    }
}

/// Invalid circuit breaker configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("failure threshold must be greater than 0")]
    ZeroFailureThreshold,
    #[error("jitter factor must be within 0.0..=1.0, got {0}")]
    JitterOutOfRange(f64),
}
