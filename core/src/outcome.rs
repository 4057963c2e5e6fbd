//! Tagged result of a protected call

use crate::errors::{CircuitError, Rejection};
use std::time::Duration;

/// What happened to one invocation of `CircuitBreaker::call`
///
/// Callers must handle all three cases: the dependency answered, the
/// dependency failed, or the breaker refused to contact it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a call outcome may carry a failure or a rejection"]
pub enum CallOutcome<T, E> {
    /// The operation ran and returned a value
    Success(T),
    /// The operation ran and failed; the real error is preserved
    Failure(E),
    /// The breaker did not run the operation
    Rejected(Rejection),
}

impl<T, E> CallOutcome<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CallOutcome::Failure(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, CallOutcome::Rejected(_))
    }

    /// The rejection reason, if the breaker refused the call
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            CallOutcome::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }

    /// The success value, discarding failures and rejections
    pub fn ok(self) -> Option<T> {
        match self {
            CallOutcome::Success(value) => Some(value),
            _ => None,
        }
    }

    /// The operation's error, if it ran and failed
    pub fn failure(self) -> Option<E> {
        match self {
            CallOutcome::Failure(err) => Some(err),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> CallOutcome<U, E> {
        match self {
            CallOutcome::Success(value) => CallOutcome::Success(f(value)),
            CallOutcome::Failure(err) => CallOutcome::Failure(err),
            CallOutcome::Rejected(reason) => CallOutcome::Rejected(reason),
        }
    }

    /// Convert into a `Result` for `?` propagation
    ///
    /// `circuit` and `opened_at` fill in the rejection error's diagnostics.
    pub fn into_result(
        self,
        circuit: &str,
        opened_at: Option<Duration>,
    ) -> Result<T, CircuitError<E>> {
        match self {
            CallOutcome::Success(value) => Ok(value),
            CallOutcome::Failure(err) => Err(CircuitError::Execution(err)),
            CallOutcome::Rejected(Rejection::CircuitOpen) => Err(CircuitError::Open {
                circuit: circuit.to_string(),
                opened_at: opened_at.unwrap_or_default(),
            }),
            CallOutcome::Rejected(Rejection::TrialAlreadyInFlight) => {
                Err(CircuitError::TrialInFlight {
                    circuit: circuit.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_predicates() {
        let success: CallOutcome<u32, &str> = CallOutcome::Success(7);
        let failure: CallOutcome<u32, &str> = CallOutcome::Failure("boom");
        let rejected: CallOutcome<u32, &str> = CallOutcome::Rejected(Rejection::CircuitOpen);

        assert!(success.is_success());
        assert!(failure.is_failure());
        assert!(rejected.is_rejected());
        assert_eq!(rejected.rejection(), Some(Rejection::CircuitOpen));
        assert_eq!(success.rejection(), None);
    }

    #[test]
    fn test_outcome_map_keeps_failure() {
        let failure: CallOutcome<u32, &str> = CallOutcome::Failure("boom");
        assert_eq!(failure.map(|v| v * 2), CallOutcome::Failure("boom"));

        let success: CallOutcome<u32, &str> = CallOutcome::Success(21);
        assert_eq!(success.map(|v| v * 2).ok(), Some(42));
    }

    #[test]
    fn test_into_result_rejections() {
        let open: CallOutcome<(), String> = CallOutcome::Rejected(Rejection::CircuitOpen);
        match open.into_result("search", Some(Duration::from_secs(2))) {
            Err(CircuitError::Open { circuit, opened_at }) => {
                assert_eq!(circuit, "search");
                assert_eq!(opened_at, Duration::from_secs(2));
            }
            other => panic!("Expected CircuitError::Open, got {:?}", other),
        }

        let busy: CallOutcome<(), String> =
            CallOutcome::Rejected(Rejection::TrialAlreadyInFlight);
        assert!(matches!(
            busy.into_result("search", None),
            Err(CircuitError::TrialInFlight { .. })
        ));
    }

    #[test]
    fn test_into_result_failure_keeps_error() {
        let failure: CallOutcome<(), String> = CallOutcome::Failure("timeout".to_string());
        match failure.into_result("search", None) {
            Err(CircuitError::Execution(e)) => assert_eq!(e, "timeout"),
            other => panic!("Expected CircuitError::Execution, got {:?}", other),
        }
    }
}
