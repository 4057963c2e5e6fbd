//! Fallback decorator for degraded responses
//!
//! `FallbackDecorator` wraps a shared `CircuitBreaker` and turns every
//! failure or rejection into a substitute value, so callers only ever see a
//! real result or a fallback one.

use crate::{CircuitBreaker, CircuitState, errors::Rejection, outcome::CallOutcome};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Why the fallback is being invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackCause<E> {
    /// The operation ran and failed
    Failure(E),
    /// The breaker refused to run the operation
    Rejected(Rejection),
}

/// Context provided to fallback closures
#[derive(Debug, Clone)]
pub struct FallbackContext<'a, E> {
    /// Circuit name
    pub circuit_name: &'a str,
    /// Circuit state after the call was handled
    pub state: CircuitState,
    /// When the circuit tripped, if it is Open
    pub opened_at: Option<Duration>,
    pub cause: FallbackCause<E>,
}

impl<E> FallbackContext<'_, E> {
    pub fn is_rejection(&self) -> bool {
        matches!(self.cause, FallbackCause::Rejected(_))
    }
}

/// Circuit breaker wrapper that always yields a value
///
/// # Example
///
/// ```rust
/// use breaker_gateway::{CircuitBreaker, FallbackDecorator};
/// use std::sync::Arc;
///
/// let breaker = Arc::new(
///     CircuitBreaker::builder("catalog")
///         .failure_threshold(1)
///         .build()
///         .unwrap(),
/// );
/// let catalog = FallbackDecorator::new(breaker, |_ctx| "cached".to_string());
///
/// let first = catalog.call_with_fallback(|| Err::<String, _>("timeout"));
/// let second = catalog.call_with_fallback(|| Ok::<_, &str>("fresh".to_string()));
///
/// assert_eq!(first, "cached");
/// assert_eq!(second, "cached"); // circuit is open now
/// ```
pub struct FallbackDecorator<T, E, F> {
    breaker: Arc<CircuitBreaker>,
    fallback: F,
    _marker: PhantomData<fn(E) -> T>,
}

impl<T, E, F> FallbackDecorator<T, E, F>
where
    F: Fn(FallbackContext<'_, E>) -> T,
{
    pub fn new(breaker: Arc<CircuitBreaker>, fallback: F) -> Self {
        Self {
            breaker,
            fallback,
            _marker: PhantomData,
        }
    }

    /// The wrapped breaker, for inspection or sharing
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Run `operation` through the breaker, substituting the fallback value on
    /// failure or rejection
    pub fn call_with_fallback<Op>(&self, operation: Op) -> T
    where
        Op: FnOnce() -> Result<T, E>,
    {
        let cause = match self.breaker.call(operation) {
            CallOutcome::Success(value) => return value,
            CallOutcome::Failure(err) => FallbackCause::Failure(err),
            CallOutcome::Rejected(reason) => FallbackCause::Rejected(reason),
        };

        (self.fallback)(FallbackContext {
            circuit_name: self.breaker.name(),
            state: self.breaker.state(),
            opened_at: self.breaker.opened_at(),
            cause,
        })
    }
}

impl<T, E, F> std::fmt::Debug for FallbackDecorator<T, E, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackDecorator")
            .field("breaker", &self.breaker)
            .field("fallback", &"<closure>")
            .finish()
    }
}
