//! Listeners for circuit breaker state transitions

use crate::CircuitState;
use std::sync::Arc;
use std::time::Duration;

/// A state change, as seen by transition listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<'a> {
    pub circuit: &'a str,
    pub from: CircuitState,
    pub to: CircuitState,
    /// Clock reading when the transition happened
    pub at: Duration,
}

pub type TransitionFn = Arc<dyn Fn(&Transition<'_>) + Send + Sync>;

/// Optional listeners, one per target state
///
/// Listeners run on the calling thread after the breaker has released its
/// state lock, so they may query or call the same breaker. By the time one
/// runs, another caller may already have moved the circuit on.
#[derive(Clone, Default)]
pub struct Callbacks {
    pub on_open: Option<TransitionFn>,
    pub on_close: Option<TransitionFn>,
    pub on_half_open: Option<TransitionFn>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notify the listener registered for `transition.to`, if any
    pub fn dispatch(&self, transition: &Transition<'_>) {
        let listener = match transition.to {
            CircuitState::Open => &self.on_open,
            CircuitState::Closed => &self.on_close,
            CircuitState::HalfOpen => &self.on_half_open,
        };
        if let Some(callback) = listener {
            callback(transition);
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_half_open", &self.on_half_open.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_dispatch_routes_by_target_state() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let open_seen = Arc::clone(&seen);
        let close_seen = Arc::clone(&seen);

        let callbacks = Callbacks {
            on_open: Some(Arc::new(move |t: &Transition<'_>| {
                open_seen.lock().unwrap().push(("open", t.from));
            })),
            on_close: Some(Arc::new(move |t: &Transition<'_>| {
                close_seen.lock().unwrap().push(("close", t.from));
            })),
            on_half_open: None,
        };

        for (from, to) in [
            (CircuitState::Closed, CircuitState::Open),
            (CircuitState::Open, CircuitState::HalfOpen),
            (CircuitState::HalfOpen, CircuitState::Closed),
        ] {
            callbacks.dispatch(&Transition {
                circuit: "test",
                from,
                to,
                at: Duration::ZERO,
            });
        }

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("open", CircuitState::Closed),
                ("close", CircuitState::HalfOpen)
            ]
        );
    }

    #[test]
    fn test_debug_hides_closures() {
        let callbacks = Callbacks::new();
        let rendered = format!("{:?}", callbacks);
        assert!(rendered.contains("on_open: false"));
    }
}
