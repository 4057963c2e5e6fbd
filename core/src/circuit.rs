//! Circuit breaker implementation using state machines
//!
//! The lifecycle is a `state-machines` dynamic machine guarded by one mutex.
//! A call takes the lock twice: once to decide whether the operation may run
//! (including the lazy Open -> HalfOpen step and the trial claim), and once to
//! record the outcome. The operation itself runs unlocked, and so do the
//! transition listeners.

use crate::{
    CircuitState as State,
    callbacks::{Callbacks, Transition},
    clock::{Clock, MonotonicClock},
    counter::FailureCounter,
    errors::{ConfigError, Rejection},
    outcome::CallOutcome,
    trial::{TrialGuard, TrialSlot},
};
use state_machines::state_machine;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Circuit breaker configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Consecutive failures required to open the circuit
    pub failure_threshold: u32,

    /// How long the circuit stays Open before a trial call is allowed
    pub recovery_timeout: Duration,

    /// Jitter factor for recovery_timeout (0.0 = no jitter, 1.0 = full jitter)
    ///
    /// Jitter only lengthens the wait: a tripped circuit stays Open for
    /// somewhere between `recovery_timeout` and
    /// `recovery_timeout * (1 + jitter_factor)`.
    pub jitter_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            jitter_factor: 0.0,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::ZeroFailureThreshold);
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(ConfigError::JitterOutOfRange(self.jitter_factor));
        }
        Ok(())
    }
}

/// Circuit breaker context - shared data across all states
#[derive(Clone)]
pub struct CircuitContext {
    pub name: String,
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub failures: Arc<FailureCounter>,
}

impl Default for CircuitContext {
    fn default() -> Self {
        Self {
            name: String::new(),
            config: Config::default(),
            clock: Arc::new(MonotonicClock::new()),
            failures: Arc::new(FailureCounter::new()),
        }
    }
}

impl std::fmt::Debug for CircuitContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitContext")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("failures", &self.failures.value())
            .finish()
    }
}

/// Data specific to the Open state
#[derive(Debug, Clone, Default)]
pub struct OpenData {
    /// Clock reading when the circuit tripped
    pub opened_at: Duration,
    /// Wait before a trial is allowed, jitter applied
    pub wait: Duration,
}

/// Data specific to the HalfOpen state
#[derive(Debug, Clone, Default)]
pub struct HalfOpenData {
    pub trial_succeeded: bool,
}

state_machine! {
    name: Circuit,
    context: CircuitContext,
    dynamic: true,

    initial: Closed,
    states: [
        Closed,
        Open(OpenData),
        HalfOpen(HalfOpenData),
    ],
    events {
        trip {
            guards: [should_open],
            transition: { from: [Closed, HalfOpen], to: Open }
        }
        attempt_reset {
            guards: [timeout_elapsed],
            transition: { from: Open, to: HalfOpen }
        }
        close {
            guards: [trial_succeeded],
            transition: { from: HalfOpen, to: Closed }
        }
    }
}

impl Circuit<Closed> {
    fn should_open(&self, ctx: &CircuitContext) -> bool {
        ctx.failures.value() >= ctx.config.failure_threshold
    }
}

impl Circuit<HalfOpen> {
    /// Any trial that did not succeed reopens the circuit
    fn should_open(&self, ctx: &CircuitContext) -> bool {
        !self.trial_succeeded(ctx)
    }

    fn trial_succeeded(&self, _ctx: &CircuitContext) -> bool {
        self.state_data_half_open()
            .is_some_and(|data| data.trial_succeeded)
    }
}

impl Circuit<Open> {
    fn timeout_elapsed(&self, ctx: &CircuitContext) -> bool {
        self.state_data_open()
            .is_none_or(|data| ctx.clock.now().saturating_sub(data.opened_at) >= data.wait)
    }
}

/// Wait before the next trial, drawn once per trip
///
/// chrono-machines shortens a delay by up to `jitter * timeout`; that shortfall
/// is added on top of the timeout instead, so no trial starts early.
fn recovery_wait(config: &Config) -> Duration {
    if config.jitter_factor <= 0.0 {
        return config.recovery_timeout;
    }

    let timeout_ms = u64::try_from(config.recovery_timeout.as_millis()).unwrap_or(u64::MAX);
    let policy = chrono_machines::Policy {
        max_attempts: 1,
        base_delay_ms: timeout_ms,
        multiplier: 1.0,
        max_delay_ms: timeout_ms,
    };
    let delay_ms = policy.calculate_delay(1, config.jitter_factor) as u64;
    let extra = config
        .recovery_timeout
        .saturating_sub(Duration::from_millis(delay_ms));
    config.recovery_timeout.saturating_add(extra)
}

/// Point-in-time view of a circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitStats {
    pub state: State,
    pub consecutive_failures: u32,
    /// Operations that ran and succeeded
    pub successes: u64,
    /// Operations that ran and failed
    pub failures: u64,
    /// Calls turned away without running the operation
    pub rejections: u64,
}

#[derive(Debug, Default)]
struct Totals {
    successes: AtomicU64,
    failures: AtomicU64,
    rejections: AtomicU64,
}

struct Inner {
    machine: DynamicCircuit,
    /// Bumped on every transition; outcomes from an older period are ignored
    generation: u64,
}

impl Inner {
    fn state(&self) -> State {
        State::from_name(self.machine.current_state()).unwrap_or(State::Closed)
    }
}

/// Admission ticket for one operation
struct Permit {
    generation: u64,
    trial: Option<TrialGuard>,
}

/// Circuit breaker public API
///
/// `CircuitBreaker` is `Send + Sync`; share one instance per protected
/// dependency through an `Arc`. Independent breakers share no state.
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    context: CircuitContext,
    callbacks: Callbacks,
    trial: Arc<TrialSlot>,
    totals: Totals,
}

impl CircuitBreaker {
    /// Create a new circuit breaker (use builder() for more options)
    pub fn new(name: impl Into<String>, config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let context = CircuitContext {
            name: name.into(),
            config,
            ..Default::default()
        };
        Ok(Self::with_context_and_callbacks(context, Callbacks::new()))
    }

    /// Create a circuit breaker with custom context and callbacks (used by builder)
    pub(crate) fn with_context_and_callbacks(
        context: CircuitContext,
        callbacks: Callbacks,
    ) -> Self {
        let machine = DynamicCircuit::new(context.clone());

        Self {
            inner: Mutex::new(Inner {
                machine,
                generation: 0,
            }),
            context,
            callbacks,
            trial: Arc::new(TrialSlot::new()),
            totals: Totals::default(),
        }
    }

    /// Create a new circuit breaker builder
    pub fn builder(name: impl Into<String>) -> crate::builder::CircuitBuilder {
        crate::builder::CircuitBuilder::new(name)
    }

    /// Execute a fallible operation with circuit breaker protection
    ///
    /// The operation's own error is always returned as `Failure`, including
    /// the failure that trips the circuit. Rejections return immediately
    /// without running the operation.
    ///
    /// The breaker puts no deadline on `operation`. A hung trial keeps the
    /// HalfOpen slot until it returns, so bound slow calls yourself.
    pub fn call<T, E, F>(&self, operation: F) -> CallOutcome<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let permit = match self.admit() {
            Ok(permit) => permit,
            Err(reason) => {
                self.totals.rejections.fetch_add(1, Ordering::Relaxed);
                trace!(circuit = %self.context.name, %reason, "call rejected");
                return CallOutcome::Rejected(reason);
            }
        };

        let result = operation();
        self.record(permit, result.is_ok());

        match result {
            Ok(value) => CallOutcome::Success(value),
            Err(err) => CallOutcome::Failure(err),
        }
    }

    /// Decide whether the operation may run
    fn admit(&self) -> Result<Permit, Rejection> {
        // The slot is only ever held while HalfOpen, so callers that lose the
        // race are turned away without queueing on the state lock.
        if self.trial.is_in_flight() {
            return Err(Rejection::TrialAlreadyInFlight);
        }

        let mut inner = self.lock();
        let mut transition = None;
        if inner.state() == State::Open
            && inner.machine.handle(CircuitEvent::AttemptReset).is_ok()
        {
            transition = Some(self.transitioned(&mut inner, State::Open, State::HalfOpen));
        }

        let admission = self.admit_locked(&inner);
        drop(inner);

        self.notify(transition);
        admission
    }

    fn admit_locked(&self, inner: &Inner) -> Result<Permit, Rejection> {
        match inner.state() {
            State::Closed => Ok(Permit {
                generation: inner.generation,
                trial: None,
            }),
            State::Open => Err(Rejection::CircuitOpen),
            State::HalfOpen => match self.trial.try_acquire() {
                Some(guard) => Ok(Permit {
                    generation: inner.generation,
                    trial: Some(guard),
                }),
                None => Err(Rejection::TrialAlreadyInFlight),
            },
        }
    }

    /// Feed an outcome back into the state machine
    fn record(&self, permit: Permit, succeeded: bool) {
        let counter = if succeeded {
            &self.totals.successes
        } else {
            &self.totals.failures
        };
        counter.fetch_add(1, Ordering::Relaxed);

        let mut inner = self.lock();
        if permit.generation != inner.generation {
            trace!(circuit = %self.context.name, "ignoring outcome from a previous circuit period");
            return;
        }

        let transition = match inner.state() {
            State::Closed if succeeded => {
                self.context.failures.reset();
                None
            }
            State::Closed => {
                let failures = self.context.failures.increment();
                if inner.machine.handle(CircuitEvent::Trip).is_ok() {
                    self.mark_open(&mut inner);
                    Some(self.transitioned(&mut inner, State::Closed, State::Open))
                } else {
                    debug!(circuit = %self.context.name, failures, "failure recorded");
                    None
                }
            }
            State::HalfOpen if permit.trial.is_some() => {
                if succeeded {
                    if let Some(data) = inner.machine.half_open_data_mut() {
                        data.trial_succeeded = true;
                    }
                    if inner.machine.handle(CircuitEvent::Close).is_ok() {
                        self.context.failures.reset();
                        Some(self.transitioned(&mut inner, State::HalfOpen, State::Closed))
                    } else {
                        None
                    }
                } else if inner.machine.handle(CircuitEvent::Trip).is_ok() {
                    self.mark_open(&mut inner);
                    Some(self.transitioned(&mut inner, State::HalfOpen, State::Open))
                } else {
                    None
                }
            }
            _ => None,
        };

        // Trial slot is released only after the transition above is visible
        drop(permit);
        drop(inner);

        self.notify(transition);
    }

    /// Apply Open-state bookkeeping (timestamp + jittered wait)
    fn mark_open(&self, inner: &mut Inner) {
        let now = self.context.clock.now();
        let wait = recovery_wait(&self.context.config);
        if let Some(data) = inner.machine.open_data_mut() {
            data.opened_at = now;
            data.wait = wait;
        }
    }

    /// Bump the generation and log a state change; listeners are notified
    /// separately once the lock is released
    fn transitioned(&self, inner: &mut Inner, from: State, to: State) -> Transition<'_> {
        inner.generation = inner.generation.wrapping_add(1);
        let name = self.context.name.as_str();
        match to {
            State::Open => warn!(
                circuit = name,
                from = from.as_str(),
                failures = self.context.failures.value(),
                "circuit opened"
            ),
            State::HalfOpen => debug!(circuit = name, "circuit half-open, allowing trial call"),
            State::Closed => info!(circuit = name, "circuit closed"),
        }
        Transition {
            circuit: name,
            from,
            to,
            at: self.context.clock.now(),
        }
    }

    fn notify(&self, transition: Option<Transition<'_>>) {
        if let Some(transition) = transition {
            self.callbacks.dispatch(&transition);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state as last recorded
    ///
    /// An Open circuit whose timeout has elapsed still reports Open until the
    /// next `call` moves it to HalfOpen.
    pub fn state(&self) -> State {
        self.lock().state()
    }

    /// Check if circuit is open
    pub fn is_open(&self) -> bool {
        self.state() == State::Open
    }

    /// Check if circuit is closed
    pub fn is_closed(&self) -> bool {
        self.state() == State::Closed
    }

    pub fn is_half_open(&self) -> bool {
        self.state() == State::HalfOpen
    }

    /// Get current state name
    pub fn state_name(&self) -> &'static str {
        self.state().as_str()
    }

    pub fn consecutive_failures(&self) -> u32 {
        let _inner = self.lock();
        self.context.failures.value()
    }

    /// Clock reading when the circuit last tripped, while it is Open
    pub fn opened_at(&self) -> Option<Duration> {
        self.lock().machine.open_data().map(|data| data.opened_at)
    }

    /// Whether a HalfOpen trial call is currently running
    pub fn trial_in_flight(&self) -> bool {
        self.trial.is_in_flight()
    }

    pub fn name(&self) -> &str {
        &self.context.name
    }

    pub fn config(&self) -> &Config {
        &self.context.config
    }

    pub fn stats(&self) -> CircuitStats {
        let inner = self.lock();
        CircuitStats {
            state: inner.state(),
            consecutive_failures: self.context.failures.value(),
            successes: self.totals.successes.load(Ordering::Relaxed),
            failures: self.totals.failures.load(Ordering::Relaxed),
            rejections: self.totals.rejections.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.context.name)
            .field("state", &self.state())
            .field("config", &self.context.config)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}
