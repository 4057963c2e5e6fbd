//! Simulated remote dependencies shared by the integration tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError(pub String);

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "service unavailable: {}", self.0)
    }
}

impl std::error::Error for ServiceError {}

/// Dependency that fails at a configurable rate, seeded for reproducibility.
pub struct UnstableService {
    failure_rate: Mutex<f64>,
    rng: Mutex<fastrand::Rng>,
    latency: Duration,
    calls: AtomicUsize,
}

impl UnstableService {
    pub fn new(failure_rate: f64, seed: u64) -> Self {
        Self {
            failure_rate: Mutex::new(failure_rate),
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    #[allow(dead_code)]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[allow(dead_code)]
    pub fn set_failure_rate(&self, rate: f64) {
        *self.failure_rate.lock().unwrap() = rate;
    }

    pub fn call(&self, request: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        let rate = *self.failure_rate.lock().unwrap();
        if self.rng.lock().unwrap().f64() < rate {
            return Err(ServiceError(request.to_string()));
        }
        Ok(format!("SUCCESS: {} processed", request))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Dependency whose single in-flight call blocks until released.
#[allow(dead_code)]
#[derive(Default)]
pub struct GatedService {
    released: AtomicBool,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl GatedService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until `release` is called or `deadline` passes.
    pub fn call(&self, deadline: Duration) -> Result<&'static str, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let start = std::time::Instant::now();
        while !self.released.load(Ordering::SeqCst) {
            if start.elapsed() > deadline {
                return Err(ServiceError("gate never released".to_string()));
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok("trial ok")
    }

    pub fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}
