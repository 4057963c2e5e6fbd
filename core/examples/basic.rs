//! Circuit breaker gateway in front of a flaky service
//!
//! Run with `RUST_LOG=debug` to see transition logs.

use breaker_gateway::{CallOutcome, CircuitBreaker, FallbackContext, FallbackDecorator};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Remote dependency that fails at a given rate after some latency
struct FlakyService {
    failure_rate: f64,
}

impl FlakyService {
    fn call(&self, request: &str) -> Result<String, String> {
        thread::sleep(Duration::from_millis(fastrand::u64(5..20)));
        if fastrand::f64() < self.failure_rate {
            Err(format!("service unavailable: {}", request))
        } else {
            Ok(format!("{} processed", request))
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Circuit Breaker Gateway Example ===\n");

    let circuit = Arc::new(
        CircuitBreaker::builder("payment_api")
            .failure_threshold(3)
            .recovery_timeout(Duration::from_millis(300))
            .on_open(|t| println!("Circuit '{}' opened", t.circuit))
            .on_half_open(|t| println!("Circuit '{}' half-open, testing...", t.circuit))
            .on_close(|t| println!("Circuit '{}' closed", t.circuit))
            .build()
            .expect("valid circuit config"),
    );

    println!("--- Failing dependency ---");
    let down = FlakyService { failure_rate: 1.0 };
    for i in 1..=5 {
        match circuit.call(|| down.call(&format!("Payment-{}", i))) {
            CallOutcome::Success(body) => println!("ok: {}", body),
            CallOutcome::Failure(err) => println!("failed: {}", err),
            CallOutcome::Rejected(reason) => println!("rejected: {}", reason),
        }
    }
    println!("State: {}\n", circuit.state_name());

    println!("--- Fallback while open ---");
    let gateway = FallbackDecorator::new(Arc::clone(&circuit), |ctx: FallbackContext<'_, String>| {
        format!("cached response ({:?})", ctx.cause)
    });
    println!("{}", gateway.call_with_fallback(|| down.call("Payment-6")));
    println!();

    println!("--- Recovery ---");
    thread::sleep(Duration::from_millis(350));
    let healthy = FlakyService { failure_rate: 0.0 };
    println!("{}", gateway.call_with_fallback(|| healthy.call("Payment-7")));
    println!("State: {}", circuit.state_name());

    let stats = circuit.stats();
    println!(
        "\nSuccesses: {}, failures: {}, rejections: {}",
        stats.successes, stats.failures, stats.rejections
    );
}
