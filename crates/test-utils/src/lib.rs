//! Shared helpers for agentdag's integration tests: workflow builders, a
//! scripted executor standing in for the gateway, and tracing setup.

pub mod builders;
pub mod fake_executor;

use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Install a test-scoped tracing subscriber once per test binary.
///
/// Output goes through the harness's captured writer, so engine logs
/// (dispatches, state transitions, cancellations) show up only for failing
/// tests. `RUST_LOG=agentdag=debug` narrows it to the engine.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if a run doesn't settle within `limit`.
pub async fn within<F, T>(limit: Duration, f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(limit, f)
        .await
        .unwrap_or_else(|_| panic!("run did not settle within {limit:?}"))
}
