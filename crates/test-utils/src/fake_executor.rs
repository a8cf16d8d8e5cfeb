use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentdag::errors::ExecutorError;
use agentdag::exec::{ExecuteFuture, TaskExecutor, TaskOutput, TaskRequest};

#[derive(Debug, Clone)]
struct Behaviour {
    outcome: Result<String, ExecutorError>,
    delay: Duration,
    hang: bool,
    panic: bool,
}

/// A fake executor that:
/// - records which agents were "run", in call order
/// - answers from a per-agent script (default: succeed with `"ok-<id>"`)
/// - tracks the peak number of concurrent calls
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    scripts: HashMap<String, Behaviour>,
    default_delay: Duration,
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, id: &str) -> &mut Behaviour {
        self.scripts.entry(id.to_string()).or_insert_with(|| Behaviour {
            outcome: Ok(format!("ok-{id}")),
            delay: Duration::ZERO,
            hang: false,
            panic: false,
        })
    }

    pub fn succeed(mut self, id: &str, message: &str) -> Self {
        self.entry(id).outcome = Ok(message.to_string());
        self
    }

    pub fn fail(mut self, id: &str, error: ExecutorError) -> Self {
        self.entry(id).outcome = Err(error);
        self
    }

    pub fn delay(mut self, id: &str, delay: Duration) -> Self {
        self.entry(id).delay = delay;
        self
    }

    /// Never resolve calls for `id`.
    pub fn hang(mut self, id: &str) -> Self {
        self.entry(id).hang = true;
        self
    }

    /// Panic inside calls for `id`.
    pub fn panic(mut self, id: &str) -> Self {
        self.entry(id).panic = true;
        self
    }

    /// Delay applied to agents without their own delay.
    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Agent ids in the order `execute` was called.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the call is dropped.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TaskExecutor for ScriptedExecutor {
    fn execute(&self, request: TaskRequest) -> ExecuteFuture<'_> {
        let behaviour = self.scripts.get(&request.agent_id).cloned().unwrap_or(Behaviour {
            outcome: Ok(format!("ok-{}", request.agent_id)),
            delay: Duration::ZERO,
            hang: false,
            panic: false,
        });
        let delay = if behaviour.delay.is_zero() {
            self.default_delay
        } else {
            behaviour.delay
        };

        Box::pin(async move {
            self.calls.lock().unwrap().push(request.agent_id.clone());

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let _guard = InFlightGuard(Arc::clone(&self.in_flight));

            if behaviour.hang {
                std::future::pending::<()>().await;
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if behaviour.panic {
                panic!("scripted panic in agent {}", request.agent_id);
            }

            behaviour.outcome.map(|message| TaskOutput {
                session_key: Some(format!("session-{}", request.agent_id)),
                message: Some(message),
            })
        })
    }
}
