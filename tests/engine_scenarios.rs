// tests/engine_scenarios.rs

use std::error::Error;
use std::sync::Arc;

use futures::StreamExt;
use tokio::time::{Duration, timeout};

use agentdag::config::EngineConfig;
use agentdag::engine::Engine;
use agentdag::errors::{ExecutorError, ValidationError};
use agentdag::workflow::{AgentStatus, FailureKind, WorkflowExecution, WorkflowStatus};
use agentdag_test_utils::builders::{AgentBuilder, WorkflowBuilder};
use agentdag_test_utils::fake_executor::ScriptedExecutor;
use agentdag_test_utils::{init_tracing, within};

type TestResult = Result<(), Box<dyn Error>>;

fn engine(exec: &Arc<ScriptedExecutor>, config: EngineConfig) -> Engine<ScriptedExecutor> {
    Engine::from_arc(Arc::clone(exec), config)
}

/// Statuses an agent went through across a run's snapshots, with repeats
/// collapsed.
fn status_path(history: &[Arc<WorkflowExecution>], agent: &str) -> Vec<AgentStatus> {
    let mut path: Vec<AgentStatus> = Vec::new();
    for snapshot in history {
        let status = snapshot.result(agent).expect("agent in snapshot").status;
        if path.last() != Some(&status) {
            path.push(status);
        }
    }
    path
}

#[tokio::test]
async fn one_success_one_failure_is_partial() -> TestResult {
    init_tracing();

    let exec = Arc::new(ScriptedExecutor::new().fail("B", ExecutorError::Rejected("boom".into())));
    let wf = WorkflowBuilder::new("wf").task("A", &[]).task("B", &["A"]).build();

    let handle = engine(&exec, EngineConfig::default()).submit(&wf)?;
    let result = timeout(Duration::from_secs(3), handle.wait()).await??;

    assert_eq!(result.status, WorkflowStatus::Partial);

    let a = result.result("A").unwrap();
    assert_eq!(a.status, AgentStatus::Completed);
    assert_eq!(a.output.as_deref(), Some("ok-A"));
    assert_eq!(a.session_key.as_deref(), Some("session-A"));
    assert!(a.duration.is_some());

    let b = result.result("B").unwrap();
    assert_eq!(b.status, AgentStatus::Failed);
    assert_eq!(b.error.as_deref(), Some("boom"));
    assert_eq!(b.error_kind, Some(FailureKind::Rejected));

    assert!(result.end_time.is_some());
    assert!(result.total_duration.is_some());
    Ok(())
}

#[tokio::test]
async fn panicking_executor_fails_agent_and_finishes_run() -> TestResult {
    init_tracing();

    let exec = Arc::new(ScriptedExecutor::new().panic("A").succeed("C", "c done"));
    let wf = WorkflowBuilder::new("wf")
        .task("A", &[])
        .task("B", &["A"])
        .task("C", &[])
        .build();

    let handle = engine(&exec, EngineConfig::default()).submit(&wf)?;
    let last = within(Duration::from_secs(3), handle.subscribe().last())
        .await
        .expect("terminal snapshot");
    assert!(last.is_terminal());

    let result = handle.wait().await?;
    assert_eq!(result.status, WorkflowStatus::Partial);

    let a = result.result("A").unwrap();
    assert_eq!(a.status, AgentStatus::Failed);
    assert_eq!(a.error_kind, Some(FailureKind::Panicked));
    assert!(a.error.as_deref().unwrap().contains("scripted panic in agent A"));

    let b = result.result("B").unwrap();
    assert_eq!(b.error_kind, Some(FailureKind::BlockedByDependency));
    let c = result.result("C").unwrap();
    assert_eq!(c.status, AgentStatus::Completed);
    assert_eq!(c.output.as_deref(), Some("c done"));

    let mut calls = exec.calls();
    calls.sort();
    assert_eq!(calls, vec!["A", "C"]);
    Ok(())
}

#[tokio::test]
async fn failed_dependency_blocks_dependent_without_running_it() -> TestResult {
    init_tracing();

    let exec = Arc::new(ScriptedExecutor::new().fail("A", ExecutorError::Rejected("nope".into())));
    let wf = WorkflowBuilder::new("wf").task("A", &[]).task("B", &["A"]).build();

    let handle = engine(&exec, EngineConfig::default()).submit(&wf)?;
    let history: Vec<_> = timeout(Duration::from_secs(3), handle.subscribe().into_stream().collect::<Vec<_>>())
        .await?;
    let result = handle.wait().await?;

    assert_eq!(result.status, WorkflowStatus::Failed);
    assert_eq!(exec.calls(), vec!["A"]);

    let b = result.result("B").unwrap();
    assert_eq!(b.error_kind, Some(FailureKind::BlockedByDependency));
    assert!(b.error.as_deref().unwrap().contains("`A`"));
    assert_eq!(status_path(&history, "B"), vec![AgentStatus::Pending, AgentStatus::Failed]);
    Ok(())
}

#[tokio::test]
async fn dependencies_run_before_dependents() -> TestResult {
    init_tracing();

    let exec = Arc::new(ScriptedExecutor::new().with_default_delay(Duration::from_millis(10)));
    let wf = WorkflowBuilder::new("diamond")
        .task("d", &["b", "c"])
        .task("b", &["a"])
        .task("c", &["a"])
        .task("a", &[])
        .build();

    let handle = engine(&exec, EngineConfig::parallel(4)).submit(&wf)?;
    let result = timeout(Duration::from_secs(3), handle.wait()).await??;

    assert_eq!(result.status, WorkflowStatus::Completed);
    let calls = exec.calls();
    let pos = |id: &str| calls.iter().position(|c| c == id).unwrap();
    assert_eq!(pos("a"), 0);
    assert!(pos("b") < pos("d"));
    assert!(pos("c") < pos("d"));

    let ids: Vec<_> = result.results.iter().map(|r| r.agent_id.as_str()).collect();
    assert_eq!(ids, vec!["d", "b", "c", "a"], "results keep declared order");
    Ok(())
}

#[tokio::test]
async fn sequential_policy_never_overlaps() -> TestResult {
    init_tracing();

    let exec = Arc::new(ScriptedExecutor::new().with_default_delay(Duration::from_millis(20)));
    let wf = WorkflowBuilder::new("wf")
        .task("x", &[])
        .task("y", &[])
        .task("z", &[])
        .build();

    let handle = engine(&exec, EngineConfig::sequential()).submit(&wf)?;
    let result = timeout(Duration::from_secs(3), handle.wait()).await??;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(exec.calls(), vec!["x", "y", "z"]);
    assert_eq!(exec.max_in_flight(), 1);
    Ok(())
}

#[tokio::test]
async fn parallel_policy_is_bounded() -> TestResult {
    init_tracing();

    let exec = Arc::new(ScriptedExecutor::new().with_default_delay(Duration::from_millis(30)));
    let mut wf = WorkflowBuilder::new("wide");
    for i in 0..6 {
        wf = wf.task(&format!("t{i}"), &[]);
    }

    let handle = engine(&exec, EngineConfig::parallel(2)).submit(&wf.build())?;
    let result = timeout(Duration::from_secs(3), handle.wait()).await??;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(exec.calls().len(), 6);
    assert!(exec.max_in_flight() <= 2, "saw {} in flight", exec.max_in_flight());
    Ok(())
}

#[tokio::test]
async fn empty_workflow_completes_immediately() -> TestResult {
    init_tracing();

    let exec = Arc::new(ScriptedExecutor::new());
    let wf = WorkflowBuilder::new("empty").build();

    let handle = engine(&exec, EngineConfig::default()).submit(&wf)?;
    let result = within(Duration::from_secs(3), handle.wait()).await?;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert!(result.results.is_empty());
    assert!(result.end_time.is_some());
    assert!(exec.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn statuses_only_move_forward() -> TestResult {
    init_tracing();

    let exec = Arc::new(
        ScriptedExecutor::new()
            .with_default_delay(Duration::from_millis(5))
            .fail("b", ExecutorError::Backend { status: 500, body: "oops".into() }),
    );
    let wf = WorkflowBuilder::new("wf")
        .task("a", &[])
        .task("b", &["a"])
        .task("c", &["a"])
        .task("d", &["b"])
        .build();

    let handle = engine(&exec, EngineConfig::default()).submit(&wf)?;
    let history: Vec<_> = timeout(Duration::from_secs(3), handle.subscribe().into_stream().collect::<Vec<_>>())
        .await?;

    assert!(history.last().unwrap().is_terminal());
    assert!(history[..history.len() - 1].iter().all(|s| !s.is_terminal()));

    for agent in ["a", "b", "c", "d"] {
        let path = status_path(&history, agent);
        assert_eq!(path.first(), Some(&AgentStatus::Pending));
        for pair in path.windows(2) {
            assert!(pair[0].can_become(pair[1]), "{agent}: {:?} -> {:?}", pair[0], pair[1]);
        }
    }

    let last = history.last().unwrap();
    assert_eq!(last.status, WorkflowStatus::Partial);
    assert_eq!(last.result("b").unwrap().error_kind, Some(FailureKind::Backend));
    assert_eq!(status_path(&history, "d"), vec![AgentStatus::Pending, AgentStatus::Failed]);
    Ok(())
}

#[tokio::test]
async fn late_subscribers_see_the_same_terminal_snapshot() -> TestResult {
    init_tracing();

    let exec = Arc::new(ScriptedExecutor::new());
    let wf = WorkflowBuilder::new("wf").task("A", &[]).build();

    let handle = engine(&exec, EngineConfig::default()).submit(&wf)?;
    let first = timeout(Duration::from_secs(3), handle.subscribe().last())
        .await?
        .expect("terminal snapshot");
    assert!(handle.is_finished());

    let mut late = handle.subscribe_latest();
    let again = late.next().await.expect("terminal snapshot again");
    assert_eq!(*again, *first);
    assert!(late.next().await.is_none());

    let replay = handle.subscribe().into_stream().collect::<Vec<_>>().await;
    assert_eq!(replay.first().unwrap().status, WorkflowStatus::Running);
    assert_eq!(*replay.last().unwrap().as_ref(), *first);

    let result = handle.wait().await?;
    assert_eq!(result, *first);
    Ok(())
}

#[tokio::test]
async fn slow_agent_times_out() -> TestResult {
    init_tracing();

    let exec = Arc::new(ScriptedExecutor::new().hang("slow"));
    let wf = WorkflowBuilder::new("wf")
        .with_agent(AgentBuilder::new("slow").timeout(Duration::from_millis(50)).build())
        .task("after", &["slow"])
        .build();

    let handle = engine(&exec, EngineConfig::default()).submit(&wf)?;
    let result = timeout(Duration::from_secs(3), handle.wait()).await??;

    let slow = result.result("slow").unwrap();
    assert_eq!(slow.status, AgentStatus::Failed);
    assert_eq!(slow.error_kind, Some(FailureKind::Timeout));
    assert_eq!(slow.error.as_deref(), Some("timed out after 50ms"));
    assert_eq!(
        result.result("after").unwrap().error_kind,
        Some(FailureKind::BlockedByDependency)
    );
    assert_eq!(result.status, WorkflowStatus::Failed);
    Ok(())
}

#[tokio::test]
async fn cancel_fails_unfinished_agents() -> TestResult {
    init_tracing();

    let exec = Arc::new(ScriptedExecutor::new().hang("slow"));
    let wf = WorkflowBuilder::new("wf")
        .task("fast", &[])
        .task("slow", &["fast"])
        .task("last", &["slow"])
        .build();

    let handle = engine(&exec, EngineConfig::default()).submit(&wf)?;

    let mut sub = handle.subscribe();
    timeout(Duration::from_secs(3), async {
        while let Some(snapshot) = sub.next().await {
            if snapshot.result("slow").unwrap().status == AgentStatus::Running {
                break;
            }
        }
    })
    .await?;

    handle.cancel();
    let result = timeout(Duration::from_secs(3), handle.wait()).await??;

    assert_eq!(result.status, WorkflowStatus::Partial);
    assert_eq!(result.result("fast").unwrap().status, AgentStatus::Completed);
    for id in ["slow", "last"] {
        let r = result.result(id).unwrap();
        assert_eq!(r.status, AgentStatus::Failed);
        assert_eq!(r.error_kind, Some(FailureKind::Cancelled));
    }
    assert_eq!(exec.calls(), vec!["fast", "slow"]);
    assert_eq!(exec.max_in_flight(), 1);
    Ok(())
}

#[tokio::test]
async fn submit_refuses_cycles_before_dispatch() -> TestResult {
    init_tracing();

    let exec = Arc::new(ScriptedExecutor::new());
    let wf = WorkflowBuilder::new("wf")
        .task("ok", &[])
        .task("A", &["B"])
        .task("B", &["A"])
        .build();

    let err = engine(&exec, EngineConfig::default())
        .submit(&wf)
        .expect_err("cycle must be refused");
    assert!(matches!(err, ValidationError::CycleDetected(_)));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(exec.calls().is_empty());
    Ok(())
}
