// tests/config_loading.rs

use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::time::Duration;

use clap::Parser;
use tempfile::tempdir;

use agentdag::cli::CliArgs;
use agentdag::config::loader::default_workflow_path;
use agentdag::config::{GatewayConfig, load_and_validate, load_from_path, parse_json, parse_toml};
use agentdag::config::model::{DEFAULT_GATEWAY_URL, GATEWAY_TOKEN_ENV, GATEWAY_URL_ENV};
use agentdag::errors::{AgentdagError, ValidationError};
use agentdag::logging::resolve_level;
use agentdag::cli::LogLevel;
use agentdag::types::DispatchPolicy;
use agentdag::workflow::{DEFAULT_AGENT_TIMEOUT, OutputKind};

type TestResult = Result<(), Box<dyn Error>>;

const RESEARCH: &str = r#"
[workflow]
id = "research"
name = "Research pipeline"

[engine]
policy = "sequential"
default_timeout_ms = 5000

[gateway]
url = "http://gateway.local:18789/"
token = "t0ken"

[[agent]]
id = "collect"
prompt = "Collect sources"
timeout_ms = 1500

[[agent]]
id = "summarize"
name = "Summarizer"
prompt = "Summarize the collected sources"
depends_on = ["collect"]
output = "json"
"#;

#[test]
fn toml_file_loads_with_defaults_applied() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Agentdag.toml");
    fs::write(&path, RESEARCH)?;

    let file = load_and_validate(&path)?;

    assert_eq!(file.workflow.id, "research");
    assert_eq!(file.workflow.name, "Research pipeline");
    assert!(file.workflow.enabled);
    assert_eq!(file.engine.policy, DispatchPolicy::Sequential);
    assert_eq!(file.engine.max_concurrency, 4);

    let collect = file.workflow.agent("collect").unwrap();
    assert_eq!(collect.name, "collect");
    assert_eq!(collect.timeout, Duration::from_millis(1500));
    assert_eq!(collect.output_kind, OutputKind::Text);

    let summarize = file.workflow.agent("summarize").unwrap();
    assert_eq!(summarize.name, "Summarizer");
    assert_eq!(summarize.timeout, Duration::from_millis(5000));
    assert_eq!(summarize.depends_on, vec!["collect"]);
    assert_eq!(summarize.output_kind, OutputKind::Json);
    Ok(())
}

#[test]
fn minimal_toml_uses_engine_and_gateway_defaults() -> TestResult {
    let raw = parse_toml(
        r#"
        [workflow]
        id = "tiny"

        [[agent]]
        id = "only"
        prompt = "hello"
        "#,
    )?;

    assert_eq!(raw.engine.policy, DispatchPolicy::Parallel);
    assert_eq!(raw.gateway.url, DEFAULT_GATEWAY_URL);

    let workflow = raw.to_workflow();
    assert_eq!(workflow.name, "tiny");
    assert_eq!(workflow.agents[0].timeout, DEFAULT_AGENT_TIMEOUT);
    Ok(())
}

#[test]
fn zero_max_concurrency_is_a_config_error() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        r#"
        [workflow]
        id = "bad"

        [engine]
        max_concurrency = 0
        "#,
    )?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, AgentdagError::ConfigError(ref msg) if msg.contains("max_concurrency")));
    Ok(())
}

#[test]
fn non_http_gateway_is_a_config_error() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        r#"
        [workflow]
        id = "bad"

        [gateway]
        url = "ftp://nope"
        "#,
    )?;

    assert!(matches!(load_and_validate(&path), Err(AgentdagError::ConfigError(_))));
    Ok(())
}

#[test]
fn cyclic_toml_is_a_validation_error() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("cycle.toml");
    fs::write(
        &path,
        r#"
        [workflow]
        id = "loop"

        [[agent]]
        id = "A"
        prompt = "a"
        depends_on = ["B"]

        [[agent]]
        id = "B"
        prompt = "b"
        depends_on = ["A"]
        "#,
    )?;

    match load_and_validate(&path) {
        Err(AgentdagError::Validation(ValidationError::CycleDetected(ids))) => {
            assert_eq!(ids.len(), 2);
        }
        other => panic!("expected cycle error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn missing_prompt_is_a_validation_error() -> TestResult {
    let raw = parse_toml(
        r#"
        [workflow]
        id = "wf"

        [[agent]]
        id = "silent"
        "#,
    )?;

    match agentdag::config::WorkflowFile::try_from(raw) {
        Err(AgentdagError::Validation(ValidationError::EmptyPrompt(id))) => assert_eq!(id, "silent"),
        other => panic!("expected EmptyPrompt, got {other:?}"),
    }
    Ok(())
}

#[test]
fn malformed_toml_is_a_toml_error() {
    assert!(matches!(parse_toml("[workflow"), Err(AgentdagError::TomlError(_))));
}

#[test]
fn json_workflow_loads_by_extension() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("wf.json");
    fs::write(
        &path,
        r#"{
            "id": "wf-json",
            "name": "From the editor",
            "enabled": false,
            "agents": [
                { "id": "a", "name": "Alpha", "prompt": "go", "timeout": 2000 },
                { "id": "b", "name": "Beta", "prompt": "go on", "dependsOn": ["a"], "output": "file" }
            ]
        }"#,
    )?;

    let file = load_and_validate(&path)?;
    assert_eq!(file.workflow.id, "wf-json");
    assert!(!file.workflow.enabled);
    assert_eq!(file.workflow.agents[0].timeout, Duration::from_millis(2000));
    assert_eq!(file.workflow.agents[1].timeout, DEFAULT_AGENT_TIMEOUT);
    assert_eq!(file.workflow.agents[1].depends_on, vec!["a"]);
    assert_eq!(file.workflow.agents[1].output_kind, OutputKind::File);
    Ok(())
}

#[test]
fn json_with_unknown_dependency_is_refused() {
    let err = parse_json(
        r#"{ "id": "wf", "name": "wf", "agents": [
            { "id": "a", "name": "a", "prompt": "x", "dependsOn": ["zzz"] }
        ] }"#,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        AgentdagError::Validation(ValidationError::UnknownDependency { .. })
    ));
}

#[test]
fn gateway_overrides_replace_file_values() {
    let env: HashMap<&str, &str> = HashMap::from([
        (GATEWAY_URL_ENV, "https://override.example"),
        (GATEWAY_TOKEN_ENV, "env-token"),
    ]);

    let gateway = GatewayConfig::default()
        .with_overrides(|key| env.get(key).map(|v| v.to_string()));

    assert_eq!(gateway.url, "https://override.example");
    assert_eq!(gateway.token.as_deref(), Some("env-token"));
}

#[test]
fn blank_overrides_are_ignored() {
    let gateway = GatewayConfig {
        url: "http://file.example".to_string(),
        token: Some("file-token".to_string()),
        agent_id: None,
    }
    .with_overrides(|_| Some(String::new()));

    assert_eq!(gateway.url, "http://file.example");
    assert_eq!(gateway.token.as_deref(), Some("file-token"));
}

#[test]
fn log_level_prefers_cli_then_env() {
    assert_eq!(resolve_level(Some(LogLevel::Debug), Some("error")), tracing::Level::DEBUG);
    assert_eq!(resolve_level(None, Some("warn")), tracing::Level::WARN);
    assert_eq!(resolve_level(None, Some("bogus")), tracing::Level::INFO);
    assert_eq!(resolve_level(None, None), tracing::Level::INFO);
}

#[test]
fn dispatch_policy_parses_case_insensitively() {
    assert_eq!("Sequential".parse::<DispatchPolicy>(), Ok(DispatchPolicy::Sequential));
    assert_eq!(" parallel ".parse::<DispatchPolicy>(), Ok(DispatchPolicy::Parallel));
    assert!("fifo".parse::<DispatchPolicy>().is_err());
}

#[test]
fn load_from_path_reads_raw_toml_without_validating() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("raw.toml");
    fs::write(
        &path,
        r#"
        [workflow]
        id = "raw"

        [[agent]]
        id = "A"
        prompt = "a"
        depends_on = ["missing"]
        "#,
    )?;

    let raw = load_from_path(&path)?;
    assert_eq!(raw.workflow.id, "raw");
    assert_eq!(raw.agent[0].depends_on, vec!["missing"]);

    assert!(matches!(
        load_and_validate(&path),
        Err(AgentdagError::Validation(ValidationError::UnknownDependency { .. }))
    ));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, AgentdagError::IoError(_)));
}

#[test]
fn cli_defaults_to_workflow_in_current_dir() -> TestResult {
    let args = CliArgs::try_parse_from(["agentdag"])?;
    assert_eq!(args.workflow, default_workflow_path());
    assert_eq!(default_workflow_path().to_str(), Some("Agentdag.toml"));
    assert!(args.policy.is_none());
    assert!(!args.dry_run);

    let args = CliArgs::try_parse_from([
        "agentdag",
        "--workflow",
        "flows/research.json",
        "--policy",
        "sequential",
        "--max-concurrency",
        "2",
    ])?;
    assert_eq!(args.workflow.to_str(), Some("flows/research.json"));
    assert_eq!(args.policy, Some(DispatchPolicy::Sequential));
    assert_eq!(args.max_concurrency, Some(2));
    Ok(())
}
