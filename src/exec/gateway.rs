// src/exec/gateway.rs

//! HTTP executor backed by the agent gateway.
//!
//! Each agent task becomes one `POST /api/sessions/spawn` call. The gateway
//! answers either `{ sessionKey, message }` or `{ error }`; non-2xx replies
//! carry the status and raw body.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::errors::ExecutorError;
use crate::exec::backend::{ExecuteFuture, TaskExecutor, TaskOutput, TaskRequest};

const SPAWN_PATH: &str = "/api/sessions/spawn";
const STATUS_PATH: &str = "/api/session/status";
const HISTORY_PATH: &str = "/api/sessions/history";
const HISTORY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpawnRequest<'a> {
    task: &'a str,
    label: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent_id: Option<&'a str>,
    timeout_seconds: u64,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct SpawnResponse {
    #[serde(default)]
    session_key: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Executor that spawns one gateway session per agent task.
#[derive(Debug, Clone)]
pub struct GatewayExecutor {
    http: Client,
    base_url: String,
    token: Option<String>,
    backend_agent: Option<String>,
}

impl GatewayExecutor {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
            backend_agent: config.agent_id.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Reachability check. Any transport error or non-2xx reply is `false`.
    pub async fn health(&self) -> bool {
        let url = format!("{}{}", self.base_url, STATUS_PATH);
        match self.authorized(self.http.get(&url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                debug!(url = %url, error = %err, "gateway health check failed");
                false
            }
        }
    }

    /// Raw message history for a spawned session.
    pub async fn session_history(
        &self,
        session_key: &str,
        limit: usize,
    ) -> Result<serde_json::Value, ExecutorError> {
        let url = format!("{}{}", self.base_url, HISTORY_PATH);
        let limit = limit.to_string();
        let resp = self
            .authorized(self.http.get(&url))
            .timeout(HISTORY_TIMEOUT)
            .query(&[("sessionKey", session_key), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|err| classify(err, HISTORY_TIMEOUT))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ExecutorError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .await
            .map_err(|err| classify(err, HISTORY_TIMEOUT))
    }

    async fn spawn(&self, request: TaskRequest) -> Result<TaskOutput, ExecutorError> {
        let url = format!("{}{}", self.base_url, SPAWN_PATH);
        let label = if request.label.is_empty() {
            request.agent_id.as_str()
        } else {
            request.label.as_str()
        };
        let body = SpawnRequest {
            task: &request.prompt,
            label,
            agent_id: self.backend_agent.as_deref(),
            timeout_seconds: request.timeout.as_secs_f64().ceil() as u64,
        };

        debug!(agent = %request.agent_id, url = %url, "spawning gateway session");

        let resp = self
            .authorized(self.http.post(&url))
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| classify(err, request.timeout))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|err| classify(err, request.timeout))?;

        if !status.is_success() {
            warn!(agent = %request.agent_id, status = status.as_u16(), "gateway rejected spawn");
            return Err(ExecutorError::Backend {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_spawn_response(status, &text)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.header(reqwest::header::AUTHORIZATION, token),
            None => builder,
        }
    }
}

/// A reqwest timeout, whether hit while sending or while reading the body,
/// is a `Timeout`; anything else is a transport failure.
fn classify(err: reqwest::Error, timeout: Duration) -> ExecutorError {
    if err.is_timeout() {
        ExecutorError::Timeout(timeout)
    } else {
        ExecutorError::from(err)
    }
}

fn parse_spawn_response(status: StatusCode, text: &str) -> Result<TaskOutput, ExecutorError> {
    let parsed: SpawnResponse = serde_json::from_str(text).map_err(|e| ExecutorError::Backend {
        status: status.as_u16(),
        body: format!("unparseable spawn response ({e}): {text}"),
    })?;

    if let Some(error) = parsed.error {
        return Err(ExecutorError::Rejected(error));
    }

    Ok(TaskOutput {
        session_key: parsed.session_key,
        message: parsed.message,
    })
}

impl TaskExecutor for GatewayExecutor {
    fn execute(&self, request: TaskRequest) -> ExecuteFuture<'_> {
        Box::pin(self.spawn(request))
    }
}
