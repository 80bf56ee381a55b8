//! The seam to the external orchestration engine.
//!
//! `TeamRunner` is the single operation this repository needs from the
//! engine: run a team on a task and hand back the result. `StudioClient`
//! is the production implementation, speaking the engine's HTTP API.

use async_trait::async_trait;
use std::env;
use thiserror::Error;

use quillcrew_types::{DEFAULT_ENGINE_URL, ENGINE_URL_ENV, TEAM_FILE_ENV};

use crate::message::{RawRunResult, RunResult};

/// Failures visible at the engine boundary. Everything the engine itself
/// reports (model-provider failures, timeouts, malformed team config) maps
/// to `Orchestration` with the engine's text passed through verbatim.
#[derive(Debug, Error)]
pub enum TeamError {
    #[error("{0} environment variable is not set")]
    Configuration(&'static str),
    #[error("{0}")]
    Orchestration(String),
}

/// Read the team-configuration reference from the process environment.
/// Checked per request, so the variable can be set after startup.
pub fn team_file_from_env() -> Result<String, TeamError> {
    env::var(TEAM_FILE_ENV).map_err(|_| TeamError::Configuration(TEAM_FILE_ENV))
}

/// Runs a team on a task. The engine call may take as long as the engine
/// allows; no retries or local timeout are imposed here.
#[async_trait]
pub trait TeamRunner: Send + Sync {
    async fn run(&self, task: &str, team_config: &str) -> Result<RunResult, TeamError>;
}

/// HTTP client for the studio engine.
pub struct StudioClient {
    base_url: String,
    client: reqwest::Client,
}

impl StudioClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Engine URL from the environment, falling back to the local default.
    pub fn from_env() -> Self {
        let base_url =
            env::var(ENGINE_URL_ENV).unwrap_or_else(|_| DEFAULT_ENGINE_URL.to_string());
        Self::new(base_url)
    }

    fn run_url(&self) -> String {
        format!("{}/api/teams/run", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TeamRunner for StudioClient {
    async fn run(&self, task: &str, team_config: &str) -> Result<RunResult, TeamError> {
        let response = self
            .client
            .post(self.run_url())
            .json(&serde_json::json!({
                "task": task,
                "team_config": team_config,
            }))
            .send()
            .await
            .map_err(|e| TeamError::Orchestration(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TeamError::Orchestration(error_text));
        }

        let raw: RawRunResult = response
            .json()
            .await
            .map_err(|e| TeamError::Orchestration(format!("invalid engine response: {}", e)))?;

        Ok(raw.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// One-shot HTTP responder on an ephemeral port.
    async fn canned_engine(status_line: &'static str, body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 8192];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_run_parses_engine_result() {
        let base = canned_engine(
            "200 OK",
            r#"{"task_result":{"messages":[{"source":"creative_writer","content":"A tale"}],"stop_reason":"done"},"usage":"","duration":1.5}"#,
        )
        .await;

        let result = StudioClient::new(base).run("a task", "team.json").await.unwrap();
        assert_eq!(result.task_result.messages.len(), 1);
        assert_eq!(result.task_result.messages[0].source, "creative_writer");
        assert_eq!(result.task_result.stop_reason.as_deref(), Some("done"));
        assert_eq!(result.duration, 1.5);
    }

    #[tokio::test]
    async fn test_run_surfaces_engine_error_text_verbatim() {
        let base = canned_engine("500 Internal Server Error", "team config invalid").await;

        let err = StudioClient::new(base).run("a task", "team.json").await.unwrap_err();
        match err {
            TeamError::Orchestration(text) => assert_eq!(text, "team config invalid"),
            other => panic!("expected Orchestration, got {:?}", other),
        }
    }

    #[test]
    fn test_configuration_error_message_names_variable() {
        let err = TeamError::Configuration(TEAM_FILE_ENV);
        let text = err.to_string();
        assert!(text.contains("QUILLCREW_TEAM_FILE"));
        assert!(text.contains("not set"));
    }
}
