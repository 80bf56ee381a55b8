use axum::{
    extract::{Path, State},
    response::{Html, Json},
    routing::get,
    Router,
};
use std::sync::Arc;

use quillcrew_team::{serialize_task_result, team_file_from_env, TeamRunner};
use quillcrew_types::{Envelope, TaskResultData};

/// Application state shared across routes
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<dyn TeamRunner>,
}

/// Create router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/predict/:task", get(predict))
        .route("/", get(serve_index))
        .with_state(state)
}

/// GET /predict/{task} - Run the writing team on a task
///
/// Always answers 200 with an envelope. Configuration and orchestration
/// failures land in the `status: false` path, never in a transport-level
/// error.
async fn predict(State(state): State<AppState>, Path(task): Path<String>) -> Json<Envelope> {
    Json(run_predict(state.runner.as_ref(), &task).await)
}

async fn run_predict(runner: &dyn TeamRunner, task: &str) -> Envelope {
    let team_file = match team_file_from_env() {
        Ok(path) => path,
        Err(e) => return Envelope::failure(e.to_string()),
    };

    let result = match runner.run(task, &team_file).await {
        Ok(result) => result,
        Err(e) => return Envelope::failure(e.to_string()),
    };

    let data = TaskResultData {
        task_result: serialize_task_result(&result.task_result),
        usage: result.usage,
        duration: result.duration,
    };

    match serde_json::to_value(data) {
        Ok(data) => Envelope::ok(data),
        Err(e) => Envelope::failure(e.to_string()),
    }
}

/// GET / - Serve the browser UI page
async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../../web/index.html"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Map};
    use std::sync::Mutex;
    use tower::util::ServiceExt;

    use quillcrew_team::{MessageBody, RunResult, TaskResult, TeamError, TeamMessage};
    use quillcrew_types::TEAM_FILE_ENV;

    // Tests in this module mutate the team-file env var; serialize them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct FixedRunner(RunResult);

    #[async_trait]
    impl quillcrew_team::TeamRunner for FixedRunner {
        async fn run(&self, _task: &str, _team_config: &str) -> Result<RunResult, TeamError> {
            Ok(self.0.clone())
        }
    }

    struct FailingRunner(String);

    #[async_trait]
    impl quillcrew_team::TeamRunner for FailingRunner {
        async fn run(&self, _task: &str, _team_config: &str) -> Result<RunResult, TeamError> {
            Err(TeamError::Orchestration(self.0.clone()))
        }
    }

    fn writer_message(source: &str, text: &str) -> TeamMessage {
        TeamMessage {
            source: source.to_string(),
            usage: None,
            metadata: Map::new(),
            body: MessageBody::Text(text.to_string()),
        }
    }

    fn sample_run() -> RunResult {
        RunResult {
            task_result: TaskResult {
                messages: vec![
                    writer_message("user", "Describe a futuristic city"),
                    writer_message("creative_writer", "Neon rivers over glass towers TERMINATE"),
                    writer_message("technical_writer", "Population: 4M. Transit: maglev."),
                ],
                stop_reason: Some("Text 'TERMINATE' mentioned".to_string()),
            },
            usage: json!(""),
            duration: 2.25,
        }
    }

    async fn request_envelope(runner: Arc<dyn TeamRunner>, uri: &str) -> (StatusCode, Envelope) {
        let app = create_router(AppState { runner });
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_predict_flattens_run_result() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(TEAM_FILE_ENV, "team.json");

        let (status, envelope) = request_envelope(
            Arc::new(FixedRunner(sample_run())),
            "/predict/Describe%20a%20futuristic%20city",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(envelope.status);
        assert_eq!(envelope.message, "Task successfully completed");

        let data = envelope.data.unwrap();
        let messages = &data["task_result"]["messages"];
        assert_eq!(messages.as_array().unwrap().len(), 3);
        assert_eq!(messages[1]["source"], "creative_writer");
        assert_eq!(messages[2]["source"], "technical_writer");
        assert_eq!(data["task_result"]["stop_reason"], "Text 'TERMINATE' mentioned");
        assert_eq!(data["duration"], 2.25);
    }

    #[tokio::test]
    async fn test_predict_maps_orchestration_failure_to_envelope() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(TEAM_FILE_ENV, "team.json");

        let (status, envelope) = request_envelope(
            Arc::new(FailingRunner("model provider unavailable".to_string())),
            "/predict/anything",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(!envelope.status);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.message, "model provider unavailable");
    }

    #[tokio::test]
    async fn test_predict_reports_missing_team_file() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var(TEAM_FILE_ENV);

        let (status, envelope) =
            request_envelope(Arc::new(FixedRunner(sample_run())), "/predict/anything").await;

        assert_eq!(status, StatusCode::OK);
        assert!(!envelope.status);
        assert!(envelope.data.is_none());
        assert!(envelope.message.contains("not set"));
    }

    #[tokio::test]
    async fn test_predict_end_to_end_replies_in_source_order() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(TEAM_FILE_ENV, "team.json");

        let (_, envelope) = request_envelope(
            Arc::new(FixedRunner(sample_run())),
            "/predict/Describe%20a%20futuristic%20city",
        )
        .await;

        let data = envelope.data.unwrap();
        let (messages, _) = quillcrew_render::locate_messages(&data).unwrap();
        let replies = quillcrew_render::extract_agent_replies(&messages);

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].agent.display_name(), "Creative Writer");
        assert_eq!(
            replies[0].text.as_deref(),
            Some("Neon rivers over glass towers")
        );
        assert_eq!(replies[1].agent.display_name(), "Technical Writer");
        assert_eq!(
            replies[1].text.as_deref(),
            Some("Population: 4M. Transit: maglev.")
        );
    }
}
