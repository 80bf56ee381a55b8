//! Core types and structures for quillcrew
//!
//! This crate provides the wire-level types shared between the serving
//! adapter, the response renderer, and the browser UI.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Constants
// ============================================================================

/// Environment variable naming the team-configuration source.
/// Absence is a request-time failure, not a startup failure.
pub const TEAM_FILE_ENV: &str = "QUILLCREW_TEAM_FILE";

/// Environment variable for the orchestration engine base URL
pub const ENGINE_URL_ENV: &str = "QUILLCREW_ENGINE_URL";

/// Default base URL of the orchestration engine
pub const DEFAULT_ENGINE_URL: &str = "http://127.0.0.1:8081";

/// Default bind address of the quillcrew API
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8084";

/// Literal token the team emits to signal end-of-conversation;
/// stripped before display.
pub const TERMINATE_SENTINEL: &str = "TERMINATE";

/// Client-side timeout for a single /predict request, in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

// ============================================================================
// Writer Agents
// ============================================================================

/// The two writer agents whose output is surfaced to the end user.
///
/// This is a closed allow-list, not an inferred one: the user's own
/// message and the selector agent's turns never reach the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriterAgent {
    TechnicalWriter,
    CreativeWriter,
}

impl WriterAgent {
    /// Map a message `source` identifier to a writer agent, if it is one.
    pub fn from_source(source: &str) -> Option<Self> {
        match source {
            "technical_writer" => Some(WriterAgent::TechnicalWriter),
            "creative_writer" => Some(WriterAgent::CreativeWriter),
            _ => None,
        }
    }

    pub fn source_id(&self) -> &'static str {
        match self {
            WriterAgent::TechnicalWriter => "technical_writer",
            WriterAgent::CreativeWriter => "creative_writer",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WriterAgent::TechnicalWriter => "Technical Writer",
            WriterAgent::CreativeWriter => "Creative Writer",
        }
    }
}

// ============================================================================
// Token Usage
// ============================================================================

/// Token-count record attached to a message.
///
/// Always carries both counts; a message with no usage record serializes
/// `models_usage` as null instead of a partially populated mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }
}

// ============================================================================
// Flattened Run Result
// ============================================================================

/// One flattened message turn, as it travels over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedMessage {
    pub source: String,
    pub models_usage: Option<TokenUsage>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Omitted entirely when the message exposes nothing displayable
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content: Option<Value>,
}

/// Flattened task result: the ordered message sequence plus the reason
/// the run ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedTaskResult {
    pub messages: Vec<SerializedMessage>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// The `data` payload of a successful envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResultData {
    pub task_result: SerializedTaskResult,
    #[serde(default)]
    pub usage: Value,
    #[serde(default)]
    pub duration: f64,
}

// ============================================================================
// Response Envelope
// ============================================================================

/// Top-level JSON response for /predict/{task}.
///
/// `data` is present if and only if `status` is true; on failure `message`
/// carries the error text. `data` stays loosely typed on purpose: clients
/// must tolerate missing or relocated fields inside it, so they probe the
/// JSON rather than deserialize a fixed shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub message: String,
    pub status: bool,
    #[serde(default)]
    pub data: Option<Value>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self {
            message: "Task successfully completed".to_string(),
            status: true,
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: false,
            data: None,
        }
    }
}
