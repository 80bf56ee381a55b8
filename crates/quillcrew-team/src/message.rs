//! Canonical message model for engine run results.
//!
//! The engine reports messages in loosely-typed JSON: content may live in
//! different fields, usage records come in three shapes, and the message
//! collection is either an ordered array or a map keyed by stringified
//! indices. All of that ambiguity is resolved here, at the ingestion
//! boundary, so downstream code only ever sees one ordered, tagged form.

use serde::Deserialize;
use serde_json::{Map, Value};

use quillcrew_types::TokenUsage;

// ============================================================================
// Canonical Types
// ============================================================================

/// One agent turn, in canonical form.
#[derive(Debug, Clone)]
pub struct TeamMessage {
    /// Agent identifier, carried verbatim from the engine
    pub source: String,
    pub usage: Option<UsageRecord>,
    pub metadata: Map<String, Value>,
    pub body: MessageBody,
}

/// The displayable payload of a message.
///
/// Variants mirror the fallback order the engine's exports require: direct
/// content first, then a plain-text view, with explicit cases for extraction
/// failure and for messages that expose nothing displayable at all.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    /// Direct plain-text content
    Text(String),
    /// Direct non-string content, kept verbatim
    Structured(Value),
    /// No direct content; taken from a text-rendering view
    Rendered(String),
    /// Content extraction failed; carries the reason
    Unextractable(String),
    /// Nothing displayable
    Empty,
}

/// A usage record, in whichever of the three shapes the engine exported it.
#[derive(Debug, Clone, PartialEq)]
pub enum UsageRecord {
    /// Fully-typed export with both counts present
    Structured(TokenUsage),
    /// Generic map export; counts pulled by name
    Export(Map<String, Value>),
    /// Bare attributes, possibly missing
    Raw {
        prompt_tokens: Option<u64>,
        completion_tokens: Option<u64>,
    },
}

impl UsageRecord {
    /// Collapse to the wire shape: always exactly both counts, missing
    /// values default to zero. Never partially populated.
    pub fn flatten(&self) -> TokenUsage {
        match self {
            UsageRecord::Structured(usage) => *usage,
            UsageRecord::Export(map) => TokenUsage::new(
                map.get("prompt_tokens").and_then(Value::as_u64).unwrap_or(0),
                map.get("completion_tokens")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
            ),
            UsageRecord::Raw {
                prompt_tokens,
                completion_tokens,
            } => TokenUsage::new(prompt_tokens.unwrap_or(0), completion_tokens.unwrap_or(0)),
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Object(map) => {
                let prompt = map.get("prompt_tokens").and_then(Value::as_u64);
                let completion = map.get("completion_tokens").and_then(Value::as_u64);
                match (prompt, completion) {
                    (Some(p), Some(c)) => Some(UsageRecord::Structured(TokenUsage::new(p, c))),
                    _ => Some(UsageRecord::Export(map)),
                }
            }
            // Anything else is an attribute bag we can't read counts from
            _ => Some(UsageRecord::Raw {
                prompt_tokens: None,
                completion_tokens: None,
            }),
        }
    }
}

/// Aggregated run outcome: ordered messages plus why the run ended.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub messages: Vec<TeamMessage>,
    pub stop_reason: Option<String>,
}

/// Full result of one orchestration run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub task_result: TaskResult,
    pub usage: Value,
    pub duration: f64,
}

// ============================================================================
// Wire Format (engine JSON)
// ============================================================================

/// A message as the engine reports it, before canonicalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub models_usage: Option<Value>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub model_text: Option<String>,
}

/// Engine message collections arrive as either an ordered array or a map
/// keyed by stringified indices.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawMessageLog {
    Ordered(Vec<RawMessage>),
    Indexed(Map<String, Value>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTaskResult {
    #[serde(default = "empty_log")]
    pub messages: RawMessageLog,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

fn empty_log() -> RawMessageLog {
    RawMessageLog::Ordered(Vec::new())
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRunResult {
    pub task_result: RawTaskResult,
    #[serde(default)]
    pub usage: Value,
    #[serde(default)]
    pub duration: f64,
}

// ============================================================================
// Ingestion
// ============================================================================

impl From<RawMessage> for TeamMessage {
    fn from(raw: RawMessage) -> Self {
        let body = extract_body(raw.content, raw.text, raw.model_text);
        TeamMessage {
            source: raw.source,
            usage: raw.models_usage.and_then(UsageRecord::from_value),
            metadata: raw.metadata.unwrap_or_default(),
            body,
        }
    }
}

/// Resolve the displayable payload, preserving the fallback order:
/// direct content, then the plain-text view, then the model-facing view.
fn extract_body(
    content: Option<Value>,
    text: Option<String>,
    model_text: Option<String>,
) -> MessageBody {
    match content {
        Some(Value::String(s)) => MessageBody::Text(s),
        Some(value) => {
            if let Some(parts) = value.get("parts").and_then(Value::as_array) {
                return match flatten_parts(parts) {
                    Ok(text) => MessageBody::Text(text),
                    Err(reason) => MessageBody::Unextractable(reason),
                };
            }
            MessageBody::Structured(value)
        }
        None => match text.or(model_text) {
            Some(rendered) => MessageBody::Rendered(rendered),
            None => MessageBody::Empty,
        },
    }
}

/// Join the text parts of a multimodal payload. A part the adapter cannot
/// render as text fails the whole payload, which degrades to an inline
/// error string downstream rather than failing the response.
fn flatten_parts(parts: &[Value]) -> Result<String, String> {
    let mut pieces = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            Value::String(s) => pieces.push(s.as_str()),
            Value::Object(map) => match map.get("text").and_then(Value::as_str) {
                Some(s) => pieces.push(s),
                None => {
                    let kind = map
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown");
                    return Err(format!("unsupported content part: {}", kind));
                }
            },
            other => return Err(format!("unsupported content part: {}", type_name(other))),
        }
    }
    Ok(pieces.join("\n"))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl RawMessageLog {
    /// Canonicalize to an ordered sequence. Indexed maps order by the
    /// numeric value of the key when every key is an integer; otherwise
    /// they fall back to plain lexicographic key order. Entries that are
    /// not message objects are dropped.
    pub fn into_ordered(self) -> Vec<TeamMessage> {
        match self {
            RawMessageLog::Ordered(messages) => {
                messages.into_iter().map(TeamMessage::from).collect()
            }
            RawMessageLog::Indexed(map) => {
                let mut entries: Vec<(String, Value)> = map.into_iter().collect();
                if entries.iter().all(|(key, _)| key.parse::<u64>().is_ok()) {
                    entries.sort_by_key(|(key, _)| key.parse::<u64>().unwrap_or(0));
                } else {
                    entries.sort_by(|a, b| a.0.cmp(&b.0));
                }
                entries
                    .into_iter()
                    .filter_map(|(_, value)| serde_json::from_value::<RawMessage>(value).ok())
                    .map(TeamMessage::from)
                    .collect()
            }
        }
    }
}

impl From<RawTaskResult> for TaskResult {
    fn from(raw: RawTaskResult) -> Self {
        TaskResult {
            messages: raw.messages.into_ordered(),
            stop_reason: raw.stop_reason,
        }
    }
}

impl From<RawRunResult> for RunResult {
    fn from(raw: RawRunResult) -> Self {
        RunResult {
            task_result: raw.task_result.into(),
            usage: raw.usage,
            duration: raw.duration,
        }
    }
}
