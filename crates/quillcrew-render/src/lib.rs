//! Response rendering logic for quillcrew clients
//!
//! Everything here is pure: locating the message sequence inside a response
//! payload, extracting the writer agents' replies despite the several
//! nesting shapes the payload may arrive in, classifying fetch outcomes,
//! and the small state machine the UI drives. Both the browser UI and the
//! terminal client build on this crate.

use serde_json::Value;
use thiserror::Error;

use quillcrew_types::{Envelope, WriterAgent, TERMINATE_SENTINEL};

// ============================================================================
// Message Normalization
// ============================================================================

/// Accept either an ordered array or a map keyed by stringified indices and
/// return an ordered sequence. All-integer keys order numerically, other
/// maps fall back to plain key order, and unrecognized shapes yield an
/// empty sequence rather than failing.
pub fn normalize_messages(raw: &Value) -> Vec<Value> {
    match raw {
        Value::Array(items) => items.clone(),
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            if entries.iter().all(|(key, _)| key.parse::<u64>().is_ok()) {
                entries.sort_by_key(|(key, _)| key.parse::<u64>().unwrap_or(0));
            } else {
                entries.sort_by(|a, b| a.0.cmp(b.0));
            }
            entries.into_iter().map(|(_, value)| value.clone()).collect()
        }
        _ => Vec::new(),
    }
}

// ============================================================================
// Reply Extraction
// ============================================================================

/// Candidate fields searched for displayable text, in priority order.
/// First match wins; there is no merging across fields.
const CONTENT_FIELDS: [&str; 5] = ["content", "text", "message", "output", "response"];

/// One writer agent's reply. `text` is None when no content field matched
/// or the content cleaned to nothing; the entry is still emitted so the
/// caller can render a diagnostic instead of silently dropping the turn.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub agent: WriterAgent,
    pub text: Option<String>,
    pub raw: Value,
}

/// Pull the writer agents' replies out of a message collection, in order.
/// Sources outside the writer allow-list (the user, the selector) are
/// skipped, as are entries that are not message objects.
pub fn extract_agent_replies(messages: &Value) -> Vec<AgentReply> {
    let mut replies = Vec::new();

    for msg in normalize_messages(messages) {
        if !msg.is_object() {
            continue;
        }

        let source = msg.get("source").and_then(Value::as_str).unwrap_or("");
        let agent = match WriterAgent::from_source(source) {
            Some(agent) => agent,
            None => continue,
        };

        let content = find_content(&msg);
        let text = content.and_then(clean_content);

        replies.push(AgentReply {
            agent,
            text,
            raw: msg,
        });
    }

    replies
}

/// Search the fixed field list, then metadata.content / metadata.text.
fn find_content(msg: &Value) -> Option<&Value> {
    for field in CONTENT_FIELDS {
        if let Some(value) = msg.get(field) {
            return Some(value);
        }
    }

    let metadata = msg.get("metadata")?.as_object()?;
    metadata.get("content").or_else(|| metadata.get("text"))
}

/// Stringify structured content, strip the termination sentinel, and trim.
/// Empty results become None.
fn clean_content(content: &Value) -> Option<String> {
    let text = match content {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let cleaned = text.replace(TERMINATE_SENTINEL, "").trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Collect the distinct `source` values present in a message collection,
/// for the "no writer responses" diagnostic.
pub fn message_sources(messages: &Value) -> Vec<String> {
    let mut sources = Vec::new();
    for msg in normalize_messages(messages) {
        if let Some(source) = msg.get("source").and_then(Value::as_str) {
            if !sources.iter().any(|s| s == source) {
                sources.push(source.to_string());
            }
        }
    }
    sources
}

// ============================================================================
// Message Location
// ============================================================================

/// Find the message sequence inside a successful envelope's `data` payload.
/// Checks `task_result.messages`, then `messages`, then the first key whose
/// name contains "message". Returns the collection together with a location
/// label for diagnostics.
pub fn locate_messages(data: &Value) -> Option<(Value, String)> {
    if let Some(messages) = data.get("task_result").and_then(|tr| tr.get("messages")) {
        return Some((messages.clone(), "data.task_result.messages".to_string()));
    }

    if let Some(messages) = data.get("messages") {
        return Some((messages.clone(), "data.messages".to_string()));
    }

    if let Some(map) = data.as_object() {
        for (key, value) in map {
            if key.to_lowercase().contains("message") {
                return Some((value.clone(), format!("data.{}", key)));
            }
        }
    }

    None
}

// ============================================================================
// Outcome Classification
// ============================================================================

/// Terminal failure modes of a single renderer interaction. Each maps to a
/// distinct user-visible message; none is ever folded into a generic one.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("connection failed: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected status code {0}")]
    Status(u16),
    #[error("unparsable payload: {0}")]
    Payload(String),
    #[error("no recognizable message field")]
    ContentLocation,
}

impl FetchError {
    /// The message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Transport(details) => {
                format!("Could not connect to the API. Details: {}", details)
            }
            FetchError::Timeout => {
                "The request to the AI team timed out. Please try again.".to_string()
            }
            FetchError::Status(code) => {
                format!("API returned error status code: {}", code)
            }
            FetchError::Payload(_) => {
                "Could not parse JSON from the API (even after a simple fix).".to_string()
            }
            FetchError::ContentLocation => {
                "Could not locate messages in the API response.".to_string()
            }
        }
    }
}

/// Replace the known malformed-null literal. This is the single, narrow
/// repair attempted before giving up on a payload.
pub fn repair_payload(raw: &str) -> String {
    raw.replace("NULL", "null")
}

/// Parse a response body into an envelope, retrying once on the repaired
/// text before classifying the payload as unparsable.
pub fn parse_envelope(body: &str) -> Result<Envelope, FetchError> {
    match serde_json::from_str(body) {
        Ok(envelope) => Ok(envelope),
        Err(_) => serde_json::from_str(&repair_payload(body))
            .map_err(|e| FetchError::Payload(e.to_string())),
    }
}

/// Build the request path for a task, escaping it as a single URL path
/// segment.
pub fn predict_url(base_url: &str, task: &str) -> String {
    format!(
        "{}/predict/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(task)
    )
}

// ============================================================================
// Fetch State Machine
// ============================================================================

/// UI-held request state. One request is in flight at a time; submission is
/// locked until the current request resolves. There is no cancellation.
#[derive(Debug, Clone, Default)]
pub enum FetchState {
    #[default]
    Idle,
    InFlight,
    Succeeded(Envelope),
    Failed(String),
}

impl FetchState {
    /// Whether a new request may be submitted in this state.
    pub fn can_submit(&self) -> bool {
        !matches!(self, FetchState::InFlight)
    }

    /// Begin a request. Returns false (and stays put) if one is already in
    /// flight; the previous outcome is discarded otherwise.
    pub fn begin(&mut self) -> bool {
        if !self.can_submit() {
            return false;
        }
        *self = FetchState::InFlight;
        true
    }

    /// Resolve the in-flight request with a parsed envelope. Ignored unless
    /// a request is actually in flight.
    pub fn succeed(&mut self, envelope: Envelope) {
        if matches!(self, FetchState::InFlight) {
            *self = FetchState::Succeeded(envelope);
        }
    }

    /// Resolve the in-flight request with a failure message. Ignored unless
    /// a request is actually in flight.
    pub fn fail(&mut self, message: impl Into<String>) {
        if matches!(self, FetchState::InFlight) {
            *self = FetchState::Failed(message.into());
        }
    }

    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            FetchState::Succeeded(envelope) => Some(envelope),
            _ => None,
        }
    }
}
