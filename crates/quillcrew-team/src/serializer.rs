//! Flattening of run results into the wire types.
//!
//! These functions are total: a malformed message degrades to an inline
//! error string or an omitted field, never a failed response.

use serde_json::Value;

use quillcrew_types::{SerializedMessage, SerializedTaskResult};

use crate::message::{MessageBody, TaskResult, TeamMessage, UsageRecord};

/// Flatten one message. `source` and `metadata` are carried verbatim,
/// usage collapses to either null or exactly both token counts, and the
/// body serializes per its shape.
pub fn serialize_message(message: &TeamMessage) -> SerializedMessage {
    let content = match &message.body {
        MessageBody::Text(text) => Some(Value::String(text.clone())),
        MessageBody::Structured(value) => Some(value.clone()),
        MessageBody::Rendered(text) => Some(Value::String(text.clone())),
        MessageBody::Unextractable(reason) => Some(Value::String(format!(
            "[Error extracting content: {}]",
            reason
        ))),
        MessageBody::Empty => None,
    };

    SerializedMessage {
        source: message.source.clone(),
        models_usage: message.usage.as_ref().map(UsageRecord::flatten),
        metadata: message.metadata.clone(),
        content,
    }
}

/// Flatten a task result: the canonical ordered messages plus `stop_reason`.
pub fn serialize_task_result(result: &TaskResult) -> SerializedTaskResult {
    SerializedTaskResult {
        messages: result.messages.iter().map(serialize_message).collect(),
        stop_reason: result.stop_reason.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    use quillcrew_types::TokenUsage;

    fn message(source: &str, body: MessageBody) -> TeamMessage {
        TeamMessage {
            source: source.to_string(),
            usage: None,
            metadata: Map::new(),
            body,
        }
    }

    #[test]
    fn test_text_body_serializes_as_string() {
        let serialized =
            serialize_message(&message("creative_writer", MessageBody::Text("hi".into())));
        assert_eq!(serialized.source, "creative_writer");
        assert_eq!(serialized.content, Some(json!("hi")));
    }

    #[test]
    fn test_structured_body_kept_verbatim() {
        let serialized = serialize_message(&message(
            "technical_writer",
            MessageBody::Structured(json!({"outline": ["a", "b"]})),
        ));
        assert_eq!(serialized.content, Some(json!({"outline": ["a", "b"]})));
    }

    #[test]
    fn test_unextractable_body_degrades_to_inline_error() {
        let serialized = serialize_message(&message(
            "creative_writer",
            MessageBody::Unextractable("unsupported content part: image".into()),
        ));
        let content = serialized.content.unwrap();
        let text = content.as_str().unwrap();
        assert!(text.contains("Error extracting content"));
        assert!(text.contains("image"));
    }

    #[test]
    fn test_empty_body_omits_content() {
        let serialized = serialize_message(&message("selector", MessageBody::Empty));
        assert!(serialized.content.is_none());
        let json = serde_json::to_value(&serialized).unwrap();
        assert!(json.get("content").is_none());
    }

    #[test]
    fn test_usage_always_both_counts_or_null() {
        let mut msg = message("creative_writer", MessageBody::Text("x".into()));
        msg.usage = Some(UsageRecord::Raw {
            prompt_tokens: Some(7),
            completion_tokens: None,
        });
        let serialized = serialize_message(&msg);
        assert_eq!(serialized.models_usage, Some(TokenUsage::new(7, 0)));

        msg.usage = None;
        assert_eq!(serialize_message(&msg).models_usage, None);
    }

    #[test]
    fn test_task_result_carries_stop_reason_and_order() {
        let result = TaskResult {
            messages: vec![
                message("user", MessageBody::Text("task".into())),
                message("creative_writer", MessageBody::Text("reply".into())),
            ],
            stop_reason: Some("Text 'TERMINATE' mentioned".to_string()),
        };
        let serialized = serialize_task_result(&result);
        assert_eq!(serialized.messages.len(), 2);
        assert_eq!(serialized.messages[0].source, "user");
        assert_eq!(serialized.messages[1].source, "creative_writer");
        assert_eq!(
            serialized.stop_reason.as_deref(),
            Some("Text 'TERMINATE' mentioned")
        );
    }
}
