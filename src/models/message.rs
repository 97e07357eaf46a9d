use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A chat message as exchanged with the Goose backend.
///
/// The streaming core never looks inside `content`: each entry is a content
/// block object (`{"type":"text","text":...}`, tool requests, tool responses,
/// ...) passed through as raw JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    #[serde(default)]
    pub id: Option<String>,
    pub role: Role,
    /// Unix timestamp in seconds
    pub created: i64,
    #[serde(default)]
    pub content: Vec<serde_json::Value>,
}

impl Message {
    /// Create a message with a fresh id and the current timestamp
    pub fn new(role: Role, content: Vec<serde_json::Value>) -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            role,
            created: Utc::now().timestamp(),
            content,
        }
    }

    /// A user message holding a single text block
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![text_block(text)])
    }

    /// An assistant message holding a single text block
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![text_block(text)])
    }

    /// Concatenated text of all `text` blocks, other blocks skipped
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
            .collect()
    }
}

fn text_block(text: impl Into<String>) -> serde_json::Value {
    serde_json::json!({ "type": "text", "text": text.into() })
}

/// Token accounting attached to `message` and `finish` events
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenState {
    #[serde(default)]
    pub input_tokens: Option<i64>,
    #[serde(default)]
    pub output_tokens: Option<i64>,
    #[serde(default)]
    pub total_tokens: Option<i64>,
    #[serde(default)]
    pub accumulated_input_tokens: Option<i64>,
    #[serde(default)]
    pub accumulated_output_tokens: Option<i64>,
    #[serde(default)]
    pub accumulated_total_tokens: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_shape() {
        let message = Message::user("Hello");
        assert_eq!(message.role, Role::User);
        assert!(message.id.is_some());
        assert!(message.created > 0);

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["text"], "Hello");
    }

    #[test]
    fn test_text_skips_non_text_blocks() {
        let message = Message {
            id: None,
            role: Role::Assistant,
            created: 0,
            content: vec![
                serde_json::json!({"type": "text", "text": "Let me check. "}),
                serde_json::json!({"type": "toolRequest", "id": "t1", "toolCall": {}}),
                serde_json::json!({"type": "text", "text": "Done."}),
            ],
        };
        assert_eq!(message.text(), "Let me check. Done.");
    }

    #[test]
    fn test_message_without_id_or_content_deserializes() {
        let message: Message =
            serde_json::from_str(r#"{"role":"assistant","created":1}"#).unwrap();
        assert!(message.id.is_none());
        assert!(message.content.is_empty());
    }

    #[test]
    fn test_token_state_camel_case() {
        let state: TokenState =
            serde_json::from_str(r#"{"inputTokens":5,"accumulatedTotalTokens":40}"#).unwrap();
        assert_eq!(state.input_tokens, Some(5));
        assert_eq!(state.accumulated_total_tokens, Some(40));
        assert_eq!(state.output_tokens, None);
    }
}
