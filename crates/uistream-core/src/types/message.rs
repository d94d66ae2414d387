use serde::{Deserialize, Serialize};

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One message of the conversation history sent by the browser.
///
/// This is the inbound half of the HTTP contract; the relay only ever
/// reads the latest user `content` to pick the subject of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_uses_lowercase_tags() {
        let message = ConversationMessage::user("list parts for an engine");
        let json = serde_json::to_value(&message).expect("serialize");
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "list parts for an engine");
    }

    #[test]
    fn deserializes_from_wire_shape() {
        let message: ConversationMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"hi"}"#).expect("deserialize");
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, "hi");
    }
}
