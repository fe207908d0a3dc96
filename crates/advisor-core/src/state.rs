//! UI-agnostic chat state types
//!
//! These are shared between the turn controller, the in-memory message log
//! and whichever front end draws the conversation.

use serde::{Deserialize, Serialize};

/// A message shown in the chat list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Who a chat message is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Label shown in front of the message text.
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "User",
            ChatRole::Assistant => "Assistant",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "user" => Some(ChatRole::User),
            "assistant" => Some(ChatRole::Assistant),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_labels_round_trip() {
        for role in [ChatRole::User, ChatRole::Assistant] {
            assert_eq!(ChatRole::from_label(role.label()), Some(role));
        }
    }

    #[test]
    fn test_from_label_ignores_case() {
        assert_eq!(ChatRole::from_label("ASSISTANT"), Some(ChatRole::Assistant));
        assert_eq!(ChatRole::from_label("system"), None);
    }
}
