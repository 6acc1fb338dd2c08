//! Conversation and message types for Parley.
//!
//! A conversation is a titled, ordered log of messages owned by exactly one
//! user. Messages are tagged with a role (user or assistant) and are totally
//! ordered by `created_at` within their conversation; UUID v7 ids are
//! time-sortable, so equal timestamps break by insertion order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Placeholder title given to a conversation at creation, before the first
/// exchange derives a real one.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Role of a message within a conversation.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'assistant'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A conversation between one user and the assistant.
///
/// `updated_at` advances on every message append and on title changes, so
/// listing by `updated_at DESC` yields most-recently-active first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Conversation listing entry -- everything but the message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationSummary {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            title: c.title,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// A single message within a conversation. Content is immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// The result of one successful exchange: the persisted user message and
/// the assistant reply, appended as a pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePair {
    pub user_message: Message,
    pub assistant_message: Message,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_message_role_rejects_unknown() {
        assert!("system".parse::<MessageRole>().is_err());
        assert!("".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_message_role_serde() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let parsed: MessageRole = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(parsed, MessageRole::User);
    }

    #[test]
    fn test_conversation_summary_from_conversation() {
        let conversation = Conversation {
            id: Uuid::now_v7(),
            owner_id: "user-1".to_string(),
            title: DEFAULT_TITLE.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let summary: ConversationSummary = conversation.clone().into();
        assert_eq!(summary.id, conversation.id);
        assert_eq!(summary.title, "New Chat");
    }

    #[test]
    fn test_message_serialize_includes_role() {
        let message = Message {
            id: Uuid::now_v7(),
            conversation_id: Uuid::now_v7(),
            role: MessageRole::User,
            content: "Hello".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"role\":\"user\""));
    }
}
