use chrono::{DateTime, Utc};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Message;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Copy, Hash)]
#[serde(transparent)]
pub struct ConversationId(Uuid);

impl ConversationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(id: impl AsRef<str>) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(id.as_ref())?))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier issued by the identity provider. Used as the partition key in
/// the store; no local user record exists beyond it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An append-only sequence of messages; insertion order is chronological
/// order.
#[derive(Debug, Clone, Setters, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub messages: Vec<Message>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::generate(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn append(mut self, message: Message) -> Self {
        self.messages.push(message);
        self.updated_at = Utc::now();
        self
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::Role;

    #[test]
    fn test_conversation_wire_format_is_camel_case() {
        let conversation = Conversation::new();
        let value: serde_json::Value = serde_json::to_value(&conversation).unwrap();

        assert_eq!(
            value["createdAt"].as_i64().unwrap(),
            conversation.created_at.timestamp_millis()
        );
        assert_eq!(
            value["updatedAt"].as_i64().unwrap(),
            conversation.updated_at.timestamp_millis()
        );
        assert!(value["messages"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_append_preserves_insertion_order() {
        let conversation = Conversation::new()
            .append(Message::user("first"))
            .append(Message::assistant("second"))
            .append(Message::user("third"));

        let contents: Vec<&str> = conversation
            .messages
            .iter()
            .map(|message| message.content.as_str())
            .collect();

        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_append_bumps_updated_at() {
        let conversation = Conversation::new();
        let created_at = conversation.created_at;

        let conversation = conversation.append(Message::user("hello"));

        assert!(conversation.updated_at >= created_at);
        assert_eq!(conversation.last_message().unwrap().role, Role::User);
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        assert_ne!(ConversationId::generate(), ConversationId::generate());
    }

    #[test]
    fn test_conversation_id_parses_its_display_form() {
        let id = ConversationId::generate();
        let actual = ConversationId::parse(id.to_string()).unwrap();
        assert_eq!(actual, id);
    }
}
