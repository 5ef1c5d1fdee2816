use derive_setters::Setters;
use serde::{Deserialize, Serialize};

use crate::ConversationId;

/// Terminal sentinel pushed after the last chunk of a streamed reply.
pub const DONE_MARKER: &str = "[DONE]";

/// One chat turn as submitted by the client. An absent `chat_id` asks the
/// gateway to create the conversation implicitly.
#[derive(Debug, Clone, Serialize, Deserialize, Setters)]
#[setters(into, strip_option)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<ConversationId>,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            chat_id: None,
        }
    }
}

/// Events emitted by the gateway while a reply streams.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChatResponse {
    Text(String),
    Done,
}

/// Wire frame for a single streamed chunk: `data: {"text": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatChunk {
    pub text: String,
}

impl ChatChunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Error payload that crosses the HTTP boundary as `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Errata {
    #[serde(rename = "error")]
    pub message: String,
}

impl Errata {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Errata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_chat_request_uses_camel_case_chat_id() {
        let id = ConversationId::generate();
        let request = ChatRequest::new("hello").chat_id(id);

        let value: serde_json::Value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["prompt"], "hello");
        assert_eq!(value["chatId"], id.to_string());
    }

    #[test]
    fn test_chat_request_accepts_absent_chat_id() {
        let request: ChatRequest = serde_json::from_str(r#"{"prompt": "hi"}"#).unwrap();
        assert_eq!(request.chat_id, None);
        assert_eq!(request.prompt, "hi");
    }

    #[test]
    fn test_chunk_wire_format() {
        let actual = serde_json::to_string(&ChatChunk::new("Hel")).unwrap();
        assert_eq!(actual, r#"{"text":"Hel"}"#);
    }

    #[test]
    fn test_errata_wire_format() {
        let actual = serde_json::to_string(&Errata::new("Prompt is required")).unwrap();
        assert_eq!(actual, r#"{"error":"Prompt is required"}"#);
    }
}
