pub mod ollama;

use crate::config::ChatOptions;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A chat turn. Fields other than `role` and `content` are carried through untouched.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            extra: Map::new(),
        }
    }
}

/// Typed view of one entry of the server's model listing.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ModelRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub options: ChatOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
            options: ChatOptions::default(),
            context: None,
        }
    }

    /// Attach a prior context. Empty values are dropped so the field is omitted.
    pub fn with_context(mut self, context: Option<Value>) -> Self {
        self.context = context.filter(context_is_present);
        self
    }
}

/// Whether a replayed chat context carries anything worth sending.
pub fn context_is_present(context: &Value) -> bool {
    match context {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Unexpected response format - {0}")]
    UnexpectedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_message_keeps_extra_fields() {
        let msg: ChatMessage =
            serde_json::from_value(json!({"role": "user", "content": "hi", "images": ["abc"]}))
                .unwrap();
        assert_eq!(msg.role, "user");
        assert_eq!(msg.extra.get("images"), Some(&json!(["abc"])));
        let back = serde_json::to_value(&msg).unwrap();
        assert_eq!(back, json!({"role": "user", "content": "hi", "images": ["abc"]}));
    }

    #[test]
    fn test_context_presence() {
        assert!(!context_is_present(&Value::Null));
        assert!(!context_is_present(&json!([])));
        assert!(!context_is_present(&json!("")));
        assert!(!context_is_present(&json!({})));
        assert!(!context_is_present(&json!(0)));
        assert!(context_is_present(&json!([1, 2, 3])));
        assert!(context_is_present(&json!({"k": "v"})));
    }

    #[test]
    fn test_chat_request_omits_missing_context() {
        let request = ChatRequest::new("llama3", vec![ChatMessage::new("user", "hello")])
            .with_context(Some(json!([])));
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("context").is_none());
        assert_eq!(body["stream"], json!(false));
        assert_eq!(body["options"]["num_ctx"], json!(16384));
    }

    #[test]
    fn test_chat_request_forwards_context_verbatim() {
        let request = ChatRequest::new("llama3", vec![ChatMessage::new("user", "hello")])
            .with_context(Some(json!([101, 202, 303])));
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["context"], json!([101, 202, 303]));
    }

    #[test]
    fn test_model_record_without_name() {
        let record: ModelRecord = serde_json::from_value(json!({"size": 12})).unwrap();
        assert!(record.name.is_none());
        assert_eq!(record.details.get("size"), Some(&json!(12)));
    }
}
