use super::Reply;
use crate::llm::ollama::{self, OllamaConfig};
use crate::llm::{ChatMessage, ChatRequest};
use serde_json::Value;

/// Forward a conversation to the chat endpoint and hand back whatever it answers.
pub async fn send_chat(
    config: &OllamaConfig,
    messages: Vec<ChatMessage>,
    model: &str,
    context: Option<Value>,
) -> Reply<Value> {
    let request = ChatRequest::new(model, messages).with_context(context);

    match ollama::chat(config, &request).await {
        Ok(response) => Reply::Ok(response),
        Err(e) => {
            tracing::error!("Error sending chat to Ollama: {}", e);
            Reply::error(format!("Error sending chat to Ollama: {}", e))
        }
    }
}
