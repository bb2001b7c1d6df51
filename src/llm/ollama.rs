use super::{ChatRequest, LlmError};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
}

impl OllamaConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Option<Vec<f32>>,
}

async fn check_status(resp: Response) -> Result<Response, LlmError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(LlmError::Api {
            status,
            message: text,
        });
    }
    Ok(resp)
}

/// List the models installed on the server (`GET /api/tags`). Entries are returned untouched.
pub async fn list_models(config: &OllamaConfig) -> Result<Vec<Value>, LlmError> {
    let client = Client::new();
    let resp = client.get(config.endpoint("/api/tags")).send().await?;
    let text = check_status(resp).await?.text().await?;

    let body: Value = serde_json::from_str(&text).map_err(|e| LlmError::Parse(e.to_string()))?;
    let models = match body {
        Value::Object(mut map) => map.remove("models"),
        _ => None,
    };
    let models = models.ok_or(LlmError::UnexpectedFormat(text))?;

    serde_json::from_value(models).map_err(|e| LlmError::Parse(e.to_string()))
}

/// Embed a single prompt (`POST /api/embeddings`).
pub async fn embeddings(
    config: &OllamaConfig,
    model: &str,
    prompt: &str,
) -> Result<Vec<f32>, LlmError> {
    let client = Client::new();
    let body = EmbeddingRequest { model, prompt };

    let resp = client
        .post(config.endpoint("/api/embeddings"))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;
    let text = check_status(resp).await?.text().await?;

    let data: EmbeddingResponse =
        serde_json::from_str(&text).map_err(|e| LlmError::Parse(e.to_string()))?;
    data.embedding.ok_or(LlmError::UnexpectedFormat(text))
}

/// Non-streaming chat completion (`POST /api/chat`). The response body is returned as-is.
pub async fn chat(config: &OllamaConfig, request: &ChatRequest) -> Result<Value, LlmError> {
    let client = Client::new();

    let resp = client
        .post(config.endpoint("/api/chat"))
        .header("Content-Type", "application/json")
        .json(request)
        .send()
        .await?;

    let data: Value = check_status(resp).await?.json().await?;
    Ok(data)
}
