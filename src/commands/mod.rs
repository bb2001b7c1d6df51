pub mod chat;
pub mod knowledge;
pub mod models;

use crate::config::{DEFAULT_N_RESULTS, DEFAULT_SIMILARITY_THRESHOLD};
use crate::llm::ollama::OllamaConfig;
use crate::llm::ChatMessage;
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// Uniform failure payload.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ErrorResult {
    pub error: String,
}

/// What every command prints: its success payload or `{"error": ...}`.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Reply<T> {
    Ok(T),
    Err(ErrorResult),
}

impl<T> Reply<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Reply::Err(ErrorResult {
            error: message.into(),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Err(_))
    }
}

#[derive(Debug, Parser)]
#[command(name = "ai-bridge", version, about = "Bridge to a local Ollama server and vector store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search the document collection for passages similar to a query
    Query {
        #[arg(allow_hyphen_values = true)]
        query_text: String,
        db_path: PathBuf,
        embedding_model: String,
        base_url: String,
        #[arg(default_value_t = DEFAULT_N_RESULTS)]
        n_results: usize,
        #[arg(default_value_t = DEFAULT_SIMILARITY_THRESHOLD, allow_negative_numbers = true)]
        threshold: f64,
    },
    /// Relay a chat completion request
    Chat {
        /// JSON array of {role, content} messages
        #[arg(allow_hyphen_values = true)]
        messages_json: String,
        #[arg(allow_hyphen_values = true)]
        model: String,
        /// Context from a previous response, or `null`
        #[arg(allow_hyphen_values = true)]
        context_json: String,
        base_url: String,
    },
    /// List models installed on the server
    Models {
        base_url: String,
        /// `true` to return full model records instead of names
        include_details: Option<String>,
    },
}

/// Run one command and render its reply as a single JSON line.
///
/// Operation failures are part of the reply; only malformed arguments return `Err`.
pub async fn dispatch(command: Command) -> anyhow::Result<String> {
    let output = match command {
        Command::Query {
            query_text,
            db_path,
            embedding_model,
            base_url,
            n_results,
            threshold,
        } => {
            let params = knowledge::QueryParams {
                query_text,
                db_path,
                embedding_model,
                n_results,
                threshold,
            };
            let reply = knowledge::query_documents(&OllamaConfig::new(base_url), &params).await;
            serde_json::to_string(&reply)?
        }
        Command::Chat {
            messages_json,
            model,
            context_json,
            base_url,
        } => {
            let messages: Vec<ChatMessage> =
                serde_json::from_str(&messages_json).context("invalid messages JSON")?;
            let context = parse_context(&context_json)?;
            let reply =
                chat::send_chat(&OllamaConfig::new(base_url), messages, &model, context).await;
            serde_json::to_string(&reply)?
        }
        Command::Models {
            base_url,
            include_details,
        } => {
            let include_details = include_details
                .map(|flag| flag.eq_ignore_ascii_case("true"))
                .unwrap_or(false);
            let reply = models::get_models(&OllamaConfig::new(base_url), include_details).await;
            serde_json::to_string(&reply)?
        }
    };
    Ok(output)
}

fn parse_context(context_json: &str) -> anyhow::Result<Option<Value>> {
    if context_json.is_empty() || context_json == "null" {
        return Ok(None);
    }
    let context = serde_json::from_str(context_json).context("invalid context JSON")?;
    Ok(Some(context))
}
