use super::Reply;
use crate::llm::ollama::{self, OllamaConfig};
use crate::llm::{LlmError, ModelRecord};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ModelListing {
    Names(Vec<String>),
    Details(Vec<Value>),
}

impl ModelListing {
    pub fn len(&self) -> usize {
        match self {
            ModelListing::Names(names) => names.len(),
            ModelListing::Details(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ModelList {
    pub models: ModelListing,
    pub count: usize,
}

fn reshape(records: Vec<Value>, include_details: bool) -> Result<ModelListing, LlmError> {
    if include_details {
        return Ok(ModelListing::Details(records));
    }
    records
        .into_iter()
        .map(|record| {
            serde_json::from_value::<ModelRecord>(record)
                .map_err(|e| LlmError::Parse(e.to_string()))?
                .name
                .ok_or_else(|| LlmError::Parse("model record without a name".into()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(ModelListing::Names)
}

/// List the server's models, either as names or as full records.
pub async fn get_models(config: &OllamaConfig, include_details: bool) -> Reply<ModelList> {
    let listing = ollama::list_models(config)
        .await
        .and_then(|records| reshape(records, include_details));

    match listing {
        Ok(models) => Reply::Ok(ModelList {
            count: models.len(),
            models,
        }),
        Err(LlmError::UnexpectedFormat(body)) => {
            tracing::error!("Error: Unexpected response format - {}", body);
            Reply::error("Unexpected response format")
        }
        Err(e) => {
            tracing::error!("Error getting models: {}", e);
            Reply::error(format!("Error getting models: {}", e))
        }
    }
}
