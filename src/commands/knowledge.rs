use super::Reply;
use crate::config::{StoreSettings, COLLECTION_NAME};
use crate::db::models::{Metadata, StoredHit};
use crate::db::{StoreError, VectorStore};
use crate::embedding::get_embedding;
use crate::llm::ollama::OllamaConfig;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct QueryParams {
    pub query_text: String,
    pub db_path: PathBuf,
    pub embedding_model: String,
    pub n_results: usize,
    pub threshold: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct QueryHit {
    pub document: Option<String>,
    pub metadata: Option<Metadata>,
    pub similarity: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct QueryResults {
    pub results: Vec<QueryHit>,
    pub count: usize,
}

#[derive(Debug, thiserror::Error)]
enum QueryError {
    #[error("Failed to get embedding for query")]
    NoEmbedding,
    #[error("Collection not found: {0}")]
    CollectionNotFound(StoreError),
    #[error("Error querying vector store: {0}")]
    Store(#[from] StoreError),
}

/// Turn store distances into similarities and drop everything under `threshold`.
/// Store order is kept.
pub fn filter_hits(hits: Vec<StoredHit>, threshold: f64) -> Vec<QueryHit> {
    hits.into_iter()
        .map(|hit| QueryHit {
            document: hit.document,
            metadata: hit.metadata,
            similarity: 1.0 - hit.distance,
        })
        .filter(|hit| hit.similarity >= threshold)
        .collect()
}

async fn run_query(config: &OllamaConfig, params: &QueryParams) -> Result<QueryResults, QueryError> {
    let embedding = get_embedding(config, &params.query_text, &params.embedding_model)
        .await
        .filter(|embedding| !embedding.is_empty())
        .ok_or(QueryError::NoEmbedding)?;

    let store = VectorStore::open(&params.db_path, &StoreSettings::default())?;
    let collection = store
        .get_collection(COLLECTION_NAME)
        .map_err(QueryError::CollectionNotFound)?;

    let hits = store.query(&collection, &embedding, params.n_results)?;
    let results = filter_hits(hits, params.threshold);
    tracing::debug!(
        "{} of {} requested results passed threshold {}",
        results.len(),
        params.n_results,
        params.threshold
    );

    Ok(QueryResults {
        count: results.len(),
        results,
    })
}

/// Embed the query and search the document collection for similar passages.
pub async fn query_documents(config: &OllamaConfig, params: &QueryParams) -> Reply<QueryResults> {
    match run_query(config, params).await {
        Ok(results) => Reply::Ok(results),
        Err(e) => {
            tracing::warn!("{}", e);
            Reply::error(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{DistanceSpace, EmbeddingRecord, MetadataValue};
    use mockito::Server;
    use serde_json::json;

    fn hit(document: &str, distance: f64) -> StoredHit {
        StoredHit {
            id: document.to_string(),
            document: Some(document.to_string()),
            metadata: None,
            distance,
        }
    }

    fn params(db_path: PathBuf, threshold: f64) -> QueryParams {
        QueryParams {
            query_text: "what is rust".into(),
            db_path,
            embedding_model: "all-minilm".into(),
            n_results: 3,
            threshold,
        }
    }

    async fn serve_embedding(body: &str) -> (mockito::ServerGuard, mockito::Mock) {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;
        (server, mock)
    }

    #[test]
    fn test_filter_hits_threshold() {
        let hits = vec![hit("a", 0.1), hit("b", 0.3), hit("c", 0.5)];
        let kept = filter_hits(hits, 0.8);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].document.as_deref(), Some("a"));
        assert_eq!(kept[0].similarity, 1.0 - 0.1);
    }

    #[test]
    fn test_filter_hits_keeps_store_order() {
        let hits = vec![hit("a", 0.2), hit("b", 0.9), hit("c", 0.1), hit("d", 0.25)];
        let kept = filter_hits(hits, 0.7);
        let docs: Vec<_> = kept.iter().map(|h| h.document.as_deref().unwrap()).collect();
        assert_eq!(docs, vec!["a", "c", "d"]);
        assert!(kept.iter().all(|h| h.similarity >= 0.7));
    }

    #[test]
    fn test_filter_hits_out_of_range_distance_not_clamped() {
        let kept = filter_hits(vec![hit("far", 1.5)], -1.0);
        assert_eq!(kept[0].similarity, 1.0 - 1.5);
    }

    #[tokio::test]
    async fn test_no_embedding_skips_store() {
        let (server, _mock) = serve_embedding(r#"{"error":"no model"}"#).await;
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("db");

        let reply = query_documents(&OllamaConfig::new(server.url()), &params(db_path.clone(), 0.5)).await;
        assert_eq!(reply, Reply::error("Failed to get embedding for query"));
        assert!(!db_path.exists());
    }

    #[tokio::test]
    async fn test_empty_embedding_is_a_failure() {
        let (server, _mock) = serve_embedding(r#"{"embedding":[]}"#).await;
        let dir = tempfile::tempdir().unwrap();

        let reply =
            query_documents(&OllamaConfig::new(server.url()), &params(dir.path().join("db"), 0.5)).await;
        assert_eq!(reply, Reply::error("Failed to get embedding for query"));
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let (server, _mock) = serve_embedding(r#"{"embedding":[1.0,0.0]}"#).await;
        let dir = tempfile::tempdir().unwrap();

        let reply =
            query_documents(&OllamaConfig::new(server.url()), &params(dir.path().join("db"), 0.5)).await;
        match reply {
            Reply::Err(e) => {
                assert!(e.error.starts_with("Collection not found: "));
                assert!(e.error.contains(COLLECTION_NAME));
            }
            Reply::Ok(results) => panic!("expected an error, got {results:?}"),
        }
    }

    #[tokio::test]
    async fn test_query_end_to_end() {
        let (server, _mock) = serve_embedding(r#"{"embedding":[1.0,0.0]}"#).await;
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("db");
        {
            let mut store = VectorStore::open(&db_path, &StoreSettings::default()).unwrap();
            let collection = store
                .create_collection(COLLECTION_NAME, DistanceSpace::Cosine)
                .unwrap();
            let mut meta = Metadata::new();
            meta.insert("source".into(), MetadataValue::Str("intro.md".into()));
            store
                .add(
                    &collection,
                    &[
                        EmbeddingRecord::new(vec![0.0, 1.0]).document("unrelated"),
                        EmbeddingRecord::new(vec![1.0, 0.0]).document("exact").metadata(meta),
                        EmbeddingRecord::new(vec![0.6, 0.8]).document("partial"),
                    ],
                )
                .unwrap();
        }

        let reply = query_documents(&OllamaConfig::new(server.url()), &params(db_path, 0.5)).await;
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["count"], json!(2));
        assert_eq!(value["results"][0]["document"], json!("exact"));
        assert_eq!(value["results"][0]["metadata"], json!({"source": "intro.md"}));
        assert_eq!(value["results"][1]["document"], json!("partial"));
        let similarity = value["results"][1]["similarity"].as_f64().unwrap();
        assert!((similarity - 0.6).abs() < 1e-5);
    }
}
