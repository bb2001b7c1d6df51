pub mod models;

use crate::config::StoreSettings;
use crate::embedding::{
    bytes_to_embedding, cosine_distance, embedding_to_bytes, inner_product_distance,
    rank_by_distance, squared_l2_distance,
};
use models::{Collection, DistanceSpace, EmbeddingRecord, Metadata, StoredHit};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Collection {0} does not exist.")]
    CollectionNotFound(String),
    #[error("Collection {0} already exists.")]
    CollectionExists(String),
    #[error("Invalid metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("Embedding dimension {got} does not match collection dimensionality {expected}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("Unknown distance space: {0}")]
    UnknownSpace(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistent vector store: one SQLite file inside a store directory.
///
/// Only `vectors.sqlite3` is read. Other files in the directory, such as a
/// Chroma `chroma.sqlite3`, are ignored, so pointing this at a Chroma store
/// opens an empty one and every collection lookup fails with
/// [`StoreError::CollectionNotFound`].
pub struct VectorStore {
    conn: Connection,
}

impl VectorStore {
    pub fn open(dir: &Path, settings: &StoreSettings) -> Result<Self> {
        if settings.create_if_missing {
            std::fs::create_dir_all(dir)?;
        } else if !dir.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("store directory {} does not exist", dir.display()),
            )));
        }
        let conn = Connection::open(dir.join(&settings.file_name))?;
        let store = Self { conn };
        store.init_schema()?;
        tracing::debug!("opened vector store at {}", dir.display());
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA foreign_keys=ON;

            CREATE TABLE IF NOT EXISTS collections (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                space TEXT NOT NULL DEFAULT 'cosine',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS embeddings (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection_id TEXT NOT NULL,
                id TEXT NOT NULL,
                document TEXT,
                metadata TEXT,
                embedding BLOB NOT NULL,
                UNIQUE (collection_id, id),
                FOREIGN KEY (collection_id) REFERENCES collections(id) ON DELETE CASCADE
            );
            ",
        )?;
        Ok(())
    }

    // ── Collections ──

    pub fn create_collection(&self, name: &str, space: DistanceSpace) -> Result<Collection> {
        if self.find_collection(name)?.is_some() {
            return Err(StoreError::CollectionExists(name.to_string()));
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO collections (id, name, space) VALUES (?1, ?2, ?3)",
            params![id, name, space.as_str()],
        )?;
        self.get_collection(name)
    }

    pub fn get_collection(&self, name: &str) -> Result<Collection> {
        self.find_collection(name)?
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    fn find_collection(&self, name: &str) -> Result<Option<Collection>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, space, created_at FROM collections WHERE name = ?1",
                params![name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((id, name, space, created_at)) => Ok(Some(Collection {
                id,
                name,
                space: space.parse()?,
                created_at,
            })),
            None => Ok(None),
        }
    }

    // ── Embeddings ──

    pub fn count(&self, collection: &Collection) -> Result<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM embeddings WHERE collection_id = ?1",
            params![collection.id],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    fn dimensionality(&self, collection: &Collection) -> Result<Option<usize>> {
        let len: Option<i64> = self
            .conn
            .query_row(
                "SELECT length(embedding) FROM embeddings WHERE collection_id = ?1 LIMIT 1",
                params![collection.id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(len.map(|bytes| bytes as usize / 4))
    }

    pub fn add(&mut self, collection: &Collection, records: &[EmbeddingRecord]) -> Result<()> {
        let mut expected = self.dimensionality(collection)?;
        for record in records {
            let got = record.embedding.len();
            match expected {
                Some(expected) if expected != got => {
                    return Err(StoreError::DimensionMismatch { expected, got });
                }
                _ => expected = Some(got),
            }
        }

        let tx = self.conn.transaction()?;
        for record in records {
            let metadata = record
                .metadata
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            tx.execute(
                "INSERT INTO embeddings (collection_id, id, document, metadata, embedding) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    collection.id,
                    record.id,
                    record.document,
                    metadata,
                    embedding_to_bytes(&record.embedding)
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Nearest-neighbour search over a collection, nearest first.
    pub fn query(
        &self,
        collection: &Collection,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<StoredHit>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, document, metadata, embedding FROM embeddings WHERE collection_id = ?1 ORDER BY seq ASC",
        )?;
        let rows: Vec<(String, Option<String>, Option<String>, Vec<f32>)> = stmt
            .query_map(params![collection.id], |row| {
                let bytes: Vec<u8> = row.get(3)?;
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, bytes_to_embedding(&bytes)))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if let Some((_, _, _, first)) = rows.first() {
            if first.len() != embedding.len() {
                return Err(StoreError::DimensionMismatch {
                    expected: first.len(),
                    got: embedding.len(),
                });
            }
        }

        let candidates: Vec<Vec<f32>> = rows.iter().map(|(_, _, _, emb)| emb.clone()).collect();
        let ranked = match collection.space {
            DistanceSpace::Cosine => rank_by_distance(embedding, &candidates, top_k, cosine_distance),
            DistanceSpace::L2 => rank_by_distance(embedding, &candidates, top_k, squared_l2_distance),
            DistanceSpace::Ip => {
                rank_by_distance(embedding, &candidates, top_k, inner_product_distance)
            }
        };

        ranked
            .into_iter()
            .map(|(i, distance)| -> Result<StoredHit> {
                let (id, document, metadata, _) = &rows[i];
                let metadata = metadata
                    .as_deref()
                    .map(|raw| serde_json::from_str::<Metadata>(raw))
                    .transpose()?;
                Ok(StoredHit {
                    id: id.clone(),
                    document: document.clone(),
                    metadata,
                    distance: distance as f64,
                })
            })
            .collect()
    }
}
