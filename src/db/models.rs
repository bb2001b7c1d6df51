use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Scalar value attached to a stored document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Null,
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// Distance function a collection is searched with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceSpace {
    #[default]
    Cosine,
    L2,
    Ip,
}

impl DistanceSpace {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceSpace::Cosine => "cosine",
            DistanceSpace::L2 => "l2",
            DistanceSpace::Ip => "ip",
        }
    }
}

impl FromStr for DistanceSpace {
    type Err = super::StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cosine" => Ok(DistanceSpace::Cosine),
            "l2" => Ok(DistanceSpace::L2),
            "ip" => Ok(DistanceSpace::Ip),
            other => Err(super::StoreError::UnknownSpace(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub space: DistanceSpace,
    pub created_at: String,
}

/// A document and its embedding, as written to a collection.
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: Option<String>,
    pub metadata: Option<Metadata>,
}

impl EmbeddingRecord {
    pub fn new(embedding: Vec<f32>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            embedding,
            document: None,
            metadata: None,
        }
    }

    pub fn document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A nearest-neighbour match, nearest first.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StoredHit {
    pub id: String,
    pub document: Option<String>,
    pub metadata: Option<Metadata>,
    pub distance: f64,
}
