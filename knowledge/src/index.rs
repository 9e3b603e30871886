//! Vector index backends.
//!
//! The index is a black-box nearest-neighbor service organized into named
//! collections. `ChromaIndex` talks to an external REST index; `MemoryIndex`
//! is an in-process implementation used in tests and when no external index
//! is configured.

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Vector index unavailable: {0}")]
    Unavailable(String),

    #[error("Index request failed: {0}")]
    Request(String),

    #[error("Invalid index response: {0}")]
    InvalidResponse(String),
}

/// A document as written to the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A document as read back from the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub document: String,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// One nearest-neighbor match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    pub document: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub distance: f32,
}

/// Unified interface over vector index backends.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn add(&self, collection: &str, docs: Vec<IndexedDocument>) -> Result<(), IndexError>;

    /// Nearest neighbors, ascending by distance.
    async fn query(
        &self,
        collection: &str,
        embedding: Vec<f32>,
        n_results: usize,
    ) -> Result<Vec<IndexMatch>, IndexError>;

    /// Every document in the collection, without embeddings.
    async fn get(&self, collection: &str) -> Result<Vec<StoredDocument>, IndexError>;

    async fn delete(&self, collection: &str, ids: Vec<String>) -> Result<usize, IndexError>;

    async fn count(&self, collection: &str) -> Result<usize, IndexError>;
}

#[derive(Debug, Serialize)]
struct AddRequest {
    ids: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    documents: Vec<String>,
    metadatas: Vec<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    query_embeddings: Vec<Vec<f32>>,
    n_results: usize,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    documents: Vec<Vec<String>>,
    metadatas: Vec<Vec<HashMap<String, serde_json::Value>>>,
    distances: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    ids: Vec<String>,
    documents: Vec<String>,
    metadatas: Vec<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest {
    ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: usize,
}

/// Client for a Chroma-style REST vector index.
pub struct ChromaIndex {
    client: Client,
    base_url: String,
}

impl ChromaIndex {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn collection_url(&self, collection: &str, op: &str) -> String {
        format!("{}/collections/{}/{}", self.base_url, collection, op)
    }
}

#[async_trait]
impl VectorIndex for ChromaIndex {
    async fn add(&self, collection: &str, docs: Vec<IndexedDocument>) -> Result<(), IndexError> {
        let mut request = AddRequest {
            ids: Vec::with_capacity(docs.len()),
            embeddings: Vec::with_capacity(docs.len()),
            documents: Vec::with_capacity(docs.len()),
            metadatas: Vec::with_capacity(docs.len()),
        };
        for doc in docs {
            request.ids.push(doc.id);
            request.embeddings.push(doc.embedding);
            request.documents.push(doc.document);
            request.metadatas.push(doc.metadata);
        }

        let resp = self
            .client
            .post(self.collection_url(collection, "add"))
            .json(&request)
            .send()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(IndexError::Request(format!(
                "add failed with HTTP {}",
                resp.status().as_u16()
            )));
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        embedding: Vec<f32>,
        n_results: usize,
    ) -> Result<Vec<IndexMatch>, IndexError> {
        let resp = self
            .client
            .post(self.collection_url(collection, "query"))
            .json(&QueryRequest {
                query_embeddings: vec![embedding],
                n_results,
            })
            .send()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(IndexError::Request(format!(
                "query failed with HTTP {}",
                resp.status().as_u16()
            )));
        }

        let body: QueryResponse = resp
            .json()
            .await
            .map_err(|e| IndexError::InvalidResponse(e.to_string()))?;

        let (Some(ids), Some(documents), Some(metadatas), Some(distances)) = (
            body.ids.into_iter().next(),
            body.documents.into_iter().next(),
            body.metadatas.into_iter().next(),
            body.distances.into_iter().next(),
        ) else {
            return Ok(Vec::new());
        };

        Ok(ids
            .into_iter()
            .zip(documents)
            .zip(metadatas.into_iter().zip(distances))
            .map(|((id, document), (metadata, distance))| IndexMatch {
                id,
                document,
                metadata,
                distance,
            })
            .collect())
    }

    async fn get(&self, collection: &str) -> Result<Vec<StoredDocument>, IndexError> {
        let resp = self
            .client
            .post(self.collection_url(collection, "get"))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(IndexError::Request(format!(
                "get failed with HTTP {}",
                resp.status().as_u16()
            )));
        }

        let body: GetResponse = resp
            .json()
            .await
            .map_err(|e| IndexError::InvalidResponse(e.to_string()))?;

        Ok(body
            .ids
            .into_iter()
            .zip(body.documents)
            .zip(body.metadatas)
            .map(|((id, document), metadata)| StoredDocument {
                id,
                document,
                metadata,
            })
            .collect())
    }

    async fn delete(&self, collection: &str, ids: Vec<String>) -> Result<usize, IndexError> {
        let count = ids.len();
        let resp = self
            .client
            .post(self.collection_url(collection, "delete"))
            .json(&DeleteRequest { ids })
            .send()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(IndexError::Request(format!(
                "delete failed with HTTP {}",
                resp.status().as_u16()
            )));
        }
        Ok(count)
    }

    async fn count(&self, collection: &str) -> Result<usize, IndexError> {
        let resp = self
            .client
            .get(self.collection_url(collection, "count"))
            .send()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(IndexError::Request(format!(
                "count failed with HTTP {}",
                resp.status().as_u16()
            )));
        }

        let body: CountResponse = resp
            .json()
            .await
            .map_err(|e| IndexError::InvalidResponse(e.to_string()))?;
        Ok(body.count)
    }
}

/// In-process index with cosine distance, keyed by collection name.
#[derive(Default)]
pub struct MemoryIndex {
    collections: DashMap<String, Vec<IndexedDocument>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn add(&self, collection: &str, docs: Vec<IndexedDocument>) -> Result<(), IndexError> {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(docs);
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        embedding: Vec<f32>,
        n_results: usize,
    ) -> Result<Vec<IndexMatch>, IndexError> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<IndexMatch> = docs
            .iter()
            .map(|doc| IndexMatch {
                id: doc.id.clone(),
                document: doc.document.clone(),
                metadata: doc.metadata.clone(),
                distance: cosine_distance(&doc.embedding, &embedding),
            })
            .collect();

        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(n_results);
        Ok(matches)
    }

    async fn get(&self, collection: &str) -> Result<Vec<StoredDocument>, IndexError> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|doc| StoredDocument {
                        id: doc.id.clone(),
                        document: doc.document.clone(),
                        metadata: doc.metadata.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, collection: &str, ids: Vec<String>) -> Result<usize, IndexError> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|doc| !ids.contains(&doc.id));
        Ok(before - docs.len())
    }

    async fn count(&self, collection: &str) -> Result<usize, IndexError> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0))
    }
}
