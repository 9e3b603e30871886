//! The knowledge store: named collections over an embedding service and a
//! vector index.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use pl_core::types::{CollectionStats, ContextHit};

use crate::docs;
use crate::embedding::EmbeddingService;
use crate::index::{IndexedDocument, VectorIndex};
use crate::text::{format_data_as_text, parse_labeled};

pub const COLLECTIONS: [&str; 3] = ["historical_data", "documentation", "templates"];

/// Aggregates parsed from recent historical documents of one data type.
#[derive(Debug, Clone, Serialize)]
pub struct RecentSummary {
    pub status: String,
    pub data_type: String,
    pub hours_analyzed: i64,
    pub total_records: usize,
    pub successful_records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_defect_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_defect_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_defect_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_common_quality_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_horizon: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub action_types: Vec<String>,
    pub data_quality: String,
}

impl RecentSummary {
    fn empty(data_type: &str, hours: i64, status: &str) -> Self {
        Self {
            status: status.to_string(),
            data_type: data_type.to_string(),
            hours_analyzed: hours,
            total_records: 0,
            successful_records: 0,
            average_defect_probability: None,
            maximum_defect_probability: None,
            minimum_defect_probability: None,
            most_common_quality_class: None,
            average_horizon: None,
            action_types: Vec::new(),
            data_quality: "limited".to_string(),
        }
    }
}

/// Wrapper over the embedding model and the vector index.
///
/// Either collaborator may be absent or failing; every operation then
/// degrades to its safe empty value rather than erroring.
pub struct KnowledgeStore {
    embedder: Option<Arc<dyn EmbeddingService>>,
    index: Option<Arc<dyn VectorIndex>>,
}

impl KnowledgeStore {
    pub fn new(
        embedder: Option<Arc<dyn EmbeddingService>>,
        index: Option<Arc<dyn VectorIndex>>,
    ) -> Self {
        Self { embedder, index }
    }

    /// A store with no collaborators; every operation is a no-op.
    pub fn disabled() -> Self {
        Self {
            embedder: None,
            index: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.embedder.is_some() && self.index.is_some()
    }

    fn components(&self) -> Option<(&Arc<dyn EmbeddingService>, &Arc<dyn VectorIndex>)> {
        Some((self.embedder.as_ref()?, self.index.as_ref()?))
    }

    /// Adds a documentation entry. Returns false when the store is
    /// unavailable or either collaborator fails.
    pub async fn add_documentation(
        &self,
        doc_type: &str,
        content: &str,
        metadata: HashMap<String, Value>,
    ) -> bool {
        let Some((embedder, index)) = self.components() else {
            tracing::error!("Embedding model or vector index not available");
            return false;
        };

        let embedding = match embedder.embed(content).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::error!(error = %e, "Error embedding documentation");
                return false;
            }
        };

        let mut full_metadata = metadata;
        full_metadata.insert("type".to_string(), Value::String(doc_type.to_string()));
        full_metadata
            .entry("timestamp".to_string())
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        let doc_id = format!("{}_{}", doc_type, Uuid::new_v4());
        let document = IndexedDocument {
            id: doc_id.clone(),
            embedding,
            document: content.to_string(),
            metadata: full_metadata,
        };

        match index.add("documentation", vec![document]).await {
            Ok(()) => {
                tracing::info!(doc_id = %doc_id, "Added documentation");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Error adding documentation");
                false
            }
        }
    }

    /// Flattens a collected payload into searchable text and stores it in
    /// the historical collection. Returns false on any failure.
    pub async fn add_historical_data(&self, data_type: &str, data: &Value) -> bool {
        let Some((embedder, index)) = self.components() else {
            tracing::error!("Embedding model or vector index not available");
            return false;
        };

        let text = format_data_as_text(data);
        if text.is_empty() {
            tracing::warn!("No text content generated from data");
            return false;
        }

        let embedding = match embedder.embed(&text).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::error!(error = %e, "Error embedding historical data");
                return false;
            }
        };

        let timestamp = data
            .get("collection_timestamp")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        let metadata = HashMap::from([
            ("type".to_string(), Value::String(data_type.to_string())),
            ("timestamp".to_string(), Value::String(timestamp)),
            (
                "source".to_string(),
                Value::String("real_time_collection".to_string()),
            ),
            (
                "data_size".to_string(),
                Value::from(data.to_string().len()),
            ),
        ]);

        let doc_id = format!("{}_{}", data_type, Uuid::new_v4());
        let document = IndexedDocument {
            id: doc_id.clone(),
            embedding,
            document: text,
            metadata,
        };

        match index.add("historical_data", vec![document]).await {
            Ok(()) => {
                tracing::info!(doc_id = %doc_id, "Added historical data");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Error adding historical data");
                false
            }
        }
    }

    /// Similarity search, descending by relevance (`1 - distance`).
    /// Returns an empty list for unknown collections or any failure.
    pub async fn search_relevant_context(
        &self,
        query: &str,
        collection: &str,
        n_results: usize,
    ) -> Vec<ContextHit> {
        if !COLLECTIONS.contains(&collection) {
            tracing::error!(collection, "Cannot search: invalid collection");
            return Vec::new();
        }
        let Some((embedder, index)) = self.components() else {
            tracing::error!("Cannot search: missing embedding model or vector index");
            return Vec::new();
        };

        let embedding = match embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::error!(error = %e, "Error embedding query");
                return Vec::new();
            }
        };

        let matches = match index.query(collection, embedding, n_results).await {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!(error = %e, "Error searching for context");
                return Vec::new();
            }
        };

        let mut hits: Vec<ContextHit> = matches
            .into_iter()
            .map(|m| ContextHit {
                content: m.document,
                metadata: m.metadata,
                distance: m.distance,
                relevance_score: 1.0 - m.distance,
            })
            .collect();
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::info!(count = hits.len(), collection, "Found relevant results");
        hits
    }

    /// Deletes documents older than the cutoff across all collections.
    ///
    /// Stored timestamps are parsed and compared chronologically; documents
    /// with malformed timestamps are skipped. Returns the number deleted.
    pub async fn cleanup_old_embeddings(&self, days_to_keep: i64) -> usize {
        let Some(index) = self.index.as_ref() else {
            tracing::error!("Vector index not available for cleanup");
            return 0;
        };
        let cutoff = Utc::now() - Duration::days(days_to_keep);

        let mut total_deleted = 0;
        for collection in COLLECTIONS {
            let documents = match index.get(collection).await {
                Ok(documents) => documents,
                Err(e) => {
                    tracing::error!(error = %e, collection, "Error listing documents for cleanup");
                    continue;
                }
            };

            let old_ids: Vec<String> = documents
                .into_iter()
                .filter(|doc| {
                    doc.metadata
                        .get("timestamp")
                        .and_then(Value::as_str)
                        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                        .is_some_and(|ts| ts.with_timezone(&Utc) < cutoff)
                })
                .map(|doc| doc.id)
                .collect();

            if old_ids.is_empty() {
                continue;
            }
            match index.delete(collection, old_ids).await {
                Ok(deleted) => {
                    tracing::info!(deleted, collection, "Cleaned up old documents");
                    total_deleted += deleted;
                }
                Err(e) => {
                    tracing::error!(error = %e, collection, "Error during cleanup");
                }
            }
        }
        total_deleted
    }

    pub async fn collection_stats(&self) -> HashMap<String, CollectionStats> {
        let mut stats = HashMap::new();
        let Some(index) = self.index.as_ref() else {
            return stats;
        };

        for collection in COLLECTIONS {
            let entry = match index.count(collection).await {
                Ok(count) => CollectionStats {
                    document_count: count,
                    status: "available".to_string(),
                },
                Err(e) => CollectionStats {
                    document_count: 0,
                    status: format!("error: {e}"),
                },
            };
            stats.insert(collection.to_string(), entry);
        }
        stats
    }

    /// Aggregates over recent historical documents of one data type by
    /// parsing the flattened text back into metrics.
    pub async fn recent_summary(&self, data_type: &str, hours: i64) -> RecentSummary {
        let Some(index) = self.index.as_ref() else {
            return RecentSummary::empty(data_type, hours, "unavailable");
        };

        let documents = match index.get("historical_data").await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::error!(error = %e, "Error reading historical data");
                return RecentSummary::empty(data_type, hours, "unavailable");
            }
        };

        let cutoff = Utc::now() - Duration::hours(hours);
        let recent: Vec<String> = documents
            .into_iter()
            .filter(|doc| doc.metadata.get("type").and_then(Value::as_str) == Some(data_type))
            .filter(|doc| {
                doc.metadata
                    .get("timestamp")
                    .and_then(Value::as_str)
                    .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                    .is_some_and(|ts| ts.with_timezone(&Utc) >= cutoff)
            })
            .map(|doc| doc.document)
            .collect();

        if recent.is_empty() {
            return RecentSummary::empty(data_type, hours, "no_recent_data");
        }

        let mut summary = RecentSummary::empty(data_type, hours, "success");
        summary.total_records = recent.len();

        match data_type {
            "classification" => {
                let mut probs = Vec::new();
                let mut classes = Vec::new();
                for content in &recent {
                    if let Some(prob) = parse_labeled(content, "Defect probability:", ",")
                        .and_then(|s| s.parse::<f64>().ok())
                    {
                        probs.push(prob);
                    }
                    if let Some(class) = parse_labeled(content, "Quality class:", ",") {
                        classes.push(class.to_string());
                    }
                }
                if probs.is_empty() {
                    summary.status = "no_valid_data".to_string();
                    return summary;
                }
                summary.successful_records = probs.len();
                summary.average_defect_probability =
                    Some(probs.iter().sum::<f64>() / probs.len() as f64);
                summary.maximum_defect_probability =
                    Some(probs.iter().copied().fold(f64::MIN, f64::max));
                summary.minimum_defect_probability =
                    Some(probs.iter().copied().fold(f64::MAX, f64::min));
                summary.most_common_quality_class = most_common(&classes);
            }
            "forecasting" => {
                let horizons: Vec<f64> = recent
                    .iter()
                    .filter_map(|content| {
                        parse_labeled(content, "Forecast horizon:", "minutes")
                            .and_then(|s| s.trim().parse::<f64>().ok())
                    })
                    .collect();
                if horizons.is_empty() {
                    summary.status = "no_valid_data".to_string();
                    return summary;
                }
                summary.successful_records = horizons.len();
                summary.average_horizon =
                    Some(horizons.iter().sum::<f64>() / horizons.len() as f64);
            }
            "rl_actions" => {
                let mut action_types: Vec<String> = recent
                    .iter()
                    .filter_map(|content| {
                        parse_labeled(content, "model actions:", "|").map(ToString::to_string)
                    })
                    .collect();
                if action_types.is_empty() {
                    summary.status = "no_valid_data".to_string();
                    return summary;
                }
                summary.successful_records = action_types.len();
                action_types.sort();
                action_types.dedup();
                summary.action_types = action_types;
            }
            _ => {
                summary.successful_records = recent.len();
            }
        }

        summary.data_quality = if summary.successful_records > 5 {
            "good".to_string()
        } else {
            "limited".to_string()
        };
        summary
    }

    /// Seeds the documentation collection with the pharmaceutical reference
    /// corpus. Returns the number of documents added.
    pub async fn initialize_default_documentation(&self) -> usize {
        let mut added = 0;
        for doc in docs::default_documentation() {
            if self
                .add_documentation(doc.doc_type, doc.content, doc.metadata())
                .await
            {
                added += 1;
            }
        }
        tracing::info!(added, "Initialized pharmaceutical documentation corpus");
        added
    }
}

fn most_common(values: &[String]) -> Option<String> {
    let mut counts: HashMap<&String, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(value, _)| value.clone())
}
