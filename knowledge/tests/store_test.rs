//! Knowledge store integration tests over the in-process index.

use chrono::{Duration, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use knowledge::{KnowledgeStore, MemoryIndex, MockEmbeddingService};

fn store() -> KnowledgeStore {
    KnowledgeStore::new(
        Some(Arc::new(MockEmbeddingService::new(16))),
        Some(Arc::new(MemoryIndex::new())),
    )
}

#[tokio::test]
async fn add_and_search_documentation() {
    let store = store();

    assert!(
        store
            .add_documentation(
                "regulatory_guideline",
                "21 CFR Part 11 compliance requirements for electronic records",
                HashMap::new(),
            )
            .await
    );
    assert!(
        store
            .add_documentation(
                "process_guideline",
                "defect probability monitoring on the tablet press",
                HashMap::new(),
            )
            .await
    );

    let hits = store
        .search_relevant_context("defect analysis", "documentation", 5)
        .await;
    assert_eq!(hits.len(), 2);
    assert!(hits[0].content.contains("defect probability"));
}

#[tokio::test]
async fn search_results_are_relevance_ordered() {
    let store = store();
    for content in [
        "defect probability rising on line 2",
        "compliance audit documentation for 21 CFR",
        "waste forecast for the next shift",
        "quality classification results",
    ] {
        store
            .add_documentation("note", content, HashMap::new())
            .await;
    }

    let hits = store
        .search_relevant_context("defect probability", "documentation", 10)
        .await;
    assert!(hits.len() >= 2);
    for pair in hits.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
        assert!(pair[0].relevance_score >= pair[1].relevance_score);
    }
}

#[tokio::test]
async fn search_invalid_collection_is_empty() {
    let store = store();
    let hits = store.search_relevant_context("query", "nonexistent", 5).await;
    assert!(hits.is_empty());
}

#[tokio::test]
async fn degraded_store_returns_safe_values() {
    let disabled = KnowledgeStore::disabled();

    assert!(!disabled.is_available());
    assert!(
        !disabled
            .add_documentation("t", "content", HashMap::new())
            .await
    );
    assert!(!disabled.add_historical_data("t", &json!({})).await);
    assert!(
        disabled
            .search_relevant_context("q", "historical_data", 5)
            .await
            .is_empty()
    );
    assert_eq!(disabled.cleanup_old_embeddings(30).await, 0);
    assert!(disabled.collection_stats().await.is_empty());
    assert_eq!(disabled.recent_summary("classification", 6).await.status, "unavailable");
}

#[tokio::test]
async fn failing_embedder_degrades_to_false() {
    let store = KnowledgeStore::new(
        Some(Arc::new(MockEmbeddingService::failing())),
        Some(Arc::new(MemoryIndex::new())),
    );

    assert!(
        !store
            .add_documentation("t", "content", HashMap::new())
            .await
    );
    assert!(
        store
            .search_relevant_context("q", "historical_data", 5)
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn cleanup_deletes_only_old_documents_with_valid_timestamps() {
    let store = store();
    let old_ts = (Utc::now() - Duration::days(60)).to_rfc3339();

    store
        .add_documentation(
            "old",
            "old defect document",
            HashMap::from([("timestamp".to_string(), json!(old_ts))]),
        )
        .await;
    store
        .add_documentation(
            "malformed",
            "document with a broken timestamp",
            HashMap::from([("timestamp".to_string(), json!("not-a-date"))]),
        )
        .await;
    store
        .add_documentation("fresh", "fresh defect document", HashMap::new())
        .await;

    let deleted = store.cleanup_old_embeddings(30).await;
    assert_eq!(deleted, 1);

    let stats = store.collection_stats().await;
    assert_eq!(stats["documentation"].document_count, 2);
}

#[tokio::test]
async fn collection_stats_reports_counts() {
    let store = store();
    store
        .add_documentation("a", "quality doc", HashMap::new())
        .await;
    store
        .add_historical_data(
            "classification",
            &json!({
                "defect_prediction": {
                    "api_status": "success",
                    "defect_probability": 0.1,
                    "risk_level": "low",
                    "confidence": 0.9,
                }
            }),
        )
        .await;

    let stats = store.collection_stats().await;
    assert_eq!(stats["documentation"].document_count, 1);
    assert_eq!(stats["historical_data"].document_count, 1);
    assert_eq!(stats["templates"].document_count, 0);
    assert_eq!(stats["documentation"].status, "available");
}

#[tokio::test]
async fn recent_summary_parses_classification_documents() {
    let store = store();
    for prob in [0.2, 0.4] {
        store
            .add_historical_data(
                "classification",
                &json!({
                    "collection_timestamp": Utc::now().to_rfc3339(),
                    "defect_prediction": {
                        "api_status": "success",
                        "defect_probability": prob,
                        "risk_level": "low",
                        "confidence": 0.9,
                    },
                    "quality_prediction": {
                        "api_status": "success",
                        "quality_class": "High",
                        "confidence": 0.8,
                    },
                }),
            )
            .await;
    }

    let summary = store.recent_summary("classification", 6).await;
    assert_eq!(summary.status, "success");
    assert_eq!(summary.total_records, 2);
    assert!((summary.average_defect_probability.unwrap() - 0.3).abs() < 1e-9);
    assert_eq!(summary.maximum_defect_probability, Some(0.4));
    assert_eq!(summary.most_common_quality_class.as_deref(), Some("High"));
}

#[tokio::test]
async fn recent_summary_without_data() {
    let store = store();
    let summary = store.recent_summary("forecasting", 6).await;
    assert_eq!(summary.status, "no_recent_data");
}

#[tokio::test]
async fn initialize_default_documentation_seeds_corpus() {
    let store = store();
    let added = store.initialize_default_documentation().await;
    assert!(added >= 6);

    let hits = store
        .search_relevant_context("21 CFR compliance", "documentation", 3)
        .await;
    assert!(!hits.is_empty());
}
