//! Report generation orchestration.
//!
//! Fans out the collectors concurrently, extracts the metrics snapshot,
//! pulls relevant context from the knowledge store, and runs the
//! generation chain: LLM attempt first, deterministic template on any
//! failure. Any error inside the pipeline is converted into a fixed
//! emergency artifact, so `generate_report` is infallible at the type
//! level.

use chrono::Utc;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use collectors::{ClassificationCollector, ForecastingCollector, RlCollector};
use knowledge::KnowledgeStore;
use llm::ReportLlmClient;
use pl_core::traits::DataCollector;
use pl_core::types::{
    CollectedRecord, GenerationStatus, MetricsSnapshot, ReportAppendix, ReportArtifact,
    ReportSections, ReportStatus,
};

use crate::document::build_document;
use crate::metrics::{CollectedBundle, extract_metrics};
use crate::sanitize::sanitize_artifact;
use crate::sections::parse_llm_content;
use crate::template::compose_sections;

const CONTEXT_RESULTS_PER_COLLECTION: usize = 5;

#[derive(Debug, Error)]
enum ReportError {
    #[error("Report assembly error: {0}")]
    Assembly(#[from] serde_json::Error),
}

/// Orchestrates collectors, knowledge store, and generation tiers into a
/// single report pipeline.
pub struct ReportGenerator {
    classification: Arc<ClassificationCollector>,
    forecasting: Arc<ForecastingCollector>,
    rl: Arc<RlCollector>,
    knowledge: Arc<KnowledgeStore>,
    llm: Option<Arc<ReportLlmClient>>,
}

impl ReportGenerator {
    pub fn new(
        classification: Arc<ClassificationCollector>,
        forecasting: Arc<ForecastingCollector>,
        rl: Arc<RlCollector>,
        knowledge: Arc<KnowledgeStore>,
        llm: Option<Arc<ReportLlmClient>>,
    ) -> Self {
        Self {
            classification,
            forecasting,
            rl,
            knowledge,
            llm,
        }
    }

    pub fn llm_available(&self) -> bool {
        self.llm.as_ref().is_some_and(|client| client.is_available())
    }

    /// Runs one concurrent collection cycle across all sources. Per-source
    /// failures become error entries; no failure aborts the fan-out.
    pub async fn collect_bundle(&self) -> CollectedBundle {
        let (classification, forecasting, rl_actions) = tokio::join!(
            self.classification.collect(),
            self.forecasting.collect(),
            self.rl.collect(),
        );

        let bundle = CollectedBundle {
            timestamp: Utc::now(),
            classification,
            forecasting,
            rl_actions,
            collection_errors: Vec::new(),
        };
        let collection_errors = [
            (bundle.defect_available(), "Classification data not available"),
            (bundle.quality_available(), "Quality data not available"),
            (bundle.forecast_available(), "Forecasting data not available"),
            (bundle.rl_available(), "RL data not available"),
        ]
        .into_iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, message)| message.to_string())
        .collect();

        CollectedBundle {
            collection_errors,
            ..bundle
        }
    }

    /// Generates a report for the query. Always returns a well-formed
    /// artifact: degraded conditions are reflected in its status fields,
    /// and pipeline errors produce the emergency artifact.
    pub async fn generate_report(
        &self,
        query: &str,
        report_type: &str,
        additional_context: Option<&Value>,
    ) -> ReportArtifact {
        match self.try_generate(query, report_type, additional_context).await {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::error!(error = %e, "Report pipeline failed, producing emergency report");
                emergency_artifact(&e.to_string())
            }
        }
    }

    async fn try_generate(
        &self,
        query: &str,
        report_type: &str,
        additional_context: Option<&Value>,
    ) -> Result<ReportArtifact, ReportError> {
        tracing::info!(report_type, "Starting report generation");

        let bundle = self.collect_bundle().await;
        let metrics = extract_metrics(&bundle);

        let search_query = match additional_context {
            Some(context) => format!("{query}\nAdditional context: {context}"),
            None => query.to_string(),
        };
        let context = self.gather_context(&search_query).await;

        let (sections, generation_method) = self
            .generate_sections(&search_query, &context, report_type, &metrics)
            .await;

        let generated_at = Utc::now();
        let artifact = ReportArtifact {
            report_id: format!("QC_{}", generated_at.format("%Y%m%d_%H%M%S")),
            title: "Pharmaceutical Manufacturing Quality Control Report".to_string(),
            generated_at,
            status: ReportStatus::Success,
            generation_method,
            data_sources: bundle.data_sources(),
            document: build_document(&sections, &metrics),
            appendix: build_appendix(&bundle)?,
            metrics,
            sections,
        };
        let artifact = sanitize_artifact(artifact);

        self.ingest_summary(&artifact).await;
        tracing::info!(report_id = %artifact.report_id, "Report generated");
        Ok(artifact)
    }

    /// Relevance-ranked context across the historical and documentation
    /// collections; empty when the knowledge store is unavailable.
    async fn gather_context(&self, query: &str) -> Vec<pl_core::types::ContextHit> {
        if !self.knowledge.is_available() {
            return Vec::new();
        }
        let mut hits = self
            .knowledge
            .search_relevant_context(query, "historical_data", CONTEXT_RESULTS_PER_COLLECTION)
            .await;
        hits.extend(
            self.knowledge
                .search_relevant_context(query, "documentation", CONTEXT_RESULTS_PER_COLLECTION)
                .await,
        );
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits
    }

    /// The generation chain: LLM attempt when configured and available,
    /// template fallback otherwise or on any LLM failure.
    async fn generate_sections(
        &self,
        query: &str,
        context: &[pl_core::types::ContextHit],
        report_type: &str,
        metrics: &MetricsSnapshot,
    ) -> (ReportSections, String) {
        if let Some(client) = &self.llm {
            if client.is_available() {
                let result = client
                    .generate_comprehensive_report(query, context, report_type, metrics, false)
                    .await;
                if result.status == GenerationStatus::Success {
                    tracing::info!(model = %result.model_used, "LLM generation successful");
                    return (parse_llm_content(&result.content), result.model_used);
                }
                tracing::warn!("LLM generation failed, falling back to template");
            } else {
                tracing::info!("LLM not available, using template");
            }
        }
        (compose_sections(metrics), "template_fallback".to_string())
    }

    /// Best-effort ingestion of the report summary into the knowledge
    /// store; absence or failure of the store is ignored.
    async fn ingest_summary(&self, artifact: &ReportArtifact) {
        if !self.knowledge.is_available() || artifact.sections.executive_summary.is_empty() {
            return;
        }
        let metadata = HashMap::from([
            ("report_id".to_string(), json!(artifact.report_id)),
            ("generation_method".to_string(), json!(artifact.generation_method)),
        ]);
        self.knowledge
            .add_documentation("report_summary", &artifact.sections.executive_summary, metadata)
            .await;
    }

    /// Collects from every source and stores the successful payloads as
    /// historical data. Returns the number of records stored.
    pub async fn collect_and_store(&self) -> usize {
        let bundle = self.collect_bundle().await;
        if !self.knowledge.is_available() {
            tracing::warn!("Knowledge store unavailable, collected data not persisted");
            return 0;
        }

        let mut stored = 0;
        let records: [(&str, &CollectedRecord); 3] = [
            ("classification", &bundle.classification),
            ("forecasting", &bundle.forecasting),
            ("rl_actions", &bundle.rl_actions),
        ];
        for (data_type, record) in records {
            if record.is_success()
                && self
                    .knowledge
                    .add_historical_data(data_type, &record.payload)
                    .await
            {
                stored += 1;
            }
        }
        tracing::info!(stored, "Background collection cycle completed");
        stored
    }
}

fn build_appendix(bundle: &CollectedBundle) -> Result<ReportAppendix, ReportError> {
    let records = [
        &bundle.classification,
        &bundle.forecasting,
        &bundle.rl_actions,
    ];
    let data_points: usize = records
        .iter()
        .filter(|r| r.is_success())
        .map(|r| r.payload.as_object().map_or(0, serde_json::Map::len))
        .sum();

    let raw_data_summary = HashMap::from([
        (
            "collection_timestamp".to_string(),
            serde_json::to_value(bundle.timestamp)?,
        ),
        (
            "sources_attempted".to_string(),
            json!(crate::metrics::TOTAL_SOURCES),
        ),
        ("sources_successful".to_string(), json!(bundle.successful_sources())),
        ("data_points_collected".to_string(), json!(data_points)),
        (
            "errors_encountered".to_string(),
            json!(bundle.collection_errors.len()),
        ),
        ("errors".to_string(), json!(bundle.collection_errors)),
    ]);

    Ok(ReportAppendix {
        raw_data_summary,
        methodology: "Real-time data collection with ML model predictions".to_string(),
        data_freshness: assess_data_freshness(bundle),
    })
}

/// Freshness buckets over the collection timestamp's age.
fn assess_data_freshness(bundle: &CollectedBundle) -> String {
    let age_minutes = (Utc::now() - bundle.timestamp).num_seconds() as f64 / 60.0;
    if age_minutes < 5.0 {
        "Very Fresh (< 5 minutes)".to_string()
    } else if age_minutes < 15.0 {
        "Fresh (< 15 minutes)".to_string()
    } else if age_minutes < 60.0 {
        "Acceptable (< 1 hour)".to_string()
    } else {
        format!("Stale ({age_minutes:.0} minutes old)")
    }
}

/// The fixed artifact returned when the pipeline itself fails.
pub fn emergency_artifact(error_message: &str) -> ReportArtifact {
    let generated_at = Utc::now();
    let sections = ReportSections {
        executive_summary: format!(
            "Report generation failed due to system error: {error_message}. Emergency procedures \
             should be initiated to restore monitoring capabilities."
        ),
        detailed_analysis: "Unable to complete analysis due to system failure. Manual quality \
                            checks recommended."
            .to_string(),
        recommendations: vec![
            "Investigate system error immediately".to_string(),
            "Implement manual quality monitoring procedures".to_string(),
            "Contact technical support for system restoration".to_string(),
            "Document all manual quality checks until system recovery".to_string(),
        ],
        compliance_status: "UNABLE TO ASSESS: system failure prevents compliance monitoring"
            .to_string(),
        risk_assessment: "HIGH RISK: quality monitoring system failure requires immediate \
                          attention"
            .to_string(),
        action_items: vec![
            "CRITICAL: Restore quality monitoring system".to_string(),
            "URGENT: Implement emergency quality procedures".to_string(),
            "HIGH: Contact technical support".to_string(),
            "MEDIUM: Document all manual processes".to_string(),
        ],
    };

    let metrics = MetricsSnapshot::default();
    let document = build_document(&sections, &metrics);
    ReportArtifact {
        report_id: format!("EMERGENCY_{}", generated_at.format("%Y%m%d_%H%M%S")),
        title: "Emergency Quality Control Report".to_string(),
        generated_at,
        status: ReportStatus::Emergency,
        generation_method: "emergency".to_string(),
        data_sources: HashMap::new(),
        metrics,
        sections,
        document,
        appendix: ReportAppendix {
            raw_data_summary: HashMap::from([(
                "error_details".to_string(),
                json!(error_message),
            )]),
            methodology: "Emergency report generation due to system failure".to_string(),
            data_freshness: "Unknown".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{AppConfig, RetryPolicy};
    use knowledge::{MemoryIndex, MockEmbeddingService};
    use llm::MockLlmService;
    use pl_core::types::HealthState;

    fn offline_generator(
        knowledge: Arc<KnowledgeStore>,
        llm: Option<Arc<ReportLlmClient>>,
    ) -> ReportGenerator {
        // Port 9 is unroutable, so every collector yields an error record.
        let config = AppConfig::default();
        ReportGenerator::new(
            Arc::new(ClassificationCollector::new("http://127.0.0.1:9", 1, 10)),
            Arc::new(ForecastingCollector::new("http://127.0.0.1:9", 1, 10)),
            Arc::new(RlCollector::new(
                "http://127.0.0.1:9",
                1,
                10,
                config.consensus,
            )),
            knowledge,
            llm,
        )
    }

    fn live_knowledge() -> Arc<KnowledgeStore> {
        Arc::new(KnowledgeStore::new(
            Some(Arc::new(MockEmbeddingService::new(32))),
            Some(Arc::new(MemoryIndex::new())),
        ))
    }

    #[tokio::test]
    async fn test_template_report_when_no_llm() {
        let generator = offline_generator(Arc::new(KnowledgeStore::disabled()), None);
        let report = generator
            .generate_report("status", "quality_control", None)
            .await;

        assert_eq!(report.status, ReportStatus::Success);
        assert_eq!(report.generation_method, "template_fallback");
        assert_eq!(report.metrics.collection_success_rate, 0.0);
        assert_eq!(
            report.metrics.system_health.overall_status,
            HealthState::Critical
        );
        assert!(!report.sections.executive_summary.is_empty());
        assert!(report.document.contains("## RISK ASSESSMENT"));
        assert_eq!(
            report.data_sources["ML Classification Service"],
            "Unavailable"
        );
    }

    #[tokio::test]
    async fn test_llm_report_parsed_into_sections() {
        let mock = Arc::new(MockLlmService::new());
        mock.push_response(
            "## EXECUTIVE SUMMARY\nStable operations.\n\
             ## RISK ASSESSMENT\nNo elevated risk.\n\
             ## RECOMMENDATIONS\n- Continue monitoring",
        )
        .await;
        let client = Arc::new(ReportLlmClient::new(
            mock,
            "test-model",
            RetryPolicy {
                max_attempts: 2,
                base_delay_ms: 5,
            },
        ));

        let generator = offline_generator(Arc::new(KnowledgeStore::disabled()), Some(client));
        let report = generator
            .generate_report("status", "quality_control", None)
            .await;

        assert_eq!(report.generation_method, "test-model");
        assert_eq!(report.sections.executive_summary, "Stable operations.");
        assert_eq!(report.sections.recommendations, vec!["Continue monitoring"]);
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back_to_template() {
        let mock = Arc::new(MockLlmService::new());
        mock.push_error(llm::LlmError::Http("HTTP 500".to_string()))
            .await;
        let client = Arc::new(ReportLlmClient::new(
            mock,
            "test-model",
            RetryPolicy {
                max_attempts: 2,
                base_delay_ms: 5,
            },
        ));

        let generator = offline_generator(Arc::new(KnowledgeStore::disabled()), Some(client));
        let report = generator
            .generate_report("status", "quality_control", None)
            .await;

        assert_eq!(report.generation_method, "template_fallback");
        assert!(report.sections.risk_assessment.contains("RISK"));
    }

    #[tokio::test]
    async fn test_summary_ingested_into_knowledge_store() {
        let knowledge = live_knowledge();
        let generator = offline_generator(knowledge.clone(), None);
        generator
            .generate_report("status", "quality_control", None)
            .await;

        let stats = knowledge.collection_stats().await;
        assert_eq!(stats["documentation"].document_count, 1);
    }

    #[tokio::test]
    async fn test_collect_and_store_without_sources() {
        let knowledge = live_knowledge();
        let generator = offline_generator(knowledge.clone(), None);
        // Every upstream is down, so nothing qualifies for storage.
        assert_eq!(generator.collect_and_store().await, 0);
        let stats = knowledge.collection_stats().await;
        assert_eq!(stats["historical_data"].document_count, 0);
    }

    #[tokio::test]
    async fn test_emergency_artifact_shape() {
        let artifact = emergency_artifact("connection pool exhausted");
        assert_eq!(artifact.status, ReportStatus::Emergency);
        assert!(artifact.report_id.starts_with("EMERGENCY_"));
        assert!(
            artifact
                .sections
                .executive_summary
                .contains("connection pool exhausted")
        );
        assert_eq!(artifact.sections.action_items.len(), 4);
        assert_eq!(
            artifact.metrics.system_health.overall_status,
            HealthState::Critical
        );
    }
}
