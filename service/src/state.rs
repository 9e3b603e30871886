//! Application state for the reporting service.
//!
//! All components are constructed once at startup and shared behind an
//! `Arc`, so request handlers work against explicit injected state.

use std::sync::Arc;

use collectors::{ClassificationCollector, ForecastingCollector, RlCollector};
use config::AppConfig;
use knowledge::{
    ChromaIndex, EmbeddingService, HttpEmbeddingService, KnowledgeStore, MemoryIndex, VectorIndex,
};
use llm::{HttpLlmService, ReportLlmClient};
use report::ReportGenerator;

/// Shared state injected into every request handler.
pub struct AppState {
    pub config: AppConfig,
    pub classification: Arc<ClassificationCollector>,
    pub forecasting: Arc<ForecastingCollector>,
    pub rl: Arc<RlCollector>,
    pub knowledge: Arc<KnowledgeStore>,
    pub generator: Arc<ReportGenerator>,
}

impl AppState {
    /// Builds all components from the configuration.
    ///
    /// Optional collaborators degrade rather than fail: a missing
    /// embedding endpoint disables the knowledge store, a missing LLM
    /// endpoint routes every report through the template fallback.
    pub fn new(config: AppConfig) -> Self {
        let base = &config.prediction_api_base;
        let timeout = config.request_timeout_secs;
        let capacity = config.max_history;

        let classification = Arc::new(ClassificationCollector::new(base, timeout, capacity));
        let forecasting = Arc::new(ForecastingCollector::new(base, timeout, capacity));
        let rl = Arc::new(RlCollector::new(
            base,
            timeout,
            capacity,
            config.consensus.clone(),
        ));

        let embedder: Option<Arc<dyn EmbeddingService>> = config
            .embedding_url
            .as_deref()
            .map(|url| Arc::new(HttpEmbeddingService::new(url)) as Arc<dyn EmbeddingService>);
        let index: Arc<dyn VectorIndex> = match config.vector_index_url.as_deref() {
            Some(url) => Arc::new(ChromaIndex::new(url)),
            None => Arc::new(MemoryIndex::new()),
        };
        let knowledge = if embedder.is_some() {
            Arc::new(KnowledgeStore::new(embedder, Some(index)))
        } else {
            tracing::warn!("No embedding endpoint configured, knowledge store disabled");
            Arc::new(KnowledgeStore::disabled())
        };

        let llm = config.llm_url.as_deref().map(|url| {
            let service = Arc::new(HttpLlmService::new(
                url,
                config.llm_api_key.clone(),
                &config.llm_model,
            ));
            Arc::new(ReportLlmClient::new(
                service,
                &config.llm_model,
                config.retry.clone(),
            ))
        });
        if llm.is_none() {
            tracing::warn!("No LLM endpoint configured, reports use the template fallback");
        }

        let generator = Arc::new(ReportGenerator::new(
            classification.clone(),
            forecasting.clone(),
            rl.clone(),
            knowledge.clone(),
            llm,
        ));

        Self {
            config,
            classification,
            forecasting,
            rl,
            knowledge,
            generator,
        }
    }

    /// Seeds the documentation collection when the store is live.
    pub async fn initialize_knowledge(&self) {
        if self.knowledge.is_available() {
            let added = self.knowledge.initialize_default_documentation().await;
            tracing::info!(added, "Default documentation loaded");
        }
    }
}
