//! HTTP request handlers for the reporting service.

use axum::{Json, extract::Query, extract::State, response::IntoResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use pl_core::types::ReportArtifact;

use crate::error::{Result, ServiceError};
use crate::state::AppState;

const DEFAULT_QUERY: &str = "Generate comprehensive pharmaceutical manufacturing report";

/// Aliases accepted for the canonical `quality_control` report type.
const REPORT_TYPE_ALIASES: [&str; 7] = [
    "quality_control",
    "quality",
    "qc",
    "defect_analysis",
    "manufacturing_report",
    "pharma_report",
    "comprehensive",
];

fn resolve_report_type(requested: &str) -> Result<&'static str> {
    let lowered = requested.to_lowercase();
    if REPORT_TYPE_ALIASES.contains(&lowered.as_str()) {
        Ok("quality_control")
    } else {
        Err(ServiceError::InvalidReportType(requested.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub report_type: String,
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default)]
    pub additional_context: Option<Value>,
}

fn default_query() -> String {
    DEFAULT_QUERY.to_string()
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub status: String,
    pub report: ReportArtifact,
    pub generated_at: String,
    pub report_type_used: String,
    pub original_request_type: String,
    pub timestamp: String,
}

async fn run_report(
    state: &AppState,
    requested_type: &str,
    query: &str,
    additional_context: Option<&Value>,
) -> Result<Json<ReportResponse>> {
    let report_type = resolve_report_type(requested_type)?;
    tracing::info!(report_type, query, "Generating report");

    let report = state
        .generator
        .generate_report(query, report_type, additional_context)
        .await;

    let now = Utc::now().to_rfc3339();
    Ok(Json(ReportResponse {
        status: "success".to_string(),
        generated_at: report.generated_at.to_rfc3339(),
        report,
        report_type_used: report_type.to_string(),
        original_request_type: requested_type.to_string(),
        timestamp: now,
    }))
}

/// POST /api/reports/generate
pub async fn generate_report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<ReportResponse>> {
    run_report(
        &state,
        &request.report_type,
        &request.query,
        request.additional_context.as_ref(),
    )
    .await
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(default = "default_report_type")]
    pub report_type: String,
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default)]
    pub additional_context: Option<String>,
}

fn default_report_type() -> String {
    "quality_control".to_string()
}

/// GET /api/reports/generate
///
/// Query-string variant; `additional_context` is parsed as JSON, falling
/// back to a raw-context wrapper when it is not valid JSON.
pub async fn generate_report_get(
    State(state): State<Arc<AppState>>,
    Query(request): Query<ReportQuery>,
) -> Result<Json<ReportResponse>> {
    let context = request.additional_context.as_deref().map(|raw| {
        serde_json::from_str::<Value>(raw).unwrap_or_else(|_| {
            tracing::warn!("Invalid JSON in additional_context, wrapping as raw text");
            json!({ "raw_context": raw })
        })
    });
    run_report(&state, &request.report_type, &request.query, context.as_ref()).await
}

/// GET /api/reports/health
pub async fn reports_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let knowledge_available = state.knowledge.is_available();
    let llm_available = state.generator.llm_available();
    let status = if knowledge_available && llm_available {
        "healthy"
    } else {
        "degraded"
    };

    let knowledge_stats = if knowledge_available {
        Some(state.knowledge.collection_stats().await)
    } else {
        None
    };

    Json(json!({
        "status": status,
        "components": {
            "knowledge_base": availability(knowledge_available),
            "data_collectors": "available",
            "report_generators": "available",
            "llm": availability(llm_available),
        },
        "available_generators": ["quality_control"],
        "knowledge_base_stats": knowledge_stats,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

fn availability(available: bool) -> &'static str {
    if available { "available" } else { "unavailable" }
}

/// GET /api/reports/types
pub async fn report_types() -> impl IntoResponse {
    Json(json!({
        "available_types": ["quality_control"],
        "aliases": {
            "quality_control": ["quality", "qc", "defect_analysis", "manufacturing_report", "pharma_report", "comprehensive"],
        },
        "descriptions": {
            "quality_control": "Comprehensive quality control and defect analysis reports with regulatory compliance",
            "quality": "Shorthand for quality_control reports",
            "qc": "Shorthand for quality_control reports",
            "manufacturing_report": "General pharmaceutical manufacturing reports",
            "pharma_report": "Pharmaceutical industry specific reports",
            "comprehensive": "Comprehensive analysis reports",
        },
        "supported_features": {
            "rag_powered": true,
            "real_time_data": true,
            "historical_analysis": true,
            "regulatory_compliance": true,
            "template_fallback": true,
        },
        "default_type": "quality_control",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /api/knowledge/status
pub async fn knowledge_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if !state.knowledge.is_available() {
        return Json(json!({
            "status": "unavailable",
            "error": "Knowledge store not configured",
            "timestamp": Utc::now().to_rfc3339(),
        }));
    }

    let stats = state.knowledge.collection_stats().await;
    Json(json!({
        "status": "available",
        "collections": stats,
        "features": {
            "vector_search": true,
            "embeddings": true,
            "historical_data": true,
            "documentation": true,
        },
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AddDocumentationRequest {
    pub doc_type: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

/// POST /api/knowledge/add-documentation
pub async fn add_documentation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddDocumentationRequest>,
) -> Result<Json<Value>> {
    if !state.knowledge.is_available() {
        return Err(ServiceError::KnowledgeUnavailable);
    }

    let added = state
        .knowledge
        .add_documentation(&request.doc_type, &request.content, request.metadata)
        .await;

    let (status, message) = if added {
        (
            "success",
            format!("Documentation of type '{}' added successfully", request.doc_type),
        )
    } else {
        ("failed", "Failed to add documentation to knowledge base".to_string())
    };
    Ok(Json(json!({
        "status": status,
        "message": message,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_collection() -> String {
    "historical_data".to_string()
}

fn default_max_results() -> usize {
    10
}

/// POST /api/knowledge/search
pub async fn search_knowledge(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Value>> {
    if !state.knowledge.is_available() {
        return Err(ServiceError::KnowledgeUnavailable);
    }

    let results = state
        .knowledge
        .search_relevant_context(&request.query, &request.collection, request.max_results)
        .await;

    Ok(Json(json!({
        "status": "success",
        "query": request.query,
        "collection": request.collection,
        "total_results": results.len(),
        "results": results,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct CleanupRequest {
    #[serde(default = "default_days_to_keep")]
    pub days_to_keep: i64,
}

fn default_days_to_keep() -> i64 {
    30
}

/// POST /api/knowledge/cleanup
pub async fn cleanup_knowledge(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CleanupRequest>,
) -> Result<Json<Value>> {
    if !state.knowledge.is_available() {
        return Err(ServiceError::KnowledgeUnavailable);
    }

    let deleted = state
        .knowledge
        .cleanup_old_embeddings(request.days_to_keep)
        .await;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Cleaned up data older than {} days", request.days_to_keep),
        "documents_deleted": deleted,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// POST /api/data/collect
///
/// Spawns a background collection cycle that stores every successful
/// record into the knowledge store, and returns immediately.
pub async fn collect_data(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let generator = state.generator.clone();
    tokio::spawn(async move {
        let stored = generator.collect_and_store().await;
        tracing::info!(stored, "Background data collection finished");
    });

    Json(json!({
        "status": "initiated",
        "message": "Data collection started in background",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SummariesQuery {
    #[serde(default = "default_hours")]
    pub hours: i64,
}

fn default_hours() -> i64 {
    6
}

/// GET /api/data/summaries
pub async fn data_summaries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummariesQuery>,
) -> Result<Json<Value>> {
    let hours = params.hours;
    let (classification, forecasting, rl) = tokio::join!(
        state.classification.summary(hours),
        state.forecasting.summary(hours),
        state.rl.summary(hours),
    );

    Ok(Json(json!({
        "status": "success",
        "summaries": {
            "classification": classification,
            "forecasting": forecasting,
            "rl": rl,
        },
        "hours_analyzed": hours,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
