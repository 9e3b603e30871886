use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upstream data sources the reporting pipeline aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Classification,
    Quality,
    Forecasting,
    RlActions,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Classification,
        SourceKind::Quality,
        SourceKind::Forecasting,
        SourceKind::RlActions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Classification => "classification",
            SourceKind::Quality => "quality",
            SourceKind::Forecasting => "forecasting",
            SourceKind::RlActions => "rl_actions",
        }
    }

    /// Human-readable service name, used in report appendices.
    pub fn service_name(&self) -> &'static str {
        match self {
            SourceKind::Classification => "ML Classification Service",
            SourceKind::Quality => "Quality Assessment Service",
            SourceKind::Forecasting => "Time Series Forecasting Service",
            SourceKind::RlActions => "Reinforcement Learning Service",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    Success,
    Error,
}

/// One collection cycle's outcome for a single source.
///
/// Collection never raises to the caller: upstream failures are represented
/// as records with `status: Error` and the error string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedRecord {
    pub timestamp: DateTime<Utc>,
    pub source: SourceKind,
    pub status: CollectionStatus,
    pub payload: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CollectedRecord {
    pub fn success(source: SourceKind, payload: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            source,
            status: CollectionStatus::Success,
            payload,
            error: None,
        }
    }

    pub fn failure(source: SourceKind, error: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            source,
            status: CollectionStatus::Error,
            payload: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CollectionStatus::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Critical,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Critical => "critical",
        }
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived health of the collection subsystem for one report request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    pub overall_status: HealthState,
    pub successful_sources: usize,
    pub total_sources: usize,
    pub collection_errors: usize,
    pub data_availability: String,
}

impl SystemHealth {
    pub fn new(successful: usize, total: usize, errors: usize) -> Self {
        let overall_status = if successful == total && errors == 0 {
            HealthState::Healthy
        } else if successful >= 3 {
            if errors <= 1 {
                HealthState::Healthy
            } else {
                HealthState::Degraded
            }
        } else if successful >= 2 {
            HealthState::Degraded
        } else {
            HealthState::Critical
        };

        Self {
            overall_status,
            successful_sources: successful,
            total_sources: total,
            collection_errors: errors,
            data_availability: format!("{}/{} sources online", successful, total),
        }
    }
}

/// One timestep of the forecast horizon, normalized from the upstream
/// `forecast[].sensors` shape.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub waste: f64,
    pub produced: f64,
    pub ejection: f64,
    pub tbl_speed: f64,
}

impl ForecastPoint {
    /// Production share of total throughput, 0 when nothing moved.
    pub fn efficiency(&self) -> f64 {
        let total = self.produced + self.waste;
        if total > 0.0 { self.produced / total } else { 0.0 }
    }
}

/// Normalized, ephemeral summary of the latest successful collector outputs.
///
/// Recomputed fresh per report request; narrative sections must only
/// reference values present here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub data_collection_time: DateTime<Utc>,
    pub defect_probability: Option<f64>,
    pub risk_level: String,
    pub defect_confidence: Option<f64>,
    pub quality_class: String,
    pub quality_score: Option<f64>,
    pub quality_confidence: Option<f64>,
    pub class_probabilities: HashMap<String, f64>,
    pub forecast_horizon: Option<u32>,
    pub forecast_points: usize,
    pub forecast_preview: Vec<ForecastPoint>,
    pub predicted_waste: Option<f64>,
    pub predicted_production: Option<f64>,
    pub recommended_actions: HashMap<String, f64>,
    pub action_confidence: Option<f64>,
    pub expected_reward: Option<f64>,
    pub rl_model_type: String,
    pub collection_success_rate: f64,
    pub system_health: SystemHealth,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            data_collection_time: Utc::now(),
            defect_probability: None,
            risk_level: "unknown".to_string(),
            defect_confidence: None,
            quality_class: "unknown".to_string(),
            quality_score: None,
            quality_confidence: None,
            class_probabilities: HashMap::new(),
            forecast_horizon: None,
            forecast_points: 0,
            forecast_preview: Vec::new(),
            predicted_waste: None,
            predicted_production: None,
            recommended_actions: HashMap::new(),
            action_confidence: None,
            expected_reward: None,
            rl_model_type: "unknown".to_string(),
            collection_success_rate: 0.0,
            system_health: SystemHealth::new(0, SourceKind::ALL.len(), 0),
        }
    }
}

impl MetricsSnapshot {
    /// Formats an optional metric for narrative text, "N/A" when absent.
    pub fn fmt_opt(value: Option<f64>, precision: usize) -> String {
        match value {
            Some(v) => format!("{:.*}", precision, v),
            None => "N/A".to_string(),
        }
    }

    /// Nonzero recommended actions rendered as "name: value" pairs.
    pub fn action_description(&self) -> String {
        let mut parts: Vec<String> = self
            .recommended_actions
            .iter()
            .filter(|(_, v)| **v != 0.0)
            .map(|(k, v)| format!("{}: {:.3}", k, v))
            .collect();
        parts.sort();
        if parts.is_empty() {
            "maintain_current_settings".to_string()
        } else {
            parts.join("; ")
        }
    }
}

/// A document owned by the knowledge store. Immutable after add, except
/// deletion via cleanup-by-age.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub id: String,
    pub doc_type: String,
    pub content: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

/// One similarity-search hit, ordered by ascending distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextHit {
    pub content: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub distance: f32,
    /// `1 - distance`, higher is more relevant.
    pub relevance_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub document_count: usize,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Success,
    Fallback,
    Error,
}

/// Outcome of one LLM generation attempt chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub status: GenerationStatus,
    pub content: String,
    pub model_used: String,
    pub tokens_used: u64,
    pub attempts: u32,
}

/// Narrative sections of a report, either parsed from LLM output or
/// composed by the template fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSections {
    pub executive_summary: String,
    pub detailed_analysis: String,
    pub recommendations: Vec<String>,
    pub compliance_status: String,
    pub risk_assessment: String,
    pub action_items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportAppendix {
    pub raw_data_summary: HashMap<String, serde_json::Value>,
    pub methodology: String,
    pub data_freshness: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    Emergency,
}

/// The immutable artifact returned for every report request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub report_id: String,
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub status: ReportStatus,
    pub generation_method: String,
    pub data_sources: HashMap<String, String>,
    pub metrics: MetricsSnapshot,
    pub sections: ReportSections,
    /// Assembled markdown document for display and downstream rendering.
    pub document: String,
    pub appendix: ReportAppendix,
}
