//! Metric extraction from one collection cycle.
//!
//! Reads only sources whose payload carries a success marker; everything
//! else stays at the sentinel defaults so the narrative layers never have
//! to guess at missing data.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

use collectors::parse_forecast_points;
use pl_core::types::{CollectedRecord, MetricsSnapshot, SystemHealth};

/// Model preference order when reading the RL record: the production
/// policy first, then the baseline, then the candidate.
const RL_MODEL_PREFERENCE: [&str; 3] = ["current_model", "baseline_model", "new_model"];

/// Number of upstream sources the success rate is computed against:
/// defect classification, quality, forecasting, RL actions.
pub const TOTAL_SOURCES: usize = 4;

/// The joined output of one concurrent collection fan-out.
///
/// The classification record carries both the defect and the quality
/// sub-payloads; they count as two separate sources for health purposes.
#[derive(Debug, Clone)]
pub struct CollectedBundle {
    pub timestamp: DateTime<Utc>,
    pub classification: CollectedRecord,
    pub forecasting: CollectedRecord,
    pub rl_actions: CollectedRecord,
    pub collection_errors: Vec<String>,
}

impl CollectedBundle {
    pub fn defect_available(&self) -> bool {
        self.classification.payload["defect_prediction"]["api_status"] == "success"
    }

    pub fn quality_available(&self) -> bool {
        self.classification.payload["quality_prediction"]["api_status"] == "success"
    }

    pub fn forecast_available(&self) -> bool {
        self.forecasting.is_success()
    }

    pub fn rl_available(&self) -> bool {
        self.rl_actions.is_success()
    }

    pub fn successful_sources(&self) -> usize {
        [
            self.defect_available(),
            self.quality_available(),
            self.forecast_available(),
            self.rl_available(),
        ]
        .iter()
        .filter(|ok| **ok)
        .count()
    }

    /// Per-service availability map for the report's data-source listing.
    pub fn data_sources(&self) -> HashMap<String, String> {
        let availability = |ok: bool| {
            if ok { "Available" } else { "Unavailable" }.to_string()
        };
        HashMap::from([
            (
                "ML Classification Service".to_string(),
                availability(self.defect_available()),
            ),
            (
                "Quality Assessment Service".to_string(),
                availability(self.quality_available()),
            ),
            (
                "Time Series Forecasting Service".to_string(),
                availability(self.forecast_available()),
            ),
            (
                "Reinforcement Learning Service".to_string(),
                availability(self.rl_available()),
            ),
        ])
    }
}

fn number(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

fn number_map(value: &Value) -> HashMap<String, f64> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
                .collect()
        })
        .unwrap_or_default()
}

/// Risk bucket derived from the defect probability when the upstream model
/// supplied none.
fn derive_risk_level(probability: f64) -> &'static str {
    if probability > 0.8 {
        "critical"
    } else if probability > 0.6 {
        "high"
    } else if probability > 0.4 {
        "medium"
    } else if probability > 0.2 {
        "low"
    } else {
        "very low"
    }
}

/// Numeric score for a quality class label.
fn quality_class_score(class: &str) -> f64 {
    match class.to_lowercase().as_str() {
        "high" => 0.9,
        "medium" => 0.7,
        "low" => 0.4,
        _ => 0.0,
    }
}

/// Derives a [`MetricsSnapshot`] from the latest collection bundle.
///
/// Absent or failed sources leave their fields at the sentinel defaults;
/// the success rate is exactly `successful / total * 100`.
pub fn extract_metrics(bundle: &CollectedBundle) -> MetricsSnapshot {
    let mut metrics = MetricsSnapshot {
        data_collection_time: bundle.timestamp,
        ..MetricsSnapshot::default()
    };

    if bundle.defect_available() {
        let defect = &bundle.classification.payload["defect_prediction"];
        let probability = number(defect, "defect_probability").unwrap_or(0.0);
        metrics.defect_probability = Some(probability);
        metrics.defect_confidence = number(defect, "confidence");
        let upstream_risk = defect["risk_level"].as_str().unwrap_or("unknown");
        metrics.risk_level = if upstream_risk == "unknown" {
            derive_risk_level(probability).to_string()
        } else {
            upstream_risk.to_string()
        };
    }

    if bundle.quality_available() {
        let quality = &bundle.classification.payload["quality_prediction"];
        let class = quality["quality_class"].as_str().unwrap_or("unknown");
        metrics.quality_class = class.to_string();
        metrics.quality_score = Some(quality_class_score(class));
        metrics.quality_confidence = number(quality, "confidence");
        metrics.class_probabilities = number_map(&quality["class_probabilities"]);
    }

    if bundle.forecast_available() {
        let payload = &bundle.forecasting.payload;
        metrics.forecast_horizon = number(payload, "forecast_horizon").map(|h| h as u32);
        let points = parse_forecast_points(payload);
        metrics.forecast_points = points.len();
        if let Some(last) = points.last() {
            metrics.predicted_waste = Some(last.waste);
            metrics.predicted_production = Some(last.produced);
        }
        metrics.forecast_preview = points.into_iter().take(5).collect();
    }

    if bundle.rl_available() {
        let payload = &bundle.rl_actions.payload;
        if let Some(model) = RL_MODEL_PREFERENCE
            .iter()
            .find(|m| payload[**m]["api_status"] == "success")
        {
            let rl = &payload[*model];
            metrics.rl_model_type = (*model).to_string();
            metrics.recommended_actions = number_map(&rl["recommended_actions"]);
            metrics.action_confidence = number(rl, "action_confidence");
            metrics.expected_reward = number(rl, "expected_reward");
        }
    }

    let successful = bundle.successful_sources();
    metrics.collection_success_rate = successful as f64 / TOTAL_SOURCES as f64 * 100.0;
    metrics.system_health =
        SystemHealth::new(successful, TOTAL_SOURCES, bundle.collection_errors.len());

    tracing::info!(
        successful,
        total = TOTAL_SOURCES,
        success_rate = metrics.collection_success_rate,
        "Extracted metrics snapshot"
    );
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use pl_core::types::{HealthState, SourceKind};
    use serde_json::json;

    fn classification_record(defect_ok: bool, quality_ok: bool) -> CollectedRecord {
        let defect = if defect_ok {
            json!({
                "api_status": "success",
                "defect_probability": 0.82,
                "risk_level": "high",
                "confidence": 0.91,
            })
        } else {
            json!({ "api_status": "error", "error": "timeout" })
        };
        let quality = if quality_ok {
            json!({
                "api_status": "success",
                "quality_class": "Low",
                "confidence": 0.6,
                "class_probabilities": { "High": 0.1, "Medium": 0.3, "Low": 0.6 },
            })
        } else {
            json!({ "api_status": "error", "error": "timeout" })
        };
        CollectedRecord::success(
            SourceKind::Classification,
            json!({ "defect_prediction": defect, "quality_prediction": quality }),
        )
    }

    fn forecast_record() -> CollectedRecord {
        CollectedRecord::success(
            SourceKind::Forecasting,
            json!({
                "api_status": "success",
                "forecast_horizon": 30.0,
                "forecast": [
                    { "sensors": { "waste": 900.0, "produced": 20.0, "ejection": 150.0, "tbl_speed": 118.0 } },
                    { "sensors": { "waste": 1100.0, "produced": 18.0, "ejection": 155.0, "tbl_speed": 120.0 } },
                ],
            }),
        )
    }

    fn rl_record() -> CollectedRecord {
        CollectedRecord::success(
            SourceKind::RlActions,
            json!({
                "baseline_model": { "api_status": "error", "error": "HTTP 500" },
                "current_model": {
                    "api_status": "success",
                    "recommended_actions": { "tbl_speed": 0.25, "compression": -0.1 },
                    "action_confidence": 0.8,
                    "expected_reward": 0.75,
                },
                "new_model": { "api_status": "error", "error": "HTTP 500" },
            }),
        )
    }

    fn bundle(
        classification: CollectedRecord,
        forecasting: CollectedRecord,
        rl_actions: CollectedRecord,
        errors: usize,
    ) -> CollectedBundle {
        CollectedBundle {
            timestamp: Utc::now(),
            classification,
            forecasting,
            rl_actions,
            collection_errors: (0..errors).map(|i| format!("source {i} unavailable")).collect(),
        }
    }

    #[test]
    fn test_full_extraction() {
        let bundle = bundle(
            classification_record(true, true),
            forecast_record(),
            rl_record(),
            0,
        );
        let metrics = extract_metrics(&bundle);

        assert_eq!(metrics.defect_probability, Some(0.82));
        assert_eq!(metrics.risk_level, "high");
        assert_eq!(metrics.quality_class, "Low");
        assert_eq!(metrics.quality_score, Some(0.4));
        assert_eq!(metrics.forecast_horizon, Some(30));
        assert_eq!(metrics.forecast_points, 2);
        assert_eq!(metrics.predicted_waste, Some(1100.0));
        assert_eq!(metrics.predicted_production, Some(18.0));
        assert_eq!(metrics.rl_model_type, "current_model");
        assert_eq!(metrics.recommended_actions["tbl_speed"], 0.25);
        assert_eq!(metrics.collection_success_rate, 100.0);
        assert_eq!(metrics.system_health.overall_status, HealthState::Healthy);
    }

    #[test]
    fn test_partial_failure_rates() {
        let bundle = bundle(
            classification_record(true, true),
            CollectedRecord::failure(SourceKind::Forecasting, "timeout"),
            CollectedRecord::failure(SourceKind::RlActions, "timeout"),
            2,
        );
        let metrics = extract_metrics(&bundle);

        assert_eq!(metrics.collection_success_rate, 50.0);
        assert_eq!(metrics.system_health.successful_sources, 2);
        assert_eq!(metrics.system_health.overall_status, HealthState::Degraded);
        assert_eq!(metrics.defect_probability, Some(0.82));
        // Failed sources stay at sentinel defaults.
        assert!(metrics.predicted_waste.is_none());
        assert!(metrics.recommended_actions.is_empty());
    }

    #[test]
    fn test_all_sources_down() {
        let mut classification = CollectedRecord::failure(SourceKind::Classification, "down");
        classification.payload = json!({
            "defect_prediction": { "api_status": "error", "error": "down" },
            "quality_prediction": { "api_status": "error", "error": "down" },
        });
        let bundle = bundle(
            classification,
            CollectedRecord::failure(SourceKind::Forecasting, "down"),
            CollectedRecord::failure(SourceKind::RlActions, "down"),
            4,
        );
        let metrics = extract_metrics(&bundle);

        assert_eq!(metrics.collection_success_rate, 0.0);
        assert_eq!(metrics.system_health.overall_status, HealthState::Critical);
        assert!(metrics.defect_probability.is_none());
        assert_eq!(metrics.risk_level, "unknown");
        assert_eq!(metrics.quality_class, "unknown");
    }

    #[test]
    fn test_derived_risk_level_when_upstream_unknown() {
        let mut record = classification_record(true, false);
        record.payload["defect_prediction"]["risk_level"] = json!("unknown");
        record.payload["defect_prediction"]["defect_probability"] = json!(0.05);

        let bundle = bundle(
            record,
            CollectedRecord::failure(SourceKind::Forecasting, "down"),
            CollectedRecord::failure(SourceKind::RlActions, "down"),
            3,
        );
        let metrics = extract_metrics(&bundle);
        assert_eq!(metrics.risk_level, "very low");
    }

    #[test]
    fn test_risk_bucket_table() {
        assert_eq!(derive_risk_level(0.85), "critical");
        assert_eq!(derive_risk_level(0.65), "high");
        assert_eq!(derive_risk_level(0.45), "medium");
        assert_eq!(derive_risk_level(0.25), "low");
        assert_eq!(derive_risk_level(0.05), "very low");
    }

    #[test]
    fn test_quality_class_scores() {
        assert_eq!(quality_class_score("High"), 0.9);
        assert_eq!(quality_class_score("Medium"), 0.7);
        assert_eq!(quality_class_score("Low"), 0.4);
        assert_eq!(quality_class_score("unknown"), 0.0);
    }

    #[test]
    fn test_data_sources_availability_map() {
        let bundle = bundle(
            classification_record(true, false),
            forecast_record(),
            CollectedRecord::failure(SourceKind::RlActions, "down"),
            2,
        );
        let sources = bundle.data_sources();
        assert_eq!(sources["ML Classification Service"], "Available");
        assert_eq!(sources["Quality Assessment Service"], "Unavailable");
        assert_eq!(sources["Time Series Forecasting Service"], "Available");
        assert_eq!(sources["Reinforcement Learning Service"], "Unavailable");
    }
}
