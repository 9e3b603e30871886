//! Reinforcement-learning action recommendation collector.
//!
//! Polls three RL model variants and analyzes cross-model agreement so the
//! report layer can flag disagreement between the baseline, current, and
//! candidate policies.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use config::ConsensusPolicy;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::{BTreeSet, HashMap};

use pl_core::traits::DataCollector;
use pl_core::types::{CollectedRecord, SourceKind};

use crate::history::History;
use crate::http::{build_client, fetch_json, number, number_map};

pub const RL_MODELS: [&str; 3] = ["baseline_model", "current_model", "new_model"];

/// Collects action recommendations from the three RL model endpoints.
pub struct RlCollector {
    client: Client,
    api_base_url: String,
    policy: ConsensusPolicy,
    history: History,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelAnalysis {
    pub model: String,
    pub successful_calls: usize,
    pub total_calls: usize,
    pub success_rate: f64,
    pub average_confidence: f64,
    pub average_expected_reward: f64,
    pub action_types_seen: Vec<String>,
    pub latest_recommendation: HashMap<String, f64>,
    pub stability: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionConsensus {
    pub average_value: f64,
    pub values_by_model: HashMap<String, f64>,
    pub consensus_level: String,
    pub participating_models: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsensusAnalysis {
    pub status: String,
    pub successful_models: Vec<String>,
    pub consensus_level: String,
    pub consensus_actions: HashMap<String, ActionConsensus>,
    pub consensus_recommendation: HashMap<String, f64>,
    pub models_analyzed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RlSummary {
    pub status: String,
    pub hours_analyzed: i64,
    pub total_action_sets: usize,
    pub model_analysis: HashMap<String, ModelAnalysis>,
    pub consensus_analysis: ConsensusAnalysis,
    pub successful_model_calls: usize,
    pub total_model_calls: usize,
    pub overall_success_rate: f64,
    pub data_quality: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FocusArea {
    pub parameter: String,
    pub average_adjustment: f64,
    pub frequency_percent: f64,
    pub priority: String,
    pub direction: String,
    pub magnitude: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationInsights {
    pub status: String,
    pub analysis_period: String,
    pub key_insights: Vec<String>,
    pub recommended_focus_areas: Vec<FocusArea>,
}

impl RlCollector {
    pub fn new(
        api_base_url: &str,
        timeout_secs: u64,
        max_history: usize,
        policy: ConsensusPolicy,
    ) -> Self {
        Self {
            client: build_client(timeout_secs),
            api_base_url: api_base_url.to_string(),
            policy,
            history: History::new(max_history),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        let slug = model.trim_end_matches("_model");
        format!("{}/api/rl_action/{}", self.api_base_url, slug)
    }

    async fn collect_model(&self, model: &str) -> Value {
        let endpoint = self.endpoint(model);
        match fetch_json(&self.client, &endpoint).await {
            Ok(data) => json!({
                "api_status": "success",
                "model_type": model,
                "recommended_actions": data.get("recommended_actions").cloned().unwrap_or_else(|| json!({})),
                "state_summary": data.get("state_summary").cloned().unwrap_or_else(|| json!({})),
                "action_confidence": number(&data, "confidence").unwrap_or(0.0),
                "expected_reward": number(&data, "expected_reward").unwrap_or(0.0),
                "model_info": data.get("model_info").cloned().unwrap_or_else(|| json!({})),
            }),
            Err(error) => json!({
                "api_status": "error",
                "error": error,
                "endpoint": endpoint,
                "model_type": model,
            }),
        }
    }

    /// Summary of recent action sets within the last `hours`.
    pub async fn summary(&self, hours: i64) -> RlSummary {
        let cutoff = Utc::now() - Duration::hours(hours);
        let records = self.history.since(cutoff).await;

        if records.is_empty() {
            return RlSummary {
                status: "no_recent_data".to_string(),
                hours_analyzed: hours,
                total_action_sets: 0,
                model_analysis: HashMap::new(),
                consensus_analysis: ConsensusAnalysis {
                    status: "no_data".to_string(),
                    successful_models: Vec::new(),
                    consensus_level: "unknown".to_string(),
                    consensus_actions: HashMap::new(),
                    consensus_recommendation: HashMap::new(),
                    models_analyzed: 0,
                },
                successful_model_calls: 0,
                total_model_calls: 0,
                overall_success_rate: 0.0,
                data_quality: "limited".to_string(),
            };
        }

        let mut model_analysis = HashMap::new();
        for model in RL_MODELS {
            model_analysis.insert(
                model.to_string(),
                self.analyze_model(&records, model),
            );
        }

        let total_model_calls = records.len() * RL_MODELS.len();
        let successful_model_calls: usize = records
            .iter()
            .map(|r| {
                RL_MODELS
                    .iter()
                    .filter(|m| r.payload[**m]["api_status"] == "success")
                    .count()
            })
            .sum();
        let overall_success_rate =
            successful_model_calls as f64 / total_model_calls as f64 * 100.0;

        RlSummary {
            status: "success".to_string(),
            hours_analyzed: hours,
            total_action_sets: records.len(),
            model_analysis,
            consensus_analysis: self.analyze_consensus(records.last().unwrap()),
            successful_model_calls,
            total_model_calls,
            overall_success_rate,
            data_quality: if overall_success_rate > 90.0 {
                "excellent".to_string()
            } else if overall_success_rate > 75.0 {
                "good".to_string()
            } else {
                "limited".to_string()
            },
        }
    }

    fn analyze_model(&self, records: &[CollectedRecord], model: &str) -> ModelAnalysis {
        let successful: Vec<&Value> = records
            .iter()
            .map(|r| &r.payload[model])
            .filter(|m| m["api_status"] == "success")
            .collect();

        if successful.is_empty() {
            return ModelAnalysis {
                model: model.to_string(),
                successful_calls: 0,
                total_calls: records.len(),
                success_rate: 0.0,
                average_confidence: 0.0,
                average_expected_reward: 0.0,
                action_types_seen: Vec::new(),
                latest_recommendation: HashMap::new(),
                stability: "no_successful_data".to_string(),
            };
        }

        let avg = |field: &str| {
            successful
                .iter()
                .map(|m| number(m, field).unwrap_or(0.0))
                .sum::<f64>()
                / successful.len() as f64
        };

        let mut action_types: BTreeSet<String> = BTreeSet::new();
        for entry in &successful {
            action_types.extend(number_map(entry, "recommended_actions").into_keys());
        }

        let stability = if successful.len() >= 3 {
            let recent: Vec<HashMap<String, f64>> = successful
                .iter()
                .rev()
                .take(3)
                .map(|m| number_map(m, "recommended_actions"))
                .collect();
            self.action_stability(&recent)
        } else {
            "insufficient_data".to_string()
        };

        ModelAnalysis {
            model: model.to_string(),
            successful_calls: successful.len(),
            total_calls: records.len(),
            success_rate: successful.len() as f64 / records.len() as f64 * 100.0,
            average_confidence: avg("action_confidence"),
            average_expected_reward: avg("expected_reward"),
            action_types_seen: action_types.into_iter().collect(),
            latest_recommendation: number_map(successful.last().unwrap(), "recommended_actions"),
            stability,
        }
    }

    /// Stability of recent action sets: share of action keys whose relative
    /// deviation from the mean exceeds the low-agreement bound.
    fn action_stability(&self, recent: &[HashMap<String, f64>]) -> String {
        if recent.len() < 2 {
            return "insufficient_data".to_string();
        }

        let mut keys: BTreeSet<&String> = BTreeSet::new();
        for actions in recent {
            keys.extend(actions.keys());
        }
        if keys.is_empty() {
            return "no_actions".to_string();
        }

        let mut high_variance = 0_usize;
        for key in &keys {
            let values: Vec<f64> = recent.iter().filter_map(|a| a.get(*key)).copied().collect();
            if values.len() < 2 {
                continue;
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let max_deviation = values
                .iter()
                .map(|v| (v - mean).abs())
                .fold(0.0_f64, f64::max);
            if mean != 0.0 && max_deviation / mean.abs() > self.policy.low_agreement {
                high_variance += 1;
            }
        }

        let total = keys.len() as f64;
        if high_variance == 0 {
            "very_stable".to_string()
        } else if high_variance as f64 <= total * 0.3 {
            "stable".to_string()
        } else if high_variance as f64 <= total * 0.6 {
            "moderate".to_string()
        } else {
            "unstable".to_string()
        }
    }

    /// Cross-model agreement on the latest action set.
    fn analyze_consensus(&self, latest: &CollectedRecord) -> ConsensusAnalysis {
        let mut successful_models = Vec::new();
        let mut recommendations: HashMap<String, HashMap<String, f64>> = HashMap::new();

        for model in RL_MODELS {
            let data = &latest.payload[model];
            if data["api_status"] == "success" {
                successful_models.push(model.to_string());
                recommendations.insert(model.to_string(), number_map(data, "recommended_actions"));
            }
        }

        if successful_models.len() < 2 {
            return ConsensusAnalysis {
                status: "insufficient_models".to_string(),
                successful_models,
                consensus_level: "unknown".to_string(),
                consensus_actions: HashMap::new(),
                consensus_recommendation: HashMap::new(),
                models_analyzed: recommendations.len(),
            };
        }

        let mut keys: BTreeSet<String> = BTreeSet::new();
        for actions in recommendations.values() {
            keys.extend(actions.keys().cloned());
        }

        let mut consensus_actions = HashMap::new();
        let mut consensus_level = "high";
        for key in keys {
            let mut values = Vec::new();
            let mut participants = Vec::new();
            for (model, actions) in &recommendations {
                if let Some(value) = actions.get(&key) {
                    values.push(*value);
                    participants.push(model.clone());
                }
            }
            if values.len() < 2 {
                continue;
            }

            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let max_deviation = values
                .iter()
                .map(|v| (v - mean).abs())
                .fold(0.0_f64, f64::max);

            let action_level = if mean == 0.0 {
                if max_deviation < 0.1 { "high" } else { "low" }
            } else {
                let relative = max_deviation / mean.abs();
                if relative > self.policy.low_agreement {
                    "low"
                } else if relative > self.policy.medium_agreement {
                    "medium"
                } else {
                    "high"
                }
            };

            if action_level == "low" {
                consensus_level = "low";
            } else if action_level == "medium" && consensus_level == "high" {
                consensus_level = "medium";
            }

            consensus_actions.insert(
                key,
                ActionConsensus {
                    average_value: mean,
                    values_by_model: participants.iter().cloned().zip(values.clone()).collect(),
                    consensus_level: action_level.to_string(),
                    participating_models: participants,
                },
            );
        }

        let consensus_recommendation = consensus_actions
            .iter()
            .filter(|(_, a)| a.consensus_level != "low")
            .map(|(k, a)| (k.clone(), a.average_value))
            .collect();

        ConsensusAnalysis {
            status: "success".to_string(),
            models_analyzed: successful_models.len(),
            successful_models,
            consensus_level: consensus_level.to_string(),
            consensus_actions,
            consensus_recommendation,
        }
    }

    /// Process-optimization focus areas aggregated over the last 10 action
    /// sets across all models.
    pub async fn optimization_insights(&self) -> Option<OptimizationInsights> {
        let recent = self.history.recent(10).await;
        if recent.is_empty() {
            return None;
        }

        let mut action_values: HashMap<String, Vec<f64>> = HashMap::new();
        for record in &recent {
            for model in RL_MODELS {
                let data = &record.payload[model];
                if data["api_status"] != "success" {
                    continue;
                }
                for (key, value) in number_map(data, "recommended_actions") {
                    if value.abs() > 0.01 {
                        action_values.entry(key).or_default().push(value);
                    }
                }
            }
        }

        let total_calls = (recent.len() * RL_MODELS.len()) as f64;
        let mut focus_areas: Vec<FocusArea> = action_values
            .into_iter()
            .filter(|(_, values)| values.len() >= 3)
            .filter_map(|(parameter, values)| {
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                let frequency = values.len() as f64 / total_calls * 100.0;
                if frequency <= 50.0 {
                    return None;
                }
                let priority = if mean.abs() > 0.5 {
                    "high"
                } else if mean.abs() > 0.2 {
                    "medium"
                } else {
                    "low"
                };
                Some(FocusArea {
                    parameter,
                    average_adjustment: mean,
                    frequency_percent: frequency,
                    priority: priority.to_string(),
                    direction: if mean > 0.0 { "increase" } else { "decrease" }.to_string(),
                    magnitude: if mean.abs() > 0.5 {
                        "large"
                    } else if mean.abs() > 0.2 {
                        "medium"
                    } else {
                        "small"
                    }
                    .to_string(),
                })
            })
            .collect();

        focus_areas.sort_by(|a, b| {
            (b.priority == "high", b.frequency_percent)
                .partial_cmp(&(a.priority == "high", a.frequency_percent))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut key_insights = Vec::new();
        if let Some(top) = focus_areas.first() {
            key_insights.push(format!(
                "Primary optimization target: {} ({} by {:.3})",
                top.parameter,
                top.direction,
                top.average_adjustment.abs()
            ));
            let high_count = focus_areas.iter().filter(|a| a.priority == "high").count();
            if high_count > 3 {
                key_insights.push(format!(
                    "Multiple high-priority areas detected ({high_count}), suggesting system-wide optimization opportunity"
                ));
            } else if high_count == 0 {
                key_insights.push(
                    "Process appears well-optimized with only minor adjustments recommended"
                        .to_string(),
                );
            }
        } else {
            key_insights.push(
                "No consistent optimization patterns detected - process may be well-optimized"
                    .to_string(),
            );
        }

        Some(OptimizationInsights {
            status: "success".to_string(),
            analysis_period: format!("Last {} action sets", recent.len()),
            key_insights,
            recommended_focus_areas: focus_areas,
        })
    }
}

#[async_trait]
impl DataCollector for RlCollector {
    async fn collect(&self) -> CollectedRecord {
        let (baseline, current, new) = tokio::join!(
            self.collect_model("baseline_model"),
            self.collect_model("current_model"),
            self.collect_model("new_model"),
        );

        let payload = json!({
            "baseline_model": baseline,
            "current_model": current,
            "new_model": new,
        });

        let any_success = RL_MODELS
            .iter()
            .any(|m| payload[*m]["api_status"] == "success");

        let record = if any_success {
            tracing::info!("Collected RL action data");
            CollectedRecord::success(SourceKind::RlActions, payload)
        } else {
            let error = payload["baseline_model"]["error"]
                .as_str()
                .unwrap_or("rl endpoints unavailable")
                .to_string();
            tracing::warn!(error = %error, "RL collection failed");
            let mut record = CollectedRecord::failure(SourceKind::RlActions, error);
            record.payload = payload;
            record
        };

        self.history.push(record.clone()).await;
        record
    }

    fn source(&self) -> SourceKind {
        SourceKind::RlActions
    }

    async fn history(&self, limit: usize) -> Vec<CollectedRecord> {
        self.history.recent(limit).await
    }

    async fn clear_history(&self) {
        self.history.clear().await;
        tracing::info!("RL action history cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> RlCollector {
        RlCollector::new("http://127.0.0.1:9", 1, 20, ConsensusPolicy::default())
    }

    fn action_set(baseline: f64, current: f64, new: f64) -> CollectedRecord {
        let model = |value: f64| {
            json!({
                "api_status": "success",
                "recommended_actions": { "tbl_speed": value },
                "action_confidence": 0.8,
                "expected_reward": 0.7,
            })
        };
        CollectedRecord::success(
            SourceKind::RlActions,
            json!({
                "baseline_model": model(baseline),
                "current_model": model(current),
                "new_model": model(new),
            }),
        )
    }

    #[tokio::test]
    async fn test_consensus_high_agreement() {
        let collector = collector();
        collector.history.push(action_set(0.50, 0.52, 0.48)).await;

        let summary = collector.summary(6).await;
        assert_eq!(summary.consensus_analysis.consensus_level, "high");
        assert_eq!(summary.consensus_analysis.models_analyzed, 3);
        assert!(
            summary
                .consensus_analysis
                .consensus_recommendation
                .contains_key("tbl_speed")
        );
    }

    #[tokio::test]
    async fn test_consensus_low_agreement() {
        let collector = collector();
        // baseline far off the mean: deviation / |mean| > 0.5
        collector.history.push(action_set(2.0, 0.5, 0.5)).await;

        let summary = collector.summary(6).await;
        assert_eq!(summary.consensus_analysis.consensus_level, "low");
        assert!(
            summary
                .consensus_analysis
                .consensus_recommendation
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_consensus_requires_two_models() {
        let collector = collector();
        let record = CollectedRecord::success(
            SourceKind::RlActions,
            json!({
                "baseline_model": { "api_status": "success", "recommended_actions": {} },
                "current_model": { "api_status": "error", "error": "HTTP 500" },
                "new_model": { "api_status": "error", "error": "HTTP 500" },
            }),
        );
        collector.history.push(record).await;

        let summary = collector.summary(6).await;
        assert_eq!(summary.consensus_analysis.status, "insufficient_models");
    }

    #[tokio::test]
    async fn test_model_stability() {
        let collector = collector();
        for _ in 0..3 {
            collector.history.push(action_set(0.5, 0.5, 0.5)).await;
        }

        let summary = collector.summary(6).await;
        let baseline = &summary.model_analysis["baseline_model"];
        assert_eq!(baseline.stability, "very_stable");
        assert_eq!(baseline.success_rate, 100.0);
        assert_eq!(baseline.action_types_seen, vec!["tbl_speed".to_string()]);
    }

    #[tokio::test]
    async fn test_success_rate_counts_models() {
        let collector = collector();
        let record = CollectedRecord::success(
            SourceKind::RlActions,
            json!({
                "baseline_model": { "api_status": "success", "recommended_actions": {} },
                "current_model": { "api_status": "success", "recommended_actions": {} },
                "new_model": { "api_status": "error", "error": "HTTP 502" },
            }),
        );
        collector.history.push(record).await;

        let summary = collector.summary(6).await;
        assert_eq!(summary.total_model_calls, 3);
        assert_eq!(summary.successful_model_calls, 2);
        assert!((summary.overall_success_rate - 66.666).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_optimization_insights_focus_areas() {
        let collector = collector();
        for _ in 0..4 {
            collector.history.push(action_set(0.6, 0.65, 0.62)).await;
        }

        let insights = collector.optimization_insights().await.unwrap();
        assert_eq!(insights.recommended_focus_areas.len(), 1);
        let area = &insights.recommended_focus_areas[0];
        assert_eq!(area.parameter, "tbl_speed");
        assert_eq!(area.priority, "high");
        assert_eq!(area.direction, "increase");
        assert!(insights.key_insights[0].contains("tbl_speed"));
    }

    #[tokio::test]
    async fn test_optimization_insights_empty_history() {
        let collector = collector();
        assert!(collector.optimization_insights().await.is_none());
    }

    #[test]
    fn test_endpoint_slug() {
        let collector = collector();
        assert_eq!(
            collector.endpoint("baseline_model"),
            "http://127.0.0.1:9/api/rl_action/baseline"
        );
    }
}
