//! Defect classification and quality prediction collector.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashMap;

use pl_core::traits::DataCollector;
use pl_core::types::{CollectedRecord, SourceKind};

use crate::history::History;
use crate::http::{build_client, fetch_json, number};

/// Collects defect-prediction and quality-classification data from the
/// upstream prediction APIs.
pub struct ClassificationCollector {
    client: Client,
    defect_endpoint: String,
    quality_endpoint: String,
    history: History,
}

#[derive(Debug, Clone, Serialize)]
pub struct DefectAnalysis {
    pub total_predictions: usize,
    pub average_defect_probability: f64,
    pub max_defect_probability: f64,
    pub min_defect_probability: f64,
    pub current_defect_probability: f64,
    pub trend: String,
    pub current_risk_level: String,
    pub risk_distribution: HashMap<String, usize>,
    pub confidence_avg: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityAnalysis {
    pub total_predictions: usize,
    pub class_distribution: HashMap<String, usize>,
    pub most_common_class: String,
    pub current_quality_class: String,
    pub current_confidence: f64,
    pub average_confidence: f64,
    pub quality_stability: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationSummary {
    pub status: String,
    pub hours_analyzed: i64,
    pub total_classifications: usize,
    pub defect_analysis: Option<DefectAnalysis>,
    pub quality_analysis: Option<QualityAnalysis>,
    pub successful_defect_predictions: usize,
    pub successful_quality_predictions: usize,
    pub overall_success_rate: f64,
    pub data_quality: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub status: String,
    pub overall_risk_level: String,
    pub risk_score: u32,
    pub risk_factors: Vec<String>,
    pub defect_probability: Option<f64>,
    pub quality_class: Option<String>,
}

impl ClassificationCollector {
    pub fn new(api_base_url: &str, timeout_secs: u64, max_history: usize) -> Self {
        Self {
            client: build_client(timeout_secs),
            defect_endpoint: format!("{api_base_url}/api/defect"),
            quality_endpoint: format!("{api_base_url}/api/quality"),
            history: History::new(max_history),
        }
    }

    async fn collect_defect(&self) -> Value {
        match fetch_json(&self.client, &self.defect_endpoint).await {
            Ok(data) => json!({
                "api_status": "success",
                "defect_probability": number(&data, "defect_probability").unwrap_or(0.0),
                "risk_level": data.get("risk_level").and_then(Value::as_str).unwrap_or("unknown"),
                "confidence": number(&data, "confidence").unwrap_or(0.0),
                "model_info": data.get("model_info").cloned().unwrap_or_else(|| json!({})),
                "features_used": data.get("features_used").cloned().unwrap_or_else(|| json!([])),
            }),
            Err(error) => json!({
                "api_status": "error",
                "error": error,
                "endpoint": self.defect_endpoint,
            }),
        }
    }

    async fn collect_quality(&self) -> Value {
        match fetch_json(&self.client, &self.quality_endpoint).await {
            Ok(data) => json!({
                "api_status": "success",
                "quality_class": data.get("quality_class").and_then(Value::as_str).unwrap_or("unknown"),
                "confidence": number(&data, "confidence").unwrap_or(0.0),
                "class_probabilities": data.get("class_probabilities").cloned().unwrap_or_else(|| json!({})),
                "model_info": data.get("model_info").cloned().unwrap_or_else(|| json!({})),
                "features_used": data.get("features_used").cloned().unwrap_or_else(|| json!([])),
            }),
            Err(error) => json!({
                "api_status": "error",
                "error": error,
                "endpoint": self.quality_endpoint,
            }),
        }
    }

    /// Summary of recent classification data within the last `hours`.
    pub async fn summary(&self, hours: i64) -> ClassificationSummary {
        let cutoff = Utc::now() - Duration::hours(hours);
        let records = self.history.since(cutoff).await;

        if records.is_empty() {
            return ClassificationSummary {
                status: "no_recent_data".to_string(),
                hours_analyzed: hours,
                total_classifications: 0,
                defect_analysis: None,
                quality_analysis: None,
                successful_defect_predictions: 0,
                successful_quality_predictions: 0,
                overall_success_rate: 0.0,
                data_quality: "limited".to_string(),
            };
        }

        let successful_defect = records
            .iter()
            .filter(|r| sub_status(&r.payload, "defect_prediction") == "success")
            .count();
        let successful_quality = records
            .iter()
            .filter(|r| sub_status(&r.payload, "quality_prediction") == "success")
            .count();

        let overall_success_rate = (successful_defect + successful_quality) as f64
            / (records.len() * 2) as f64
            * 100.0;

        ClassificationSummary {
            status: "success".to_string(),
            hours_analyzed: hours,
            total_classifications: records.len(),
            defect_analysis: analyze_defect_predictions(&records),
            quality_analysis: analyze_quality_predictions(&records),
            successful_defect_predictions: successful_defect,
            successful_quality_predictions: successful_quality,
            overall_success_rate,
            data_quality: grade_data_quality(overall_success_rate).to_string(),
        }
    }

    /// Risk assessment based on the latest record: weighted defect and
    /// quality risk factors rolled up to a scored level.
    pub async fn risk_assessment(&self) -> Option<RiskAssessment> {
        let latest = self.history.recent(1).await.into_iter().next()?;
        let defect = &latest.payload["defect_prediction"];
        let quality = &latest.payload["quality_prediction"];

        let mut risk_factors = Vec::new();
        let mut score = 0_u32;

        let defect_probability = if defect["api_status"] == "success" {
            let prob = number(defect, "defect_probability").unwrap_or(0.0);
            if prob > 0.7 {
                risk_factors.push("Critical defect probability detected".to_string());
                score += 40;
            } else if prob > 0.5 {
                risk_factors.push("High defect probability".to_string());
                score += 25;
            } else if prob > 0.3 {
                risk_factors.push("Moderate defect risk".to_string());
                score += 15;
            }
            Some(prob)
        } else {
            risk_factors.push("Defect prediction system unavailable".to_string());
            score += 20;
            None
        };

        let quality_class = if quality["api_status"] == "success" {
            let class = quality["quality_class"].as_str().unwrap_or("unknown");
            match class.to_lowercase().as_str() {
                "low" | "poor" => {
                    risk_factors.push("Poor quality classification".to_string());
                    score += 30;
                }
                "medium" => {
                    risk_factors.push("Medium quality classification".to_string());
                    score += 15;
                }
                _ => {}
            }
            Some(class.to_string())
        } else {
            risk_factors.push("Quality prediction system unavailable".to_string());
            score += 15;
            None
        };

        let overall_risk_level = if score >= 60 {
            "critical"
        } else if score >= 40 {
            "high"
        } else if score >= 20 {
            "medium"
        } else {
            "low"
        };

        Some(RiskAssessment {
            status: "success".to_string(),
            overall_risk_level: overall_risk_level.to_string(),
            risk_score: score,
            risk_factors,
            defect_probability,
            quality_class,
        })
    }
}

#[async_trait]
impl DataCollector for ClassificationCollector {
    async fn collect(&self) -> CollectedRecord {
        let (defect, quality) = tokio::join!(self.collect_defect(), self.collect_quality());

        let payload = json!({
            "defect_prediction": defect,
            "quality_prediction": quality,
        });

        let record = if payload["defect_prediction"]["api_status"] == "success"
            || payload["quality_prediction"]["api_status"] == "success"
        {
            tracing::info!("Collected classification data");
            CollectedRecord::success(SourceKind::Classification, payload)
        } else {
            let error = payload["defect_prediction"]["error"]
                .as_str()
                .unwrap_or("classification endpoints unavailable")
                .to_string();
            tracing::warn!(error = %error, "Classification collection failed");
            let mut record = CollectedRecord::failure(SourceKind::Classification, error);
            record.payload = payload;
            record
        };

        self.history.push(record.clone()).await;
        record
    }

    fn source(&self) -> SourceKind {
        SourceKind::Classification
    }

    async fn history(&self, limit: usize) -> Vec<CollectedRecord> {
        self.history.recent(limit).await
    }

    async fn clear_history(&self) {
        self.history.clear().await;
        tracing::info!("Classification history cleared");
    }
}

fn sub_status<'a>(payload: &'a Value, key: &str) -> &'a str {
    payload[key]["api_status"].as_str().unwrap_or("error")
}

fn grade_data_quality(success_rate: f64) -> &'static str {
    if success_rate > 90.0 {
        "excellent"
    } else if success_rate > 75.0 {
        "good"
    } else {
        "limited"
    }
}

/// Three-point moving trend: the average of the last three values against
/// the first three, with a 10% dead band.
fn three_point_trend(values: &[f64]) -> String {
    if values.len() < 2 {
        return "insufficient_data".to_string();
    }
    let head = &values[..values.len().min(3)];
    let tail = &values[values.len().saturating_sub(3)..];
    let earlier: f64 = head.iter().sum::<f64>() / head.len() as f64;
    let recent: f64 = tail.iter().sum::<f64>() / tail.len() as f64;

    if recent > earlier * 1.1 {
        "increasing".to_string()
    } else if recent < earlier * 0.9 {
        "decreasing".to_string()
    } else {
        "stable".to_string()
    }
}

fn analyze_defect_predictions(records: &[CollectedRecord]) -> Option<DefectAnalysis> {
    let successful: Vec<&Value> = records
        .iter()
        .filter(|r| sub_status(&r.payload, "defect_prediction") == "success")
        .map(|r| &r.payload["defect_prediction"])
        .collect();

    let probs: Vec<f64> = successful
        .iter()
        .filter_map(|d| number(d, "defect_probability"))
        .collect();
    if probs.is_empty() {
        return None;
    }

    let current = *probs.last().unwrap_or(&0.0);
    let current_risk = if current > 0.7 {
        "critical"
    } else if current > 0.5 {
        "high"
    } else if current > 0.3 {
        "medium"
    } else {
        "low"
    };

    let mut risk_distribution: HashMap<String, usize> = HashMap::new();
    for entry in &successful {
        let level = entry["risk_level"].as_str().unwrap_or("unknown");
        *risk_distribution.entry(level.to_string()).or_insert(0) += 1;
    }

    let confidence_sum: f64 = successful
        .iter()
        .map(|d| number(d, "confidence").unwrap_or(0.0))
        .sum();

    Some(DefectAnalysis {
        total_predictions: successful.len(),
        average_defect_probability: probs.iter().sum::<f64>() / probs.len() as f64,
        max_defect_probability: probs.iter().copied().fold(f64::MIN, f64::max),
        min_defect_probability: probs.iter().copied().fold(f64::MAX, f64::min),
        current_defect_probability: current,
        trend: three_point_trend(&probs),
        current_risk_level: current_risk.to_string(),
        risk_distribution,
        confidence_avg: confidence_sum / successful.len() as f64,
    })
}

fn analyze_quality_predictions(records: &[CollectedRecord]) -> Option<QualityAnalysis> {
    let successful: Vec<&Value> = records
        .iter()
        .filter(|r| sub_status(&r.payload, "quality_prediction") == "success")
        .map(|r| &r.payload["quality_prediction"])
        .collect();
    if successful.is_empty() {
        return None;
    }

    let classes: Vec<String> = successful
        .iter()
        .map(|q| q["quality_class"].as_str().unwrap_or("unknown").to_string())
        .collect();

    let mut class_distribution: HashMap<String, usize> = HashMap::new();
    for class in &classes {
        *class_distribution.entry(class.clone()).or_insert(0) += 1;
    }
    let most_common_class = class_distribution
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(class, _)| class.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let confidences: Vec<f64> = successful
        .iter()
        .filter_map(|q| number(q, "confidence"))
        .collect();
    let average_confidence = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64
    };

    let recent_classes: std::collections::HashSet<&String> =
        classes.iter().rev().take(5).collect();
    let quality_stability = if recent_classes.len() <= 2 {
        "stable"
    } else {
        "variable"
    };

    let current = successful.last().unwrap();
    Some(QualityAnalysis {
        total_predictions: successful.len(),
        class_distribution,
        most_common_class,
        current_quality_class: current["quality_class"]
            .as_str()
            .unwrap_or("unknown")
            .to_string(),
        current_confidence: number(current, "confidence").unwrap_or(0.0),
        average_confidence,
        quality_stability: quality_stability.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification_record(defect_prob: f64, risk: &str, quality: &str) -> CollectedRecord {
        CollectedRecord::success(
            SourceKind::Classification,
            json!({
                "defect_prediction": {
                    "api_status": "success",
                    "defect_probability": defect_prob,
                    "risk_level": risk,
                    "confidence": 0.9,
                },
                "quality_prediction": {
                    "api_status": "success",
                    "quality_class": quality,
                    "confidence": 0.8,
                },
            }),
        )
    }

    #[test]
    fn test_three_point_trend() {
        assert_eq!(three_point_trend(&[0.1]), "insufficient_data");
        assert_eq!(three_point_trend(&[0.1, 0.1, 0.1, 0.11]), "stable");
        assert_eq!(three_point_trend(&[0.1, 0.1, 0.1, 0.5, 0.5, 0.5]), "increasing");
        assert_eq!(three_point_trend(&[0.5, 0.5, 0.5, 0.1, 0.1, 0.1]), "decreasing");
    }

    #[test]
    fn test_defect_analysis_risk_buckets() {
        let records = vec![
            classification_record(0.2, "low", "High"),
            classification_record(0.75, "high", "High"),
        ];
        let analysis = analyze_defect_predictions(&records).unwrap();
        assert_eq!(analysis.current_risk_level, "critical");
        assert_eq!(analysis.max_defect_probability, 0.75);
        assert_eq!(analysis.min_defect_probability, 0.2);
        assert_eq!(analysis.risk_distribution["low"], 1);
        assert_eq!(analysis.risk_distribution["high"], 1);
    }

    #[test]
    fn test_quality_analysis_stability() {
        let records = vec![
            classification_record(0.1, "low", "High"),
            classification_record(0.1, "low", "High"),
            classification_record(0.1, "low", "Medium"),
        ];
        let analysis = analyze_quality_predictions(&records).unwrap();
        assert_eq!(analysis.quality_stability, "stable");
        assert_eq!(analysis.most_common_class, "High");
        assert_eq!(analysis.current_quality_class, "Medium");
    }

    #[test]
    fn test_analysis_skips_error_records() {
        let mut error_record = CollectedRecord::failure(SourceKind::Classification, "HTTP 500");
        error_record.payload = json!({
            "defect_prediction": { "api_status": "error", "error": "HTTP 500" },
            "quality_prediction": { "api_status": "error", "error": "HTTP 500" },
        });

        assert!(analyze_defect_predictions(&[error_record.clone()]).is_none());
        assert!(analyze_quality_predictions(&[error_record]).is_none());
    }

    #[tokio::test]
    async fn test_summary_without_data() {
        let collector = ClassificationCollector::new("http://127.0.0.1:9", 1, 10);
        let summary = collector.summary(6).await;
        assert_eq!(summary.status, "no_recent_data");
        assert_eq!(summary.total_classifications, 0);
    }

    #[tokio::test]
    async fn test_risk_assessment_scoring() {
        let collector = ClassificationCollector::new("http://127.0.0.1:9", 1, 10);
        collector
            .history
            .push(classification_record(0.8, "high", "Low"))
            .await;

        let assessment = collector.risk_assessment().await.unwrap();
        // 40 for critical defect probability + 30 for poor quality class.
        assert_eq!(assessment.risk_score, 70);
        assert_eq!(assessment.overall_risk_level, "critical");
        assert_eq!(assessment.risk_factors.len(), 2);
        assert_eq!(assessment.defect_probability, Some(0.8));
    }
}
