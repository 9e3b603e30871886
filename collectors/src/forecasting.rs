//! Time-series forecasting collector.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};

use pl_core::traits::DataCollector;
use pl_core::types::{CollectedRecord, ForecastPoint, SourceKind};

use crate::history::History;
use crate::http::{build_client, fetch_json, number};

/// Collects forecast horizons from the upstream time-series model and
/// enriches them with trend and insight analysis.
pub struct ForecastingCollector {
    client: Client,
    forecast_endpoint: String,
    history: History,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastTrends {
    pub waste_trend: String,
    pub production_trend: String,
    pub efficiency_trend: String,
    pub risk_level: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastSummary {
    pub status: String,
    pub hours_analyzed: i64,
    pub total_forecasts: usize,
    pub successful_forecasts: usize,
    pub average_horizon: Option<f64>,
    pub latest_trends: Option<ForecastTrends>,
    pub data_quality: String,
}

impl ForecastingCollector {
    pub fn new(api_base_url: &str, timeout_secs: u64, max_history: usize) -> Self {
        Self {
            client: build_client(timeout_secs),
            forecast_endpoint: format!("{api_base_url}/api/forecast"),
            history: History::new(max_history),
        }
    }

    /// Summary of recent forecast collections within the last `hours`.
    pub async fn summary(&self, hours: i64) -> ForecastSummary {
        let cutoff = Utc::now() - Duration::hours(hours);
        let records = self.history.since(cutoff).await;

        if records.is_empty() {
            return ForecastSummary {
                status: "no_recent_data".to_string(),
                hours_analyzed: hours,
                total_forecasts: 0,
                successful_forecasts: 0,
                average_horizon: None,
                latest_trends: None,
                data_quality: "limited".to_string(),
            };
        }

        let successful: Vec<&CollectedRecord> =
            records.iter().filter(|r| r.is_success()).collect();
        let horizons: Vec<f64> = successful
            .iter()
            .filter_map(|r| number(&r.payload, "forecast_horizon"))
            .collect();

        let latest_trends = successful
            .last()
            .map(|r| analyze_trends(&parse_forecast_points(&r.payload)));

        let success_rate = successful.len() as f64 / records.len() as f64 * 100.0;
        ForecastSummary {
            status: "success".to_string(),
            hours_analyzed: hours,
            total_forecasts: records.len(),
            successful_forecasts: successful.len(),
            average_horizon: if horizons.is_empty() {
                None
            } else {
                Some(horizons.iter().sum::<f64>() / horizons.len() as f64)
            },
            latest_trends,
            data_quality: if success_rate > 90.0 {
                "excellent".to_string()
            } else if success_rate > 75.0 {
                "good".to_string()
            } else {
                "limited".to_string()
            },
        }
    }
}

#[async_trait]
impl DataCollector for ForecastingCollector {
    async fn collect(&self) -> CollectedRecord {
        let record = match fetch_json(&self.client, &self.forecast_endpoint).await {
            Ok(data) => {
                let points = parse_forecast_points(&data);
                let mut payload = json!({
                    "api_status": "success",
                    "forecast_horizon": number(&data, "forecast_horizon").unwrap_or(30.0),
                    "forecast": data.get("forecast").cloned().unwrap_or_else(|| json!([])),
                    "data_sources": data.get("data_sources").cloned().unwrap_or_else(|| json!({})),
                });
                if !points.is_empty() {
                    payload["trends"] = serde_json::to_value(analyze_trends(&points))
                        .unwrap_or(Value::Null);
                    payload["insights"] = json!(forecast_insights(&points));
                }
                tracing::info!(points = points.len(), "Collected forecasting data");
                CollectedRecord::success(SourceKind::Forecasting, payload)
            }
            Err(error) => {
                tracing::warn!(error = %error, "Forecast collection failed");
                CollectedRecord::failure(SourceKind::Forecasting, error)
            }
        };

        self.history.push(record.clone()).await;
        record
    }

    fn source(&self) -> SourceKind {
        SourceKind::Forecasting
    }

    async fn history(&self, limit: usize) -> Vec<CollectedRecord> {
        self.history.recent(limit).await
    }

    async fn clear_history(&self) {
        self.history.clear().await;
        tracing::info!("Forecast history cleared");
    }
}

/// Extracts the normalized sensor series from a forecast payload.
pub fn parse_forecast_points(payload: &Value) -> Vec<ForecastPoint> {
    payload
        .get("forecast")
        .and_then(Value::as_array)
        .map(|points| {
            points
                .iter()
                .filter_map(|p| p.get("sensors"))
                .map(|sensors| ForecastPoint {
                    waste: number(sensors, "waste").unwrap_or(0.0),
                    produced: number(sensors, "produced").unwrap_or(0.0),
                    ejection: number(sensors, "ejection").unwrap_or(0.0),
                    tbl_speed: number(sensors, "tbl_speed").unwrap_or(0.0),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Endpoint-to-endpoint trend classification over the forecast horizon.
pub fn analyze_trends(points: &[ForecastPoint]) -> ForecastTrends {
    let mut trends = ForecastTrends {
        waste_trend: "stable".to_string(),
        production_trend: "stable".to_string(),
        efficiency_trend: "stable".to_string(),
        risk_level: "low".to_string(),
    };

    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        trends.waste_trend = "insufficient_data".to_string();
        return trends;
    };
    if points.len() < 2 {
        trends.waste_trend = "insufficient_data".to_string();
        return trends;
    }

    if last.waste > first.waste * 1.1 {
        trends.waste_trend = "increasing".to_string();
        trends.risk_level = "medium".to_string();
    } else if last.waste < first.waste * 0.9 {
        trends.waste_trend = "decreasing".to_string();
    }

    if last.produced > first.produced * 1.05 {
        trends.production_trend = "increasing".to_string();
    } else if last.produced < first.produced * 0.95 {
        trends.production_trend = "decreasing".to_string();
        trends.risk_level = "medium".to_string();
    }

    let eff_start = first.efficiency();
    let eff_end = last.efficiency();
    if eff_end > eff_start * 1.02 {
        trends.efficiency_trend = "improving".to_string();
    } else if eff_end < eff_start * 0.98 {
        trends.efficiency_trend = "declining".to_string();
        trends.risk_level = if trends.risk_level == "medium" {
            "high".to_string()
        } else {
            "medium".to_string()
        };
    }

    trends
}

/// Actionable insight strings derived from the forecast series.
pub fn forecast_insights(points: &[ForecastPoint]) -> Vec<String> {
    let mut insights = Vec::new();
    if points.is_empty() {
        return vec!["No forecast data available for analysis".to_string()];
    }

    let waste: Vec<f64> = points.iter().map(|p| p.waste).collect();
    let avg_waste = waste.iter().sum::<f64>() / waste.len() as f64;
    let max_waste = waste.iter().copied().fold(f64::MIN, f64::max);

    if max_waste > 2000.0 {
        insights.push(format!(
            "Critical waste levels predicted: up to {max_waste:.1} units"
        ));
    } else if avg_waste > 1500.0 {
        insights.push(format!(
            "Elevated waste levels forecasted: average {avg_waste:.1} units"
        ));
    } else {
        insights.push(format!(
            "Waste levels within acceptable range: average {avg_waste:.1} units"
        ));
    }

    let produced: Vec<f64> = points.iter().map(|p| p.produced).collect();
    let avg_production = produced.iter().sum::<f64>() / produced.len() as f64;
    let min_production = produced.iter().copied().fold(f64::MAX, f64::min);

    if min_production < 10.0 {
        insights.push(format!(
            "Low production periods predicted: minimum {min_production:.1} units"
        ));
    } else if avg_production > 20.0 {
        insights.push(format!(
            "Strong production performance forecasted: average {avg_production:.1} units"
        ));
    } else {
        insights.push(format!(
            "Moderate production levels expected: average {avg_production:.1} units"
        ));
    }

    let efficiencies: Vec<f64> = points
        .iter()
        .filter(|p| p.produced + p.waste > 0.0)
        .map(|p| p.efficiency())
        .collect();
    let avg_efficiency = if efficiencies.is_empty() {
        None
    } else {
        Some(efficiencies.iter().sum::<f64>() / efficiencies.len() as f64)
    };

    if let Some(eff) = avg_efficiency {
        if eff < 0.7 {
            insights.push(format!(
                "Process efficiency concerns: {:.1}% average efficiency",
                eff * 100.0
            ));
        } else if eff > 0.85 {
            insights.push(format!(
                "Excellent process efficiency predicted: {:.1}% average",
                eff * 100.0
            ));
        } else {
            insights.push(format!(
                "Acceptable process efficiency: {:.1}% average",
                eff * 100.0
            ));
        }
    }

    if avg_waste > 1500.0 || avg_efficiency.is_some_and(|e| e < 0.75) {
        insights.push("Recommend process optimization review".to_string());
    }
    if max_waste > 2500.0 {
        insights.push("Consider immediate intervention to prevent excessive waste".to_string());
    }

    insights
}

/// Validates the structure of an upstream forecast payload: horizon plus a
/// complete numeric sensor block per point.
pub fn validate_forecast_payload(data: &Value) -> bool {
    if data.get("forecast_horizon").is_none() {
        tracing::warn!("Missing required field: forecast_horizon");
        return false;
    }
    let Some(points) = data.get("forecast").and_then(Value::as_array) else {
        tracing::warn!("Forecast data is not a list");
        return false;
    };

    for (i, point) in points.iter().enumerate() {
        let Some(sensors) = point.get("sensors").and_then(Value::as_object) else {
            tracing::warn!(index = i, "Forecast point missing sensors data");
            return false;
        };
        for sensor in ["waste", "produced", "ejection", "tbl_speed"] {
            match sensors.get(sensor) {
                Some(value) if value.is_number() => {}
                _ => {
                    tracing::warn!(index = i, sensor, "Forecast point sensor missing or non-numeric");
                    return false;
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(waste: f64, produced: f64) -> ForecastPoint {
        ForecastPoint {
            waste,
            produced,
            ejection: 150.0,
            tbl_speed: 120.0,
        }
    }

    #[test]
    fn test_trends_increasing_waste() {
        let trends = analyze_trends(&[point(1000.0, 20.0), point(1200.0, 20.0)]);
        assert_eq!(trends.waste_trend, "increasing");
        assert_eq!(trends.risk_level, "medium");
    }

    #[test]
    fn test_trends_declining_efficiency_escalates_risk() {
        // Waste up and efficiency down together push risk to high.
        let trends = analyze_trends(&[point(1000.0, 30.0), point(1500.0, 20.0)]);
        assert_eq!(trends.waste_trend, "increasing");
        assert_eq!(trends.efficiency_trend, "declining");
        assert_eq!(trends.risk_level, "high");
    }

    #[test]
    fn test_trends_insufficient_data() {
        let trends = analyze_trends(&[point(1000.0, 20.0)]);
        assert_eq!(trends.waste_trend, "insufficient_data");
    }

    #[test]
    fn test_insights_critical_waste() {
        let insights = forecast_insights(&[point(2600.0, 20.0)]);
        assert!(insights.iter().any(|i| i.contains("Critical waste levels")));
        assert!(
            insights
                .iter()
                .any(|i| i.contains("immediate intervention"))
        );
    }

    #[test]
    fn test_insights_acceptable_range() {
        let insights = forecast_insights(&[point(500.0, 25.0), point(480.0, 26.0)]);
        assert!(insights.iter().any(|i| i.contains("acceptable range")));
        assert!(insights.iter().any(|i| i.contains("Strong production")));
    }

    #[test]
    fn test_validate_forecast_payload() {
        let valid = json!({
            "forecast_horizon": 30,
            "forecast": [
                { "sensors": { "waste": 100.0, "produced": 20.0, "ejection": 150.0, "tbl_speed": 120.0 } }
            ]
        });
        assert!(validate_forecast_payload(&valid));

        let missing_sensor = json!({
            "forecast_horizon": 30,
            "forecast": [ { "sensors": { "waste": 100.0 } } ]
        });
        assert!(!validate_forecast_payload(&missing_sensor));

        let no_horizon = json!({ "forecast": [] });
        assert!(!validate_forecast_payload(&no_horizon));
    }

    #[test]
    fn test_parse_forecast_points() {
        let payload = json!({
            "forecast": [
                { "sensors": { "waste": 10.5, "produced": 20.0, "ejection": 1.0, "tbl_speed": 2.0 } },
                { "sensors": { "waste": 11.0 } },
            ]
        });
        let points = parse_forecast_points(&payload);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].waste, 10.5);
        assert_eq!(points[1].produced, 0.0);
    }
}
