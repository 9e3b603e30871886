//! Flattening of structured telemetry into searchable text, and the
//! inverse parsing used by recent-summary analytics.

use serde_json::Value;

const RL_MODEL_KEYS: [&str; 3] = ["baseline_model", "current_model", "new_model"];

/// Converts a collected payload into labeled, searchable text segments
/// joined with " | ". Field coverage mirrors the collector payload shapes;
/// unknown payloads fall back to a truncated raw representation.
pub fn format_data_as_text(data: &Value) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(forecast) = data.get("forecast").and_then(Value::as_array) {
        let horizon = data
            .get("forecast_horizon")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        parts.push(format!("Forecast horizon: {} minutes", horizon as i64));

        for (i, point) in forecast.iter().take(3).enumerate() {
            if let Some(sensors) = point.get("sensors").and_then(Value::as_object) {
                let mut readings: Vec<String> = sensors
                    .iter()
                    .filter_map(|(k, v)| v.as_f64().map(|n| format!("{k}: {n}")))
                    .collect();
                readings.sort();
                if !readings.is_empty() {
                    parts.push(format!("Forecast point {}: {}", i + 1, readings.join(", ")));
                }
            }
        }
    }

    if let Some(defect) = data.get("defect_prediction") {
        if defect["api_status"] == "success" {
            parts.push(format!(
                "Defect probability: {:.3}, Risk level: {}, Confidence: {:.3}",
                defect["defect_probability"].as_f64().unwrap_or(0.0),
                defect["risk_level"].as_str().unwrap_or("Unknown"),
                defect["confidence"].as_f64().unwrap_or(0.0),
            ));
        }
    }

    if let Some(quality) = data.get("quality_prediction") {
        if quality["api_status"] == "success" {
            parts.push(format!(
                "Quality class: {}, Confidence: {:.3}",
                quality["quality_class"].as_str().unwrap_or("Unknown"),
                quality["confidence"].as_f64().unwrap_or(0.0),
            ));
        }
    }

    for model_key in RL_MODEL_KEYS {
        let Some(model) = data.get(model_key) else {
            continue;
        };
        if model["api_status"] != "success" {
            continue;
        }
        if let Some(actions) = model.get("recommended_actions").and_then(Value::as_object) {
            let mut entries: Vec<String> = actions
                .iter()
                .filter_map(|(k, v)| v.as_f64().map(|n| format!("{k}: {n}")))
                .collect();
            entries.sort();
            if !entries.is_empty() {
                let model_type = model_key.trim_end_matches("_model");
                parts.push(format!("{model_type} model actions: {}", entries.join(", ")));
            }
        }
    }

    if let Some(timestamp) = data
        .get("collection_timestamp")
        .or_else(|| data.get("timestamp"))
        .and_then(Value::as_str)
    {
        parts.push(format!("Collected at: {timestamp}"));
    }

    if let Some(object) = data.as_object() {
        let mut statuses: Vec<String> = object
            .iter()
            .filter_map(|(key, value)| {
                value
                    .get("api_status")
                    .and_then(Value::as_str)
                    .map(|status| format!("{key}: {status}"))
            })
            .collect();
        statuses.sort();
        if !statuses.is_empty() {
            parts.push(format!("API status: {}", statuses.join(", ")));
        }
    }

    if parts.is_empty() {
        let raw = data.to_string();
        let truncated: String = raw.chars().take(500).collect();
        parts.push(format!("Data: {truncated}"));
    }

    parts.join(" | ")
}

/// Extracts the value following a label, up to the next delimiter.
/// `parse_labeled(content, "Defect probability:", ",")` -> `"0.123"`.
pub(crate) fn parse_labeled<'a>(content: &'a str, label: &str, delimiter: &str) -> Option<&'a str> {
    let start = content.find(label)? + label.len();
    let rest = &content[start..];
    let end = rest.find(delimiter).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_classification_payload() {
        let payload = json!({
            "defect_prediction": {
                "api_status": "success",
                "defect_probability": 0.82,
                "risk_level": "high",
                "confidence": 0.91,
            },
            "quality_prediction": {
                "api_status": "success",
                "quality_class": "Low",
                "confidence": 0.6,
            },
        });

        let text = format_data_as_text(&payload);
        assert!(text.contains("Defect probability: 0.820"));
        assert!(text.contains("Risk level: high"));
        assert!(text.contains("Quality class: Low"));
        assert!(text.contains("API status: defect_prediction: success"));
    }

    #[test]
    fn test_format_forecast_payload_limits_points() {
        let point = json!({ "sensors": { "waste": 120.0, "produced": 22.0 } });
        let payload = json!({
            "forecast_horizon": 30,
            "forecast": [point, point, point, point, point],
        });

        let text = format_data_as_text(&payload);
        assert!(text.contains("Forecast horizon: 30 minutes"));
        assert!(text.contains("Forecast point 3"));
        assert!(!text.contains("Forecast point 4"));
    }

    #[test]
    fn test_format_rl_payload() {
        let payload = json!({
            "baseline_model": {
                "api_status": "success",
                "recommended_actions": { "tbl_speed": 0.3 },
            },
            "current_model": { "api_status": "error", "error": "HTTP 500" },
        });

        let text = format_data_as_text(&payload);
        assert!(text.contains("baseline model actions: tbl_speed: 0.3"));
        assert!(!text.contains("current model actions"));
        assert!(text.contains("current_model: error"));
    }

    #[test]
    fn test_format_unknown_payload_falls_back() {
        let text = format_data_as_text(&json!({ "mystery": 42 }));
        assert!(text.starts_with("Data: "));
    }

    #[test]
    fn test_parse_labeled() {
        let content = "Defect probability: 0.820, Risk level: high";
        assert_eq!(
            parse_labeled(content, "Defect probability:", ","),
            Some("0.820")
        );
        assert_eq!(parse_labeled(content, "Risk level:", ","), Some("high"));
        assert_eq!(parse_labeled(content, "Missing:", ","), None);
    }
}
