use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Builds the shared upstream client with the collector-level timeout.
pub(crate) fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_default()
}

/// GETs a JSON document, mapping every failure class (transport, timeout,
/// non-200, malformed body) to an error string for the caller to embed in
/// an error record.
pub(crate) async fn fetch_json(client: &Client, url: &str) -> Result<Value, String> {
    match client.get(url).send().await {
        Ok(resp) if resp.status().is_success() => resp
            .json()
            .await
            .map_err(|e| format!("invalid JSON from {url}: {e}")),
        Ok(resp) => Err(format!("HTTP {}", resp.status().as_u16())),
        Err(e) => Err(format!("request to {url} failed: {e}")),
    }
}

/// Reads a numeric field as f64, tolerating integer payloads.
pub(crate) fn number(value: &Value, field: &str) -> Option<f64> {
    value.get(field).and_then(Value::as_f64)
}

/// Reads the numeric entries of a JSON object field.
pub(crate) fn number_map(value: &Value, field: &str) -> std::collections::HashMap<String, f64> {
    value
        .get(field)
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
                .collect()
        })
        .unwrap_or_default()
}
