//! Emoji sanitization for report artifacts.
//!
//! Known status emojis are replaced with bracketed text tags; anything
//! else in the emoji code-point ranges is stripped. Applied recursively
//! over every string field of the artifact, and idempotent: the tags
//! contain no emoji, so a second pass is a no-op.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use pl_core::types::ReportArtifact;

/// Emoji sequences with a meaningful text equivalent.
const REPLACEMENTS: [(&str, &str); 16] = [
    ("\u{1F534}", "[HIGH RISK]"),
    ("\u{1F7E1}", "[MEDIUM RISK]"),
    ("\u{1F7E2}", "[LOW RISK]"),
    ("\u{2705}", "[OK]"),
    ("\u{274C}", "[FAIL]"),
    ("\u{26A0}\u{FE0F}", "[WARNING]"),
    ("\u{26A0}", "[WARNING]"),
    ("\u{1F6A8}", "[ALERT]"),
    ("\u{1F4C8}", "[INCREASING]"),
    ("\u{1F4C9}", "[DECREASING]"),
    ("\u{1F4CA}", "[DATA]"),
    ("\u{1F4CB}", "[REPORT]"),
    ("\u{1F527}", "[MAINTENANCE]"),
    ("\u{2699}\u{FE0F}", "[SETTINGS]"),
    ("\u{1F3ED}", "[FACTORY]"),
    ("\u{1F50D}", "[SEARCH]"),
];

fn emoji_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            "[\u{1F300}-\u{1F5FF}\
              \u{1F600}-\u{1F64F}\
              \u{1F680}-\u{1F6FF}\
              \u{1F900}-\u{1F9FF}\
              \u{1FA70}-\u{1FAFF}\
              \u{2600}-\u{27BF}\
              \u{2B00}-\u{2BFF}\
              \u{FE0F}\u{200D}\u{20E3}]+",
        )
        .expect("valid emoji pattern")
    })
}

/// Replaces known status emojis with text tags, then strips any
/// remaining emoji code points.
pub fn clean_text(text: &str) -> String {
    let mut cleaned = text.to_string();
    for (emoji, replacement) in REPLACEMENTS {
        if cleaned.contains(emoji) {
            cleaned = cleaned.replace(emoji, replacement);
        }
    }
    emoji_pattern().replace_all(&cleaned, "").into_owned()
}

fn clean_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(clean_text(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(clean_value).collect()),
        Value::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, clean_value(v))).collect())
        }
        other => other,
    }
}

/// Cleans every string field of the artifact, recursively.
///
/// The artifact round-trips through its JSON representation, which covers
/// nested sections, lists, and appendix values alike. A structurally
/// valid artifact always survives the round trip; the original is
/// returned unchanged if it somehow does not.
pub fn sanitize_artifact(artifact: ReportArtifact) -> ReportArtifact {
    match serde_json::to_value(&artifact) {
        Ok(value) => serde_json::from_value(clean_value(value)).unwrap_or(artifact),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize artifact for sanitization");
            artifact
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pl_core::types::{
        MetricsSnapshot, ReportAppendix, ReportSections, ReportStatus,
    };
    use std::collections::HashMap;

    fn artifact_with(summary: &str, action: &str) -> ReportArtifact {
        ReportArtifact {
            report_id: "QC_test".to_string(),
            title: "Quality Control Report".to_string(),
            generated_at: Utc::now(),
            status: ReportStatus::Success,
            generation_method: "template_fallback".to_string(),
            data_sources: HashMap::new(),
            metrics: MetricsSnapshot::default(),
            sections: ReportSections {
                executive_summary: summary.to_string(),
                action_items: vec![action.to_string()],
                ..ReportSections::default()
            },
            document: format!("{summary}\n{action}"),
            appendix: ReportAppendix {
                raw_data_summary: HashMap::from([(
                    "note".to_string(),
                    serde_json::json!(summary),
                )]),
                methodology: String::new(),
                data_freshness: String::new(),
            },
        }
    }

    #[test]
    fn test_known_emojis_become_tags() {
        assert_eq!(clean_text("Status: \u{2705} ok"), "Status: [OK] ok");
        assert_eq!(clean_text("Risk \u{1F534} high"), "Risk [HIGH RISK] high");
        assert_eq!(clean_text("\u{26A0}\u{FE0F} caution"), "[WARNING] caution");
    }

    #[test]
    fn test_unknown_emojis_are_stripped() {
        assert_eq!(clean_text("done \u{1F389} today"), "done  today");
        assert_eq!(clean_text("plain ascii"), "plain ascii");
    }

    #[test]
    fn test_clean_text_idempotent() {
        let input = "Alert \u{1F6A8} and \u{2705} and \u{1F916}";
        let once = clean_text(input);
        assert_eq!(clean_text(&once), once);
    }

    #[test]
    fn test_artifact_sanitized_recursively() {
        let artifact = artifact_with("Summary \u{1F4CA}", "\u{1F6A8} escalate");
        let cleaned = sanitize_artifact(artifact);

        assert_eq!(cleaned.sections.executive_summary, "Summary [DATA]");
        assert_eq!(cleaned.sections.action_items[0], "[ALERT] escalate");
        assert!(cleaned.document.contains("[DATA]"));
        assert_eq!(
            cleaned.appendix.raw_data_summary["note"],
            serde_json::json!("Summary [DATA]")
        );
    }

    #[test]
    fn test_sanitize_idempotent_over_artifact() {
        let artifact = artifact_with("Mixed \u{1F7E2} content \u{1F680}", "act \u{274C}");
        let once = sanitize_artifact(artifact);
        let twice = sanitize_artifact(once.clone());
        assert_eq!(
            serde_json::to_value(&once).unwrap(),
            serde_json::to_value(&twice).unwrap()
        );
    }
}
