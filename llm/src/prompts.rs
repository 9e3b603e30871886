//! Prompt construction for report generation.
//!
//! Two registered modes: the full prompt for normal operation and a
//! compact variant used to recover from token-rate-limit errors. Both
//! instruct the model to reference only the metrics actually provided.

use pl_core::types::{ContextHit, MetricsSnapshot};

/// Section headers the prompt requires in the response; the strict section
/// parser keys on these.
pub const REQUIRED_SECTIONS: [&str; 6] = [
    "EXECUTIVE SUMMARY",
    "DETAILED TECHNICAL ANALYSIS",
    "RISK ASSESSMENT",
    "RECOMMENDATIONS",
    "ACTION ITEMS",
    "COMPLIANCE STATUS",
];

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Builds the historical + current-data context block. Compact mode keeps
/// fewer items and shorter excerpts.
pub fn build_context_text(
    context: &[ContextHit],
    metrics: &MetricsSnapshot,
    compact: bool,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !context.is_empty() {
        parts.push("=== HISTORICAL DATA ANALYSIS ===".to_string());
        let (item_limit, content_limit) = if compact { (2, 150) } else { (5, 300) };
        for (i, item) in context.iter().take(item_limit).enumerate() {
            parts.push(format!(
                "Historical Record {}: {}",
                i + 1,
                truncate(&item.content, content_limit)
            ));
        }
    }

    parts.push("=== CURRENT REAL-TIME DATA ===".to_string());
    parts.push(format!(
        "Defect Probability: {}",
        MetricsSnapshot::fmt_opt(metrics.defect_probability, 3)
    ));
    parts.push(format!("Risk Level: {}", metrics.risk_level));
    parts.push(format!(
        "Predicted Waste: {}",
        MetricsSnapshot::fmt_opt(metrics.predicted_waste, 1)
    ));
    parts.push(format!(
        "Predicted Production: {}",
        MetricsSnapshot::fmt_opt(metrics.predicted_production, 1)
    ));
    parts.push(format!("Quality Classification: {}", metrics.quality_class));
    if !metrics.recommended_actions.is_empty() {
        parts.push(format!(
            "Recommended Actions: {}",
            metrics.action_description()
        ));
    }

    parts.join("\n")
}

/// System prompt for the given report type and mode.
pub fn system_prompt(report_type: &str, compact: bool) -> String {
    let base = if compact {
        "You are an expert pharmaceutical manufacturing analyst specializing in quality \
         control and regulatory compliance.\n\n\
         MISSION: Generate concise, professional pharmaceutical manufacturing reports.\n\n\
         REQUIREMENTS:\n\
         - Professional pharmaceutical terminology\n\
         - Data-driven insights with specific metrics\n\
         - Regulatory compliance focus\n\
         - Risk-based analysis with actionable recommendations"
    } else {
        "You are an expert pharmaceutical manufacturing analyst and quality control \
         specialist with deep expertise in:\n\n\
         - FDA 21 CFR Part 11 regulatory compliance\n\
         - ICH Q7 Good Manufacturing Practice guidelines\n\
         - Statistical Process Control (SPC) and Quality by Design (QbD)\n\
         - Pharmaceutical process optimization and risk management\n\
         - Real-time data analysis and predictive analytics\n\n\
         MISSION: Generate comprehensive, professional, regulatory-compliant reports for \
         pharmaceutical manufacturing operations.\n\n\
         FORMAT STANDARDS:\n\
         - Use professional scientific writing style, free of emojis\n\
         - Include specific numerical data from the provided metrics only\n\
         - Provide clear markdown section headers and bullet points\n\
         - Ensure actionable recommendations with priority levels"
    };

    let focus = match report_type {
        "quality_control" => {
            "FOCUS: Quality Control & Defect Analysis\n\
             - Real-time defect probability assessment and trend analysis\n\
             - Quality classification accuracy and confidence metrics\n\
             - Statistical Process Control analysis and capability review\n\
             - Root cause analysis and corrective action recommendations"
        }
        "batch_record" => {
            "FOCUS: Batch Record Analysis & Performance Review\n\
             - Batch disposition and quality assessment\n\
             - Process parameter compliance and deviation analysis\n\
             - Yield analysis and material consumption efficiency"
        }
        "excellence" => {
            "FOCUS: Manufacturing Excellence & Optimization\n\
             - Overall Equipment Effectiveness analysis\n\
             - Process optimization opportunities and continuous improvement\n\
             - Lean manufacturing implementation and waste reduction"
        }
        "compliance" => {
            "FOCUS: Regulatory Compliance & Audit Readiness\n\
             - 21 CFR Part 11 electronic records compliance verification\n\
             - Data integrity assessment (ALCOA+ principles)\n\
             - Audit trail completeness and change control validation"
        }
        _ => "Generate a comprehensive pharmaceutical manufacturing analysis report.",
    };

    format!("{base}\n\n{focus}")
}

/// User prompt interpolating the extracted metrics and context.
pub fn user_prompt(
    query: &str,
    context_text: &str,
    report_type: &str,
    metrics: &MetricsSnapshot,
    compact: bool,
) -> String {
    let report_name = report_type.replace('_', " ").to_uppercase();
    let defect = MetricsSnapshot::fmt_opt(metrics.defect_probability, 3);
    let waste = MetricsSnapshot::fmt_opt(metrics.predicted_waste, 1);
    let production = MetricsSnapshot::fmt_opt(metrics.predicted_production, 1);

    if compact {
        return format!(
            "GENERATE {report_name} REPORT\n\n\
             REQUEST: {query}\n\n\
             KEY METRICS:\n\
             - Defect Probability: {defect}\n\
             - Quality Class: {}\n\
             - Risk Level: {}\n\
             - Predicted Waste: {waste} units\n\n\
             CONTEXT: {}\n\n\
             REQUIRED SECTIONS:\n\
             ## EXECUTIVE SUMMARY\n\
             ## RISK ASSESSMENT\n\
             ## ACTION ITEMS\n\n\
             Use ONLY actual data provided. Professional pharmaceutical tone required.",
            metrics.quality_class,
            metrics.risk_level,
            truncate(context_text, 500),
        );
    }

    format!(
        "GENERATE COMPREHENSIVE {report_name} REPORT\n\n\
         EXECUTIVE REQUEST: {query}\n\n\
         REAL-TIME MANUFACTURING DATA:\n\
         - Defect Probability: {defect}\n\
         - Risk Level: {}\n\
         - Quality Classification: {}\n\
         - Predicted Waste: {waste} units\n\
         - Predicted Production: {production} units\n\
         - Forecast Horizon: {} timesteps\n\
         - Data Collection Success Rate: {:.1}%\n\
         - System Status: {}\n\n\
         HISTORICAL CONTEXT & PATTERNS:\n{context_text}\n\n\
         CRITICAL REQUIREMENT: Use ONLY the actual data provided above. Do not invent \
         numbers or metrics. If a value shows 'N/A', acknowledge the missing data.\n\n\
         REPORT STRUCTURE REQUIRED (use these exact markdown headers):\n\
         ## EXECUTIVE SUMMARY\n\
         ## DETAILED TECHNICAL ANALYSIS\n\
         ## RISK ASSESSMENT\n\
         ## RECOMMENDATIONS\n\
         ## ACTION ITEMS\n\
         ## COMPLIANCE STATUS",
        metrics.risk_level,
        metrics.quality_class,
        metrics
            .forecast_horizon
            .map_or_else(|| "N/A".to_string(), |h| h.to_string()),
        metrics.collection_success_rate,
        metrics.system_health.overall_status,
    )
}
