//! Markdown document assembly.
//!
//! Combines the narrative sections and the snapshot into the single
//! document string carried by the artifact for display and downstream
//! rendering. Pure formatting; every number comes from the snapshot.

use pl_core::types::{HealthState, MetricsSnapshot, ReportSections};

/// Assembles the full markdown report document.
pub fn build_document(sections: &ReportSections, metrics: &MetricsSnapshot) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push("# COMPREHENSIVE QUALITY CONTROL REPORT".to_string());
    parts.push(String::new());

    parts.push("## EXECUTIVE SUMMARY".to_string());
    parts.push(sections.executive_summary.clone());
    parts.push(String::new());

    parts.push("## KEY PERFORMANCE INDICATORS".to_string());
    parts.push(String::new());
    parts.extend(kpi_table(metrics));
    parts.push(String::new());

    if !sections.detailed_analysis.is_empty() {
        parts.push("## DETAILED TECHNICAL ANALYSIS".to_string());
        parts.push(sections.detailed_analysis.clone());
        parts.push(String::new());
    }

    if !metrics.forecast_preview.is_empty() {
        parts.push("## PREDICTIVE INSIGHTS".to_string());
        parts.extend(forecast_table(metrics));
        parts.push(String::new());
    }

    if !sections.risk_assessment.is_empty() {
        parts.push("## RISK ASSESSMENT".to_string());
        parts.push(sections.risk_assessment.clone());
        parts.push(String::new());
    }

    if !sections.recommendations.is_empty() {
        parts.push("## RECOMMENDATIONS".to_string());
        for (i, rec) in sections.recommendations.iter().enumerate() {
            parts.push(format!("**{}.** {rec}", i + 1));
        }
        parts.push(String::new());
    }

    if !sections.action_items.is_empty() {
        parts.push("## IMMEDIATE ACTION ITEMS".to_string());
        for (i, item) in sections.action_items.iter().enumerate() {
            parts.push(format!("**{}.** {item}", i + 1));
        }
        parts.push(String::new());
    }

    if !sections.compliance_status.is_empty() {
        parts.push("## REGULATORY COMPLIANCE STATUS".to_string());
        parts.push(sections.compliance_status.clone());
        parts.push(String::new());
    }

    parts.push("## DATA QUALITY SUMMARY".to_string());
    parts.push(format!(
        "- **Collection Timestamp:** {}",
        metrics.data_collection_time.to_rfc3339()
    ));
    parts.push(format!(
        "- **Sources Successful:** {}",
        metrics.system_health.data_availability
    ));
    parts.push(format!(
        "- **Success Rate:** {:.1}%",
        metrics.collection_success_rate
    ));
    parts.push(format!(
        "- **Collection Errors:** {}",
        metrics.system_health.collection_errors
    ));
    parts.push(String::new());

    parts.push("## REPORT SUMMARY".to_string());
    parts.push(
        "*The following summary explains this report in simple, non-technical language:*"
            .to_string(),
    );
    parts.push(String::new());
    parts.push(plain_language_summary(sections, metrics));
    parts.push(String::new());

    parts.push("---".to_string());
    parts.push("*Report generated using real-time data collection and automated analysis*".to_string());

    parts.join("\n")
}

fn kpi_table(metrics: &MetricsSnapshot) -> Vec<String> {
    let quality_score = metrics.quality_score.unwrap_or(0.0);
    let quality_status = if quality_score >= 0.8 {
        "Excellent"
    } else if quality_score >= 0.6 {
        "Good"
    } else if quality_score >= 0.4 {
        "Review"
    } else {
        "Critical"
    };

    let defect_prob = metrics.defect_probability.unwrap_or(0.0);
    let risk_status = if defect_prob < 0.2 {
        "Low Risk"
    } else if defect_prob < 0.4 {
        "Medium Risk"
    } else if defect_prob < 0.6 {
        "High Risk"
    } else {
        "Critical Risk"
    };

    let success_rate = metrics.collection_success_rate;
    let rate_status = if success_rate >= 95.0 {
        "Excellent"
    } else if success_rate >= 80.0 {
        "Good"
    } else {
        "Review"
    };

    vec![
        "| Metric | Current Value | Status |".to_string(),
        "|--------|---------------|--------|".to_string(),
        format!(
            "| Overall Quality Score | {} ({}) | {quality_status} |",
            MetricsSnapshot::fmt_opt(metrics.quality_score, 3),
            metrics.quality_class
        ),
        format!(
            "| Quality Confidence | {} | {} |",
            MetricsSnapshot::fmt_opt(metrics.quality_confidence, 2),
            metrics
                .quality_confidence
                .map_or("Unknown", |c| if c > 0.8 { "High" } else { "Monitor" })
        ),
        format!(
            "| Defect Probability | {} | {risk_status} |",
            MetricsSnapshot::fmt_opt(metrics.defect_probability, 3)
        ),
        format!(
            "| System Status | {} | {} |",
            metrics.system_health.overall_status,
            match metrics.system_health.overall_status {
                HealthState::Healthy => "Online",
                HealthState::Degraded => "Limited",
                HealthState::Critical => "Offline",
            }
        ),
        format!(
            "| Data Availability | {} | {} |",
            metrics.system_health.data_availability,
            if metrics.system_health.successful_sources == metrics.system_health.total_sources {
                "Online"
            } else {
                "Limited"
            }
        ),
        format!("| Collection Success Rate | {success_rate:.1}% | {rate_status} |"),
    ]
}

fn forecast_table(metrics: &MetricsSnapshot) -> Vec<String> {
    let preview = &metrics.forecast_preview;
    let first = preview.first().copied().unwrap_or_default();
    let last = preview.last().copied().unwrap_or_default();
    let mid = preview.get(preview.len() / 2).copied().unwrap_or(first);

    let horizon = metrics
        .forecast_horizon
        .map_or_else(|| "unknown".to_string(), |h| format!("{h} timesteps"));

    let mut lines = vec![
        format!("**Next Period Predictions (Horizon: {horizon}):**"),
        String::new(),
        "| Parameter | Current | Near-term | Long-term | Trend |".to_string(),
        "|-----------|---------|-----------|-----------|-------|".to_string(),
        forecast_row("Waste Generation", first.waste, mid.waste, last.waste, "units"),
        forecast_row("Production Output", first.produced, mid.produced, last.produced, "units"),
        forecast_row("Ejection Rate", first.ejection, mid.ejection, last.ejection, ""),
        forecast_row("Table Speed", first.tbl_speed, mid.tbl_speed, last.tbl_speed, ""),
        String::new(),
    ];

    let efficiency_start = first.efficiency() * 100.0;
    let efficiency_end = last.efficiency() * 100.0;
    let efficiency_trend = if efficiency_end > efficiency_start {
        "improving"
    } else if efficiency_end < efficiency_start {
        "declining"
    } else {
        "stable"
    };
    lines.push("**Forecast Analysis Summary:**".to_string());
    lines.push(format!(
        "- **Total Forecast Points:** {} timesteps analyzed",
        metrics.forecast_points
    ));
    lines.push(format!(
        "- **Process Efficiency Trend:** {efficiency_trend} (from {efficiency_start:.1}% to {efficiency_end:.1}%)"
    ));
    lines
}

fn forecast_row(name: &str, current: f64, mid: f64, long: f64, unit: &str) -> String {
    let suffix = if unit.is_empty() {
        String::new()
    } else {
        format!(" {unit}")
    };
    let trend = if long > current {
        "Increasing"
    } else if long < current {
        "Decreasing"
    } else {
        "Stable"
    };
    format!("| {name} | {current:.1}{suffix} | {mid:.1}{suffix} | {long:.1}{suffix} | {trend} |")
}

/// Deterministic plain-language closing summary.
fn plain_language_summary(sections: &ReportSections, metrics: &MetricsSnapshot) -> String {
    let health = metrics.system_health.overall_status;
    let success_rate = metrics.collection_success_rate;

    let overall = if health == HealthState::Healthy && success_rate >= 90.0 {
        "working well"
    } else if health == HealthState::Degraded || success_rate >= 70.0 {
        "working with some issues"
    } else {
        "having significant problems"
    };

    let risk_description = match metrics.defect_probability {
        Some(p) if p < 0.1 => "a very low risk of problems",
        Some(p) if p < 0.3 => "a low risk of problems",
        Some(p) if p < 0.5 => "a moderate risk of problems",
        Some(_) => "a high risk of problems",
        None => "an unknown risk level",
    };

    let mut summary = format!(
        "This report shows that the pharmaceutical manufacturing system is currently {overall}. \
         The data collection systems are running at {success_rate:.0}% capacity, and there is \
         {risk_description} with the current production process. "
    );

    let rec_count = sections.recommendations.len();
    if rec_count > 0 {
        summary.push_str(&format!(
            "The analysis has identified {rec_count} specific recommendations to improve \
             operations and maintain high quality standards. "
        ));
    }

    summary.push_str(match health {
        HealthState::Healthy => {
            "Overall, the manufacturing process is operating smoothly and meeting quality requirements."
        }
        HealthState::Degraded => {
            "While the system is mostly working well, some attention is needed to prevent potential issues."
        }
        HealthState::Critical => {
            "The system requires immediate attention to restore full operational capability."
        }
    });
    summary
}
