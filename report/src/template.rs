//! Deterministic template fallback.
//!
//! Every section is a pure function from the metrics snapshot to narrative
//! text, table-driven by fixed policy thresholds, so the fallback path is
//! unit-testable without any LLM. The functions interpolate only values
//! present in the snapshot.

use pl_core::types::{HealthState, MetricsSnapshot, ReportSections};

/// Composes the full section set from the snapshot.
pub fn compose_sections(metrics: &MetricsSnapshot) -> ReportSections {
    ReportSections {
        executive_summary: executive_summary(metrics),
        detailed_analysis: detailed_analysis(metrics),
        recommendations: recommendations(metrics),
        compliance_status: compliance_status(metrics),
        risk_assessment: risk_assessment(metrics),
        action_items: action_items(metrics),
    }
}

fn performance_status(success_rate: f64) -> &'static str {
    if success_rate >= 95.0 {
        "excellent"
    } else if success_rate >= 80.0 {
        "good"
    } else if success_rate >= 60.0 {
        "concerning"
    } else {
        "critical"
    }
}

/// Waste forecast severity labels.
pub fn assess_waste_level(waste: f64) -> &'static str {
    if waste > 2000.0 {
        "critically high, immediate intervention required"
    } else if waste > 1500.0 {
        "elevated, optimization recommended"
    } else if waste > 1000.0 {
        "moderate, monitor closely"
    } else {
        "acceptable, continue current practices"
    }
}

/// Production forecast throughput labels.
pub fn assess_production_level(production: f64) -> &'static str {
    if production > 25.0 {
        "excellent throughput"
    } else if production > 20.0 {
        "good production rate"
    } else if production > 15.0 {
        "adequate output"
    } else {
        "below target, optimization needed"
    }
}

pub fn executive_summary(metrics: &MetricsSnapshot) -> String {
    let health = &metrics.system_health;
    let success_rate = metrics.collection_success_rate;
    let performance = performance_status(success_rate);

    let mut findings = String::new();
    if let Some(prob) = metrics.defect_probability {
        findings.push_str(&format!(
            "Current defect risk assessment shows a {:.2} probability of defects with {} risk classification. ",
            prob, metrics.risk_level
        ));
    }
    if let (Some(waste), Some(production)) = (metrics.predicted_waste, metrics.predicted_production)
    {
        findings.push_str(&format!(
            "Predictive models project waste of {waste:.1} units against production output of {production:.1} units over the forecast horizon. "
        ));
    }
    match metrics.quality_score {
        Some(score) if score >= 0.8 => findings.push_str(&format!(
            "Quality metrics demonstrate excellent performance ({} quality class) with minimal intervention required. ",
            metrics.quality_class
        )),
        Some(score) if score >= 0.6 => findings.push_str(&format!(
            "Quality performance shows {} classification within acceptable parameters, though continued monitoring is recommended. ",
            metrics.quality_class
        )),
        Some(_) => findings.push_str(&format!(
            "Quality performance indicators show {} classification, suggesting immediate attention is needed to prevent batch failures. ",
            metrics.quality_class
        )),
        None => findings.push_str("Quality assessment pending due to data collection limitations. "),
    }

    let health_narrative = match health.overall_status {
        HealthState::Healthy => format!(
            "All monitoring systems ({}) are operating optimally with full data integration capabilities.",
            health.data_availability
        ),
        HealthState::Degraded => format!(
            "Minor system performance issues detected ({}) that require monitoring but do not pose immediate risks.",
            health.data_availability
        ),
        HealthState::Critical => format!(
            "Critical system issues identified ({}) that require immediate technical intervention to restore full monitoring capabilities.",
            health.data_availability
        ),
    };

    let rl_line = if metrics.recommended_actions.is_empty() {
        "Current process parameters are operating within optimal ranges.".to_string()
    } else {
        format!(
            "Advanced reinforcement learning analysis recommends: {}.",
            metrics.action_description()
        )
    };

    format!(
        "**PHARMACEUTICAL MANUFACTURING QUALITY CONTROL ANALYSIS**\n\n\
         **EXECUTIVE OVERVIEW:**\n\
         This quality control analysis encompasses real-time manufacturing data collected from \
         {success_rate:.1}% of configured monitoring systems. The assessment reveals {performance} \
         operational performance across all monitored parameters.\n\n\
         **KEY OPERATIONAL FINDINGS:**\n{findings}{health_narrative}\n\n\
         **PROCESS OPTIMIZATION INSIGHTS:**\n{rl_line}"
    )
}

pub fn detailed_analysis(metrics: &MetricsSnapshot) -> String {
    let mut parts: Vec<String> = Vec::new();
    let health = &metrics.system_health;
    let success_rate = metrics.collection_success_rate;

    let collection_verdict = if success_rate >= 90.0 {
        "This performance ensures comprehensive visibility into all critical manufacturing processes."
    } else if success_rate >= 75.0 {
        "This performance level provides adequate monitoring capability but indicates improvements needed in data infrastructure reliability."
    } else {
        "This performance level suggests infrastructure issues that may compromise quality monitoring effectiveness and require technical intervention."
    };
    parts.push(format!(
        "**DATA COLLECTION PERFORMANCE:**\n\
         The monitoring infrastructure achieved a {success_rate:.1}% data collection success rate \
         ({}). {collection_verdict} Collection errors totaled {}.",
        health.data_availability, health.collection_errors
    ));

    if let Some(score) = metrics.quality_score {
        let confidence_line = metrics
            .quality_confidence
            .map(|c| format!(" Prediction confidence stands at {c:.2}."))
            .unwrap_or_default();
        let verdict = if score >= 0.8 {
            "consistent high-quality production with minimal variation from target specifications"
        } else if score >= 0.6 {
            "acceptable quality levels with some areas requiring attention"
        } else {
            "quality concerns that require investigation and corrective action to prevent potential batch failures"
        };
        parts.push(format!(
            "**QUALITY PERFORMANCE ASSESSMENT:**\n\
             Current quality metrics reveal an overall score of {score:.3} with batch quality \
             classified as \"{}\".{confidence_line} Trend analysis shows {verdict}.",
            metrics.quality_class
        ));
    }

    if let Some(prob) = metrics.defect_probability {
        let verdict = if prob < 0.2 {
            "an excellent low-risk operational state with minimal likelihood of quality issues"
        } else if prob < 0.4 {
            "a moderate risk level requiring standard monitoring procedures"
        } else if prob < 0.6 {
            "an elevated risk level requiring enhanced monitoring and potential corrective actions"
        } else {
            "a high-risk situation requiring immediate investigation and preventive measures"
        };
        parts.push(format!(
            "**DEFECT DETECTION AND RISK ANALYSIS:**\n\
             The defect detection system indicates a {prob:.2} probability of defects with a \
             \"{}\" risk classification. This represents {verdict}.",
            metrics.risk_level
        ));
    }

    if !metrics.forecast_preview.is_empty() {
        let first = metrics.forecast_preview.first().copied().unwrap_or_default();
        let last = metrics.forecast_preview.last().copied().unwrap_or_default();
        let waste_trend = trend_word(first.waste, last.waste);
        let production_trend = trend_word(first.produced, last.produced);
        parts.push(format!(
            "**PREDICTIVE ANALYTICS:**\n\
             Forecast models cover {} timesteps. Waste generation is {waste_trend} (from {:.1} to \
             {:.1} units, {}); production output is {production_trend} (from {:.1} to {:.1} units, \
             {}).",
            metrics.forecast_points,
            first.waste,
            last.waste,
            assess_waste_level(last.waste),
            first.produced,
            last.produced,
            assess_production_level(last.produced),
        ));
    }

    if !metrics.recommended_actions.is_empty() {
        let mut adjustments: Vec<String> = metrics
            .recommended_actions
            .iter()
            .filter(|(_, v)| **v != 0.0)
            .map(|(action, value)| {
                let direction = if *value > 0.0 { "increase" } else { "decrease" };
                let magnitude = if value.abs() > 0.5 {
                    "significantly"
                } else if value.abs() > 0.1 {
                    "moderately"
                } else {
                    "slightly"
                };
                format!("{direction} {} {magnitude} ({value:+.3})", action.replace('_', " "))
            })
            .collect();
        adjustments.sort();
        let adjustment_text = if adjustments.is_empty() {
            "maintain current operational parameters".to_string()
        } else {
            adjustments.join("; ")
        };
        parts.push(format!(
            "**PROCESS OPTIMIZATION ANALYSIS:**\n\
             The {} reinforcement learning policy recommends: {adjustment_text}.",
            metrics.rl_model_type
        ));
    }

    parts.push(format!(
        "**SYSTEM HEALTH:**\n\
         The monitoring infrastructure reports {} status with {} and {} collection errors during \
         this cycle.",
        health.overall_status, health.data_availability, health.collection_errors
    ));

    parts.join("\n\n")
}

fn trend_word(start: f64, end: f64) -> &'static str {
    if end > start {
        "increasing"
    } else if end < start {
        "decreasing"
    } else {
        "stable"
    }
}

pub fn recommendations(metrics: &MetricsSnapshot) -> Vec<String> {
    let mut recs: Vec<String> = Vec::new();
    let success_rate = metrics.collection_success_rate;
    let health = &metrics.system_health;

    if success_rate < 80.0 {
        recs.push(format!(
            "**CRITICAL DATA INFRASTRUCTURE:** Investigate and resolve data collection issues; \
             only {success_rate:.1}% of monitoring systems are reporting. Implement redundant \
             collection pathways and run full system diagnostics."
        ));
    } else if success_rate < 100.0 {
        recs.push(format!(
            "**DATA RELIABILITY ENHANCEMENT:** Current {success_rate:.1}% collection performance \
             indicates minor connectivity or configuration issues to address during the next \
             maintenance window."
        ));
    }

    if let Some(score) = metrics.quality_score {
        if score < 0.7 {
            recs.push(format!(
                "**URGENT QUALITY IMPROVEMENT:** Quality score of {score:.3} is below acceptable \
                 thresholds. Initiate process reviews, conduct root cause analysis, and consider \
                 temporary production holds until standards are restored."
            ));
        } else if score < 0.85 {
            recs.push(format!(
                "**QUALITY OPTIMIZATION:** Quality score of {score:.3} indicates room for \
                 improvement. Review process parameters and apply statistical process control to \
                 improve consistency."
            ));
        } else {
            recs.push(format!(
                "**QUALITY MAINTENANCE:** Quality score of {score:.3} reflects strong \
                 performance. Continue current practices while monitoring for degradation trends."
            ));
        }
    }

    if let Some(prob) = metrics.defect_probability {
        if prob > 0.5 {
            recs.push(format!(
                "**DEFECT REDUCTION INITIATIVE:** Defect probability of {prob:.2} requires \
                 attention. Conduct root cause analysis, review process control parameters, and \
                 consider production adjustments until the risk recedes."
            ));
        }
    }

    if let Some(waste) = metrics.predicted_waste {
        if waste > 1500.0 {
            recs.push(format!(
                "**WASTE REDUCTION STRATEGY:** Forecasted waste of {waste:.1} units exceeds \
                 optimal levels. Review material usage efficiency and optimize process parameters."
            ));
        }
    }
    if let Some(production) = metrics.predicted_production {
        if production < 15.0 {
            recs.push(format!(
                "**PRODUCTION OPTIMIZATION:** Forecasted production of {production:.1} units may \
                 be below capacity targets. Review equipment utilization and batch scheduling."
            ));
        }
    }

    match health.overall_status {
        HealthState::Critical => recs.push(
            "**EMERGENCY SYSTEM INTERVENTION:** Critical system status requires immediate \
             technical response. Activate manual quality checks until monitoring is restored."
                .to_string(),
        ),
        HealthState::Degraded => recs.push(
            "**SYSTEM PERFORMANCE ENHANCEMENT:** Degraded system performance requires proactive \
             maintenance. Schedule diagnostics and verify sensor calibrations."
                .to_string(),
        ),
        HealthState::Healthy => {}
    }

    recs.push(
        "**REGULATORY COMPLIANCE VERIFICATION:** Conduct periodic compliance audits against FDA \
         21 CFR Part 11 requirements, verifying electronic record integrity and audit trail \
         completeness."
            .to_string(),
    );
    recs.push(
        "**CONTINUOUS IMPROVEMENT:** Maintain a Quality by Design framework with statistical \
         process control and regular process capability studies."
            .to_string(),
    );

    recs
}

pub fn compliance_status(metrics: &MetricsSnapshot) -> String {
    let mut score: i32 = 100;
    let mut issues: Vec<String> = Vec::new();
    let success_rate = metrics.collection_success_rate;
    let errors = metrics.system_health.collection_errors;

    if success_rate < 95.0 {
        score -= 15;
        issues.push(format!(
            "Data collection rate of {success_rate:.1}% falls below the recommended availability \
             standard for continuous process verification"
        ));
    }
    if let Some(quality) = metrics.quality_score {
        if quality < 0.8 {
            score -= 20;
            issues.push(format!(
                "Quality score of {quality:.3} is below the regulatory minimum threshold \
                 specified in ICH Q7 guidelines"
            ));
        }
    }
    if let Some(prob) = metrics.defect_probability {
        if prob > 0.6 {
            score -= 25;
            issues.push(format!(
                "Defect probability of {prob:.2} exceeds the acceptable limit established in \
                 quality management standards"
            ));
        }
    }
    if errors >= 3 {
        score -= 10;
        issues.push(format!(
            "System errors ({errors} instances) may compromise data integrity requirements under \
             21 CFR Part 11"
        ));
    }

    let (status, description) = if score >= 90 {
        (
            "FULLY COMPLIANT",
            "All manufacturing processes and quality systems meet or exceed regulatory requirements.",
        )
    } else if score >= 75 {
        (
            "SUBSTANTIALLY COMPLIANT",
            "Operations meet most regulatory requirements with minor deviations that require monitoring and corrective action planning.",
        )
    } else if score >= 60 {
        (
            "PARTIALLY COMPLIANT",
            "Significant compliance gaps identified that require corrective and preventive actions; regulatory risk is elevated.",
        )
    } else {
        (
            "NON-COMPLIANT",
            "Critical compliance violations identified that pose serious regulatory risk and require immediate intervention.",
        )
    };

    let quality_compliant = metrics.quality_score.is_some_and(|q| q >= 0.8);
    let mut report = format!(
        "**REGULATORY COMPLIANCE STATUS: {status}**\n\
         **Compliance Score: {score}/100**\n\n\
         {description}\n\n\
         **REGULATORY FRAMEWORK EVALUATION:**\n\
         - FDA 21 CFR Part 11 (Electronic Records): {}\n\
         - ICH Q7 (Good Manufacturing Practice): {}\n\
         - Data Integrity (ALCOA+ Principles): {}",
        if errors < 2 { "Compliant" } else { "Requires Attention" },
        if quality_compliant { "Compliant" } else { "Requires Improvement" },
        if success_rate >= 95.0 { "Compliant" } else { "Needs Enhancement" },
    );

    if !issues.is_empty() {
        report.push_str("\n\n**COMPLIANCE GAPS IDENTIFIED:**");
        for (i, issue) in issues.iter().enumerate() {
            report.push_str(&format!("\n{}. {issue}", i + 1));
        }
    }
    report
}

struct RiskFactor {
    name: &'static str,
    score: u32,
    description: String,
    mitigation: &'static str,
}

pub fn risk_assessment(metrics: &MetricsSnapshot) -> String {
    let mut factors: Vec<RiskFactor> = Vec::new();
    let success_rate = metrics.collection_success_rate;
    let health = &metrics.system_health;

    if success_rate < 60.0 {
        factors.push(RiskFactor {
            name: "CRITICAL DATA LOSS RISK",
            score: 25,
            description: format!(
                "Severe data collection failures ({success_rate:.1}% success rate) create blind \
                 spots in quality monitoring that could result in undetected batch failures."
            ),
            mitigation: "Implement immediate system redundancy and manual monitoring protocols.",
        });
    } else if success_rate < 80.0 {
        factors.push(RiskFactor {
            name: "MODERATE DATA RELIABILITY RISK",
            score: 15,
            description: format!(
                "Partial data collection losses ({success_rate:.1}% success rate) may delay \
                 detection of process deviations."
            ),
            mitigation: "Enhance reliability through redundant data paths and proactive monitoring.",
        });
    }

    if let Some(quality) = metrics.quality_score {
        if quality < 0.6 {
            factors.push(RiskFactor {
                name: "HIGH QUALITY FAILURE RISK",
                score: 30,
                description: format!(
                    "Poor quality performance (score {quality:.3}) indicates imminent risk of \
                     batch failures and regulatory non-compliance."
                ),
                mitigation: "Immediate process review, root cause analysis, and consideration of a temporary production hold.",
            });
        } else if quality < 0.8 {
            factors.push(RiskFactor {
                name: "ELEVATED QUALITY RISK",
                score: 20,
                description: format!(
                    "Declining quality trends (score {quality:.3}) suggest potential future batch \
                     quality issues."
                ),
                mitigation: "Enhanced statistical process control and increased sampling frequency.",
            });
        }
    }

    if let Some(prob) = metrics.defect_probability {
        if prob > 0.7 {
            factors.push(RiskFactor {
                name: "CRITICAL DEFECT RISK",
                score: 25,
                description: format!(
                    "High defect probability ({prob:.2}) indicates potential systematic \
                     manufacturing issues that could escalate to major quality events."
                ),
                mitigation: "Comprehensive process analysis and immediate corrective actions.",
            });
        } else if prob > 0.5 {
            factors.push(RiskFactor {
                name: "ELEVATED DEFECT RISK",
                score: 15,
                description: format!(
                    "Elevated defect probability ({prob:.2}) requires careful monitoring to \
                     prevent escalation."
                ),
                mitigation: "Enhanced defect trend analysis and targeted process improvements.",
            });
        }
    }

    match health.overall_status {
        HealthState::Critical => factors.push(RiskFactor {
            name: "CRITICAL SYSTEM FAILURE RISK",
            score: 35,
            description: format!(
                "Critical system state ({} collection errors) poses immediate risk to \
                 manufacturing oversight and regulatory compliance.",
                health.collection_errors
            ),
            mitigation: "Emergency system restoration and manual monitoring protocols.",
        }),
        HealthState::Degraded => factors.push(RiskFactor {
            name: "SYSTEM RELIABILITY RISK",
            score: 20,
            description: format!(
                "Degraded system performance ({} collection errors) may compromise monitoring \
                 effectiveness and data integrity.",
                health.collection_errors
            ),
            mitigation: "Proactive maintenance and redundancy implementation.",
        }),
        HealthState::Healthy => {}
    }

    let total: u32 = factors.iter().map(|f| f.score).sum();
    let (level, description) = if total >= 60 {
        (
            "CRITICAL",
            "Immediate intervention required to prevent severe operational and regulatory consequences.",
        )
    } else if total >= 40 {
        (
            "HIGH",
            "Significant risks identified requiring urgent management attention and corrective action.",
        )
    } else if total >= 20 {
        (
            "MODERATE",
            "Manageable risks requiring monitoring and planned corrective actions.",
        )
    } else {
        (
            "LOW",
            "Minimal risks identified; standard monitoring and maintenance are sufficient.",
        )
    };

    let mut report = format!(
        "**OPERATIONAL RISK ASSESSMENT**\n\
         **Overall Risk Level: {level}**\n\n\
         {description}"
    );

    if factors.is_empty() {
        report.push_str(
            "\n\nNo significant operational risk factors were identified from the current data.",
        );
    } else {
        report.push_str(&format!("\n**Risk Score: {total}/100**\n\n**DETAILED RISK ANALYSIS:**"));
        for (i, factor) in factors.iter().enumerate() {
            report.push_str(&format!(
                "\n\n**{}. {} (Impact Score: {})**\n\
                 Description: {}\n\
                 Recommended Mitigation: {}",
                i + 1,
                factor.name,
                factor.score,
                factor.description,
                factor.mitigation
            ));
        }
    }
    report
}

pub fn action_items(metrics: &MetricsSnapshot) -> Vec<String> {
    let mut actions: Vec<String> = Vec::new();
    let success_rate = metrics.collection_success_rate;
    let health = &metrics.system_health;

    if health.overall_status == HealthState::Critical {
        actions.push(
            "[ALERT] **CRITICAL (0-2 hours):** Initiate emergency response protocol for critical \
             system status; implement manual monitoring until full restoration."
                .to_string(),
        );
    }
    if success_rate < 50.0 {
        actions.push(
            "[ALERT] **CRITICAL (0-4 hours):** Restore data collection systems immediately; less \
             than half of the monitoring capacity is operational."
                .to_string(),
        );
    }

    if let Some(quality) = metrics.quality_score {
        if quality < 0.6 {
            actions.push(format!(
                "[WARNING] **URGENT (4-12 hours):** Investigate quality score decline to \
                 {quality:.3}; review process parameters and consider temporary production \
                 adjustments."
            ));
        }
    }
    if let Some(prob) = metrics.defect_probability {
        if prob > 0.7 {
            actions.push(format!(
                "[WARNING] **URGENT (8-24 hours):** Conduct root cause analysis for the {prob:.2} \
                 defect probability; develop an immediate corrective action plan."
            ));
        }
    }

    if success_rate < 85.0 {
        actions.push(format!(
            "[HIGH] **HIGH PRIORITY (24-48 hours):** Improve data collection reliability from \
             {success_rate:.1}%; audit infrastructure and establish proactive monitoring."
        ));
    }
    if health.collection_errors >= 2 {
        actions.push(format!(
            "[HIGH] **HIGH PRIORITY (24-72 hours):** Resolve {} collection errors through \
             diagnostic review of logs and connectivity.",
            health.collection_errors
        ));
    }

    if let Some(waste) = metrics.predicted_waste {
        if waste > 1200.0 {
            actions.push(format!(
                "[MEDIUM] **MEDIUM PRIORITY (3-5 days):** Implement a waste reduction strategy \
                 for the forecasted {waste:.1} units; review material usage efficiency."
            ));
        }
    }

    actions.extend([
        "**ROUTINE (Weekly):** Conduct quality metrics review with the cross-functional team and \
         update process capability studies."
            .to_string(),
        "**ROUTINE (Bi-weekly):** Update regulatory compliance documentation and verify audit \
         trail integrity."
            .to_string(),
        "**STRATEGIC (30 days):** Review the Quality by Design framework and validate critical \
         quality attributes against current performance."
            .to_string(),
    ]);

    actions.truncate(12);
    actions
}
