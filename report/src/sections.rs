//! Splitting free-text LLM output into named report sections.
//!
//! The prompt asks the model for a fixed set of markdown headers, so a
//! strict header pass runs first. When the model ignored the format, a
//! case-insensitive keyword scan over every line recovers whatever
//! structure it can. Either way the caller gets a full section set.

use regex::Regex;
use std::sync::OnceLock;

use pl_core::types::ReportSections;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    ExecutiveSummary,
    DetailedAnalysis,
    Recommendations,
    ComplianceStatus,
    RiskAssessment,
    ActionItems,
}

impl SectionKind {
    /// Keyword sets for the lenient scan; a line containing any keyword
    /// switches the active section.
    fn keywords(self) -> &'static [&'static str] {
        match self {
            SectionKind::ExecutiveSummary => &["executive", "summary"],
            SectionKind::DetailedAnalysis => &["detailed", "analysis"],
            SectionKind::Recommendations => &["recommendation"],
            SectionKind::ComplianceStatus => &["compliance"],
            SectionKind::RiskAssessment => &["risk", "assessment"],
            SectionKind::ActionItems => &["action", "item"],
        }
    }

    /// Exact header text the prompt requested, for the strict pass.
    fn header(self) -> &'static str {
        match self {
            SectionKind::ExecutiveSummary => "EXECUTIVE SUMMARY",
            SectionKind::DetailedAnalysis => "DETAILED TECHNICAL ANALYSIS",
            SectionKind::Recommendations => "RECOMMENDATIONS",
            SectionKind::ComplianceStatus => "COMPLIANCE STATUS",
            SectionKind::RiskAssessment => "RISK ASSESSMENT",
            SectionKind::ActionItems => "ACTION ITEMS",
        }
    }

    const ALL: [SectionKind; 6] = [
        SectionKind::ExecutiveSummary,
        SectionKind::DetailedAnalysis,
        SectionKind::RiskAssessment,
        SectionKind::Recommendations,
        SectionKind::ActionItems,
        SectionKind::ComplianceStatus,
    ];
}

fn header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#{1,3}\s*(.+?)\s*$").expect("valid header regex"))
}

/// Parses LLM output into structured sections.
///
/// Returns a full [`ReportSections`]; anything the model did not produce
/// stays empty except the executive summary, which falls back to a
/// truncated copy of the raw content so the report always has a lead.
pub fn parse_llm_content(content: &str) -> ReportSections {
    let mut sections = strict_header_pass(content)
        .unwrap_or_else(|| keyword_scan_pass(content));

    if sections.executive_summary.is_empty() {
        sections.executive_summary = truncate_chars(content, 500);
    }
    sections
}

/// Strict pass: markdown headers that match the requested section names.
/// Returns `None` when no requested header is present at all.
fn strict_header_pass(content: &str) -> Option<ReportSections> {
    let mut current: Option<SectionKind> = None;
    let mut buffers: Vec<(SectionKind, Vec<String>)> = Vec::new();
    let mut matched_any = false;

    for line in content.lines() {
        if let Some(captures) = header_pattern().captures(line.trim()) {
            let title = captures[1].to_uppercase();
            if let Some(kind) = SectionKind::ALL
                .iter()
                .copied()
                .find(|kind| title.contains(kind.header()))
            {
                matched_any = true;
                current = Some(kind);
                buffers.push((kind, Vec::new()));
                continue;
            }
        }
        if current.is_some() && !line.trim().is_empty() {
            if let Some((_, buffer)) = buffers.last_mut() {
                buffer.push(line.trim().to_string());
            }
        }
    }

    if !matched_any {
        return None;
    }
    Some(assemble(buffers))
}

/// Lenient pass: any line containing a section keyword switches the
/// active section; everything else accumulates under the current one.
fn keyword_scan_pass(content: &str) -> ReportSections {
    let mut buffers: Vec<(SectionKind, Vec<String>)> =
        vec![(SectionKind::ExecutiveSummary, Vec::new())];

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lower = trimmed.to_lowercase();
        let switched = SectionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.keywords().iter().any(|word| lower.contains(word)));

        if let Some(kind) = switched {
            buffers.push((kind, Vec::new()));
        } else if let Some((_, buffer)) = buffers.last_mut() {
            buffer.push(trimmed.to_string());
        }
    }

    assemble(buffers)
}

fn assemble(buffers: Vec<(SectionKind, Vec<String>)>) -> ReportSections {
    let mut sections = ReportSections::default();
    for (kind, lines) in buffers {
        if lines.is_empty() {
            continue;
        }
        match kind {
            SectionKind::ExecutiveSummary => append_text(&mut sections.executive_summary, &lines),
            SectionKind::DetailedAnalysis => append_text(&mut sections.detailed_analysis, &lines),
            SectionKind::ComplianceStatus => append_text(&mut sections.compliance_status, &lines),
            SectionKind::RiskAssessment => append_text(&mut sections.risk_assessment, &lines),
            SectionKind::Recommendations => sections.recommendations.extend(to_items(&lines)),
            SectionKind::ActionItems => sections.action_items.extend(to_items(&lines)),
        }
    }
    sections
}

fn append_text(target: &mut String, lines: &[String]) {
    let block = lines.join("\n");
    if target.is_empty() {
        *target = block;
    } else {
        target.push('\n');
        target.push_str(&block);
    }
}

/// Converts section lines to list items, stripping bullet and number
/// prefixes. Lines without markers become items verbatim.
fn to_items(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|line| {
            line.trim_start_matches(|c: char| {
                c == '-' || c == '•' || c == '*' || c == '.' || c.is_ascii_digit() || c == ' '
            })
            .to_string()
        })
        .filter(|item| !item.is_empty())
        .collect()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_headers_parse() {
        let content = "## EXECUTIVE SUMMARY\nAll metrics nominal.\n\n\
                       ## DETAILED TECHNICAL ANALYSIS\nDefect probability stayed flat.\n\
                       ## RISK ASSESSMENT\nLow risk overall.\n\
                       ## RECOMMENDATIONS\n- Keep monitoring\n- Audit sensors\n\
                       ## ACTION ITEMS\n1. Review batch 42\n\
                       ## COMPLIANCE STATUS\nFully compliant.";
        let sections = parse_llm_content(content);

        assert_eq!(sections.executive_summary, "All metrics nominal.");
        assert_eq!(sections.detailed_analysis, "Defect probability stayed flat.");
        assert_eq!(sections.risk_assessment, "Low risk overall.");
        assert_eq!(
            sections.recommendations,
            vec!["Keep monitoring", "Audit sensors"]
        );
        assert_eq!(sections.action_items, vec!["Review batch 42"]);
        assert_eq!(sections.compliance_status, "Fully compliant.");
    }

    #[test]
    fn test_strict_headers_match_prompt_contract() {
        // The strict pass must recognize every header the prompt requests.
        for kind in SectionKind::ALL {
            assert!(
                llm::prompts::REQUIRED_SECTIONS.contains(&kind.header()),
                "{} is not a requested header",
                kind.header()
            );
        }
    }

    #[test]
    fn test_keyword_scan_fallback() {
        let content = "Executive overview of the run\nEverything looks stable today.\n\
                       Risk notes\nDefect probability is elevated.\n\
                       Recommendations for the team\nIncrease sampling frequency.";
        let sections = parse_llm_content(content);

        assert!(sections.executive_summary.contains("stable"));
        assert!(sections.risk_assessment.contains("elevated"));
        assert_eq!(sections.recommendations, vec!["Increase sampling frequency."]);
    }

    #[test]
    fn test_unstructured_content_lands_in_summary() {
        let content = "The plant ran without incident overnight.";
        let sections = parse_llm_content(content);
        assert_eq!(
            sections.executive_summary,
            "The plant ran without incident overnight."
        );
        assert!(sections.detailed_analysis.is_empty());
    }

    #[test]
    fn test_missing_summary_falls_back_to_truncated_content() {
        // Everything lands under the risk section, so the summary is
        // backfilled from the raw content, truncated.
        let content = format!("Risk overview\n{}", "x".repeat(600));
        let sections = parse_llm_content(&content);
        assert!(sections.risk_assessment.starts_with("xxx"));
        assert_eq!(sections.executive_summary.chars().count(), 503);
        assert!(sections.executive_summary.ends_with("..."));
    }

    #[test]
    fn test_bullet_markers_are_stripped() {
        let lines = vec![
            "- first".to_string(),
            "• second".to_string(),
            "3. third".to_string(),
        ];
        assert_eq!(to_items(&lines), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_repeated_headers_accumulate() {
        let content = "## RISK ASSESSMENT\nPart one.\n## RISK ASSESSMENT\nPart two.";
        let sections = parse_llm_content(content);
        assert_eq!(sections.risk_assessment, "Part one.\nPart two.");
    }
}
