//! Deterministic fallback content used when generation is unavailable.

use chrono::Utc;

/// Fixed report body returned when the LLM cannot be reached or every
/// attempt failed. Callers always receive content, never an error.
pub fn fallback_content(report_type: &str) -> String {
    let title = title_case(&report_type.replace('_', " "));
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S");

    format!(
        "# {title} Report\n\n\
         **Generated:** {timestamp}\n\
         **Status:** Fallback Mode - LLM Unavailable\n\n\
         ## Executive Summary\n\
         This report was generated in fallback mode due to LLM service unavailability.\n\n\
         ## Current Status\n\
         - System Status: Monitoring\n\
         - Data Collection: Active\n\
         - Analysis: Manual review recommended\n\n\
         ## Recommendations\n\
         - Verify LLM service connectivity\n\
         - Check API key configuration\n\
         - Perform manual analysis\n\
         - Contact system administrator\n\n\
         ## Compliance Status\n\
         - Documentation: Complete\n\
         - Audit Trail: Maintained\n\
         - Manual verification required\n\n\
         *This is an automated fallback response. Manual review recommended.*"
    )
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_structure() {
        let content = fallback_content("quality_control");
        assert!(content.starts_with("# Quality Control Report"));
        assert!(content.contains("Fallback Mode"));
        assert!(content.contains("## Executive Summary"));
        assert!(content.contains("Manual review recommended"));
    }
}
