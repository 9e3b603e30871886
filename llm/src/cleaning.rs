//! Normalization of model-generated markdown.

use regex::Regex;
use std::sync::OnceLock;

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[•*]\s+").expect("valid regex"))
}

fn blank_runs_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"))
}

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(#{1,3})\s*(\S[^\n]*)$").expect("valid regex"))
}

/// Cleans generated content: uniform `-` bullets, normalized header
/// spacing, and at most one blank line between blocks.
pub fn clean_content(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let content = bullet_re().replace_all(content.trim(), "- ");
    let content = header_re().replace_all(&content, "\n$1 $2\n");
    let content = blank_runs_re().replace_all(&content, "\n\n");
    content.trim().to_string()
}
