//! Report generation pipeline.
//!
//! Orchestrates concurrent data collection, metric extraction, knowledge
//! retrieval, and the fallback-chained generation strategy: LLM first,
//! deterministic template when the LLM is unavailable or fails, and a fixed
//! emergency artifact if the pipeline itself errors. `generate_report`
//! always returns a well-formed artifact, never an error.

pub mod document;
pub mod generator;
pub mod metrics;
pub mod sanitize;
pub mod sections;
pub mod template;

pub use generator::ReportGenerator;
pub use metrics::{CollectedBundle, extract_metrics};
pub use sanitize::{clean_text, sanitize_artifact};
pub use sections::parse_llm_content;
