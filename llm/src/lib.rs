//! LLM integration for report generation.
//!
//! Two client tiers share one contract: callers always get content back.
//! [`ReportLlmClient`] retries rate-limited calls with exponential backoff
//! and recovers through a reduced-context compact mode;
//! [`SimpleLlmClient`] is a flat single-shot variant. Both degrade to a
//! deterministic fallback text block instead of erroring.

mod cleaning;
mod client;
mod error;
mod fallback;
pub mod prompts;
mod report_client;
mod simple;

pub use cleaning::clean_content;
pub use client::{GenerationParams, HttpLlmService, LlmCompletion, LlmService, MockLlmService};
pub use error::LlmError;
pub use fallback::fallback_content;
pub use report_client::ReportLlmClient;
pub use simple::SimpleLlmClient;
