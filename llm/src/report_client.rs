//! The comprehensive report-generation client: retry with exponential
//! backoff on rate limits, one compact-mode recovery pass, deterministic
//! fallback on total failure.

use std::sync::Arc;
use std::time::Duration;

use config::RetryPolicy;
use pl_core::types::{ContextHit, GenerationResult, GenerationStatus, MetricsSnapshot};

use crate::cleaning::clean_content;
use crate::client::{GenerationParams, LlmService};
use crate::fallback::fallback_content;
use crate::prompts;

pub struct ReportLlmClient {
    service: Arc<dyn LlmService>,
    model_name: String,
    retry: RetryPolicy,
    params: GenerationParams,
}

impl ReportLlmClient {
    pub fn new(service: Arc<dyn LlmService>, model_name: &str, retry: RetryPolicy) -> Self {
        Self {
            service,
            model_name: model_name.to_string(),
            retry,
            params: GenerationParams::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.service.is_available()
    }

    /// Generates a report, retrying rate-limited calls with exponentially
    /// growing delay. The final rate-limited attempt recurses once into
    /// compact mode before giving up; any other error class fails
    /// immediately. Total failure yields the deterministic fallback block,
    /// never an error.
    pub async fn generate_comprehensive_report(
        &self,
        query: &str,
        context: &[ContextHit],
        report_type: &str,
        metrics: &MetricsSnapshot,
        use_compact_mode: bool,
    ) -> GenerationResult {
        if !self.service.is_available() {
            return self.fallback_result(report_type, 0);
        }

        let context_text = prompts::build_context_text(context, metrics, use_compact_mode);
        let system = prompts::system_prompt(report_type, use_compact_mode);
        let user = prompts::user_prompt(query, &context_text, report_type, metrics, use_compact_mode);
        let full_prompt = format!("{system}\n\n{user}");

        for attempt in 0..self.retry.max_attempts {
            match self.service.generate(&full_prompt, &self.params).await {
                Ok(completion) => {
                    let content = clean_content(&completion.text);
                    let tokens_used = completion
                        .total_tokens
                        .unwrap_or_else(|| estimate_tokens(&full_prompt, &content));
                    return GenerationResult {
                        status: GenerationStatus::Success,
                        content,
                        model_used: self.model_name.clone(),
                        tokens_used,
                        attempts: attempt + 1,
                    };
                }
                Err(e) if e.is_rate_limit() => {
                    if attempt + 1 < self.retry.max_attempts {
                        let delay = self.retry.delay_ms(attempt);
                        tracing::warn!(
                            delay_ms = delay,
                            attempt = attempt + 1,
                            max_attempts = self.retry.max_attempts,
                            "Rate limit hit, retrying"
                        );
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    } else if !use_compact_mode {
                        tracing::warn!("Final attempt with compact mode to reduce token usage");
                        return Box::pin(self.generate_comprehensive_report(
                            query,
                            context,
                            report_type,
                            metrics,
                            true,
                        ))
                        .await;
                    } else {
                        tracing::error!(
                            attempts = self.retry.max_attempts,
                            "Rate limit exceeded, falling back to template"
                        );
                        return self.fallback_result(report_type, self.retry.max_attempts);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Non-rate-limit generation error");
                    return self.fallback_result(report_type, attempt + 1);
                }
            }
        }

        self.fallback_result(report_type, self.retry.max_attempts)
    }

    fn fallback_result(&self, report_type: &str, attempts: u32) -> GenerationResult {
        GenerationResult {
            status: GenerationStatus::Fallback,
            content: fallback_content(report_type),
            model_used: "fallback".to_string(),
            tokens_used: 0,
            attempts,
        }
    }
}

/// Rough usage estimate (~4 characters per token) when the provider
/// returns no usage metadata.
fn estimate_tokens(prompt: &str, response: &str) -> u64 {
    ((prompt.len() + response.len()) / 4) as u64
}
