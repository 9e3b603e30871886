//! Flat single-shot client used by the optimized report path: no retry,
//! no compaction, same fallback-on-unavailable contract.

use std::sync::Arc;

use pl_core::types::{ContextHit, GenerationResult, GenerationStatus};

use crate::cleaning::clean_content;
use crate::client::{GenerationParams, LlmService};
use crate::fallback::fallback_content;

pub struct SimpleLlmClient {
    service: Arc<dyn LlmService>,
    model_name: String,
}

impl SimpleLlmClient {
    pub fn new(service: Arc<dyn LlmService>, model_name: &str) -> Self {
        Self {
            service,
            model_name: model_name.to_string(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.service.is_available()
    }

    /// One generation attempt with a condensed prompt. Any failure yields
    /// the deterministic fallback content.
    pub async fn generate_rag_report(
        &self,
        query: &str,
        context: &[ContextHit],
        report_type: &str,
    ) -> GenerationResult {
        if !self.service.is_available() {
            return self.fallback(report_type);
        }

        let context_text = if context.is_empty() {
            "No historical context available.".to_string()
        } else {
            context
                .iter()
                .take(3)
                .map(|item| item.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        let system = "You are an expert pharmaceutical manufacturing analyst specializing in \
                      quality control and process optimization. Generate professional, \
                      regulatory-compliant reports. Reports must be factual, data-driven, free \
                      of emojis, and focused on actionable insights.";
        let user = format!(
            "Generate a comprehensive {} report based on the following:\n\n\
             QUERY: {query}\n\n\
             HISTORICAL CONTEXT:\n{context_text}\n\n\
             Please generate a professional pharmaceutical manufacturing report with the \
             following sections:\n\
             1. Executive Summary\n\
             2. Current Status Assessment\n\
             3. Key Metrics Analysis\n\
             4. Risk Assessment\n\
             5. Recommendations\n\
             6. Compliance Status",
            report_type.replace('_', " "),
        );
        let prompt = format!("{system}\n\n{user}");

        let params = GenerationParams {
            max_output_tokens: 2000,
            ..GenerationParams::default()
        };

        match self.service.generate(&prompt, &params).await {
            Ok(completion) => GenerationResult {
                status: GenerationStatus::Success,
                content: clean_content(&completion.text),
                model_used: self.model_name.clone(),
                tokens_used: completion.total_tokens.unwrap_or(0),
                attempts: 1,
            },
            Err(e) => {
                tracing::error!(error = %e, "Simple report generation failed");
                self.fallback(report_type)
            }
        }
    }

    fn fallback(&self, report_type: &str) -> GenerationResult {
        GenerationResult {
            status: GenerationStatus::Fallback,
            content: fallback_content(report_type),
            model_used: "fallback".to_string(),
            tokens_used: 0,
            attempts: 1,
        }
    }
}
