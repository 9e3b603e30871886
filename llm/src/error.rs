use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("LLM client not available: {0}")]
    Unavailable(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("LLM request failed: {0}")]
    Http(String),

    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Only rate-limit-class errors are retried; everything else fails the
    /// attempt chain immediately.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::RateLimited(_))
    }
}
