//! Text-completion service clients.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::Mutex;

use crate::error::LlmError;

/// Fixed generation parameters for report prompts.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 4000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmCompletion {
    pub text: String,
    pub total_tokens: Option<u64>,
}

/// Black-box text-completion service taking one concatenated prompt.
#[async_trait]
pub trait LlmService: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<LlmCompletion, LlmError>;

    fn is_available(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    total_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    text: String,
    usage: Option<CompletionUsage>,
}

/// Client for a REST text-completion endpoint
/// (`POST {base}/v1/generate`).
pub struct HttpLlmService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpLlmService {
    pub fn new(base_url: &str, api_key: Option<String>, model: &str) -> Self {
        if api_key.is_none() {
            tracing::warn!("No LLM API key provided; requests may be rejected");
        }
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmService for HttpLlmService {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<LlmCompletion, LlmError> {
        let url = format!("{}/v1/generate", self.base_url);
        let request = CompletionRequest {
            model: &self.model,
            prompt,
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            max_output_tokens: params.max_output_tokens,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::RateLimited(format!("HTTP 429: {body}")));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            // Some providers report quota exhaustion with a generic status.
            if body.to_lowercase().contains("quota") {
                return Err(LlmError::RateLimited(body));
            }
            return Err(LlmError::Http(format!("HTTP {}: {body}", status.as_u16())));
        }

        let body: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(LlmCompletion {
            text: body.text,
            total_tokens: body.usage.map(|u| u.total_tokens),
        })
    }
}

/// Scripted service for tests: pops one outcome per call and records every
/// prompt it sees.
pub struct MockLlmService {
    outcomes: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
    available: bool,
}

impl MockLlmService {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub async fn push_response(&self, text: &str) {
        self.outcomes.lock().await.push_back(Ok(text.to_string()));
    }

    pub async fn push_error(&self, error: LlmError) {
        self.outcomes.lock().await.push_back(Err(error));
    }

    /// Prompts seen so far, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

impl Default for MockLlmService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<LlmCompletion, LlmError> {
        self.prompts.lock().await.push(prompt.to_string());
        match self.outcomes.lock().await.pop_front() {
            Some(Ok(text)) => Ok(LlmCompletion {
                text,
                total_tokens: Some(100),
            }),
            Some(Err(e)) => Err(e),
            None => Ok(LlmCompletion {
                text: format!("Mock response for: {}", prompt.chars().take(40).collect::<String>()),
                total_tokens: None,
            }),
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }
}
