//! LLM completion service client
//!
//! The forecasting harness only needs one thing from the service: send a
//! prompt, get back zero or more free-text completions. The
//! `CompletionClient` trait is the seam; `OpenAiClient` is the production
//! implementation against an OpenAI-style chat completions endpoint, with
//! a bounded timeout and a capped retry policy since this is the one
//! genuinely unreliable external dependency.

use crate::error::{ForecastError, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default chat completions endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default completion model.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Total attempts per request (1 initial + retries).
const MAX_ATTEMPTS: usize = 3;

/// Base delay between attempts; grows linearly with the attempt number.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// A single multi-sample completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System instructions.
    pub system: String,
    /// User prompt.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Number of stochastic completions to request.
    pub num_samples: usize,
    /// Output token cap per completion.
    pub max_tokens: usize,
}

/// A completion service the LLMTime harness can sample from.
pub trait CompletionClient {
    /// Request `num_samples` completions for the prompt. Returns the raw
    /// completion texts; the caller is responsible for parsing and
    /// validating them.
    fn complete(&self, request: &CompletionRequest) -> Result<Vec<String>>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    n: usize,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Blocking client for an OpenAI-style chat completions endpoint.
#[derive(Debug)]
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a client with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create a client from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ForecastError::LlmError("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    /// Override the completion model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the endpoint base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn send_once(&self, request: &CompletionRequest) -> Result<Vec<String>> {
        let payload = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            n: request.num_samples,
            max_tokens: request.max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ForecastError::LlmError(format!(
                "Completion request failed with status {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response.json()?;
        Ok(parsed
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .collect())
    }

    fn is_retryable(error: &ForecastError) -> bool {
        match error {
            ForecastError::HttpError(_) => true,
            ForecastError::LlmError(message) => {
                message.contains("status 429") || message.contains("status 5")
            }
            _ => false,
        }
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> Result<Vec<String>> {
        let mut last_error = None;

        for attempt in 1..=MAX_ATTEMPTS {
            match self.send_once(request) {
                Ok(completions) => return Ok(completions),
                Err(err) => {
                    if !Self::is_retryable(&err) || attempt == MAX_ATTEMPTS {
                        return Err(err);
                    }
                    warn!(
                        "Completion attempt {}/{} failed ({}); retrying",
                        attempt, MAX_ATTEMPTS, err
                    );
                    last_error = Some(err);
                    std::thread::sleep(RETRY_BACKOFF * attempt as u32);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ForecastError::LlmError("Completion request failed".to_string())))
    }
}
