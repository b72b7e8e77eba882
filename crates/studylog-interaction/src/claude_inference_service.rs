//! ClaudeInferenceService - InferenceService over the Claude Messages API.
//!
//! Configuration comes from `[inference]` in `config.toml`; the API key may
//! also be supplied through `ANTHROPIC_API_KEY`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use studylog_core::config::InferenceConfig;
use studylog_core::inference::{ExtractionRequest, InferenceService, MatchRequest};
use studylog_core::{Result, StudyLogError};

use crate::prompts::{PromptRenderer, RenderedPrompt};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Inference backend that talks to the Claude HTTP API.
#[derive(Clone)]
pub struct ClaudeInferenceService {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    prompts: PromptRenderer,
}

impl ClaudeInferenceService {
    /// Creates a service from the inference configuration.
    ///
    /// # Errors
    ///
    /// Returns `StudyLogError::Config` when no API key is configured, or when
    /// the HTTP client cannot be built.
    pub fn from_config(config: &InferenceConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                StudyLogError::config(
                    "No API key: set ANTHROPIC_API_KEY or [inference].api_key in config.toml",
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StudyLogError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            max_tokens: config.max_tokens,
            prompts: PromptRenderer::new(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: RenderedPrompt) -> Result<String> {
        let request = CreateMessageRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![ContentBlock::Text { text: prompt.user }],
            }],
            max_tokens: self.max_tokens,
            system: Some(prompt.system),
            temperature: Some(0.0),
        };

        self.send_request(&request).await
    }

    async fn send_request(&self, body: &CreateMessageRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| {
                StudyLogError::inference(
                    format!("Claude API request failed: {err}"),
                    err.is_connect() || err.is_timeout(),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Claude error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let parsed: CreateMessageResponse = response.json().await.map_err(|err| {
            StudyLogError::inference(format!("Failed to parse Claude response: {err}"), false)
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl InferenceService for ClaudeInferenceService {
    async fn extract_fields(&self, request: &ExtractionRequest) -> Result<String> {
        let prompt = self.prompts.extraction(request)?;
        tracing::debug!(model = %self.model, "Requesting field extraction");
        self.complete(prompt).await
    }

    async fn match_assignments(&self, request: &MatchRequest) -> Result<String> {
        let prompt = self.prompts.matching(request)?;
        tracing::debug!(
            model = %self.model,
            candidates = request.assignments.len(),
            "Requesting assignment matching"
        );
        self.complete(prompt).await
    }
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
}

#[derive(Debug, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlockResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlockResponse {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: CreateMessageResponse) -> Result<String> {
    let text: Vec<String> = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlockResponse::Text { text } => Some(text),
            ContentBlockResponse::Other => None,
        })
        .collect();

    if text.is_empty() {
        return Err(StudyLogError::inference(
            "Claude API returned no text in the response content",
            false,
        ));
    }
    Ok(text.join("\n"))
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> StudyLogError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    ) || status.as_u16() == 529;

    let message = match retry_after {
        Some(delay) => format!(
            "Claude API returned {}: {} (retry after {}s)",
            status.as_u16(),
            message,
            delay.as_secs()
        ),
        None => format!("Claude API returned {}: {}", status.as_u16(), message),
    };
    StudyLogError::inference(message, is_retryable)
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    // HTTP-date values are ignored; Anthropic sends seconds.
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
