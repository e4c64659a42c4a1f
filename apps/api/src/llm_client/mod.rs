//! LLM Client: the single point of entry for all generation backend calls.
//!
//! ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
//! Feature modules depend on the `GenerationBackend` trait, never on `LlmClient`.
//!
//! Model: claude-sonnet-4-5, fixed for every call.
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod backend;
pub mod prompts;
#[cfg(test)]
pub mod testing;

pub use backend::{generate_json, Citation, Generation, GenerationBackend, StructuredGeneration, Tool};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

/// One block of the response. Server tool blocks (`server_tool_use`,
/// `web_search_tool_result`) carry no text and are skipped by the accessors.
#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
    #[serde(default)]
    pub citations: Option<Vec<CitationBlock>>,
}

#[derive(Debug, Deserialize)]
pub struct CitationBlock {
    pub url: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.text_blocks().next()
    }

    /// All text blocks concatenated. Web search answers are split into many
    /// blocks around cited spans.
    pub fn joined_text(&self) -> String {
        self.text_blocks().collect()
    }

    /// Cited URLs in order of first appearance.
    pub fn citations(&self) -> Vec<Citation> {
        let mut seen: Vec<Citation> = Vec::new();
        for block in &self.content {
            for cite in block.citations.iter().flatten() {
                if let Some(url) = cite.url.as_deref().filter(|u| !u.is_empty()) {
                    if !seen.iter().any(|c| c.url == url) {
                        seen.push(Citation {
                            url: url.to_string(),
                            title: cite.title.clone(),
                        });
                    }
                }
            }
        }
        seen
    }

    fn text_blocks(&self) -> impl Iterator<Item = &str> {
        self.content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The single LLM client used by all services.
/// Wraps the Anthropic Messages API with optional retry and structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    /// Extra attempts on 429/5xx. Zero means every call is attempted exactly once.
    max_retries: u32,
}

impl LlmClient {
    pub fn new(api_key: String, max_retries: u32) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            max_retries,
        })
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff when
    /// `max_retries > 0`.
    pub async fn call(
        &self,
        prompt: &str,
        system: &str,
        tools: &[Tool],
    ) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
            tools: tools.iter().map(Tool::to_anthropic).collect(),
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(5)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}, tools={}",
                llm_response.usage.input_tokens,
                llm_response.usage.output_tokens,
                tools.len()
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: self.max_retries,
        }))
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Parses a JSON payload out of model output. Falls back to the outermost
/// `{..}` / `[..]` span when the model wrapped the JSON in prose.
fn parse_json_payload(text: &str) -> Result<serde_json::Value, LlmError> {
    let text = strip_json_fences(text);
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(err) => {
            let start = text.find(['{', '[']);
            let end = text.rfind(['}', ']']);
            match (start, end) {
                (Some(s), Some(e)) if e > s => {
                    serde_json::from_str(&text[s..=e]).map_err(LlmError::Parse)
                }
                _ => Err(LlmError::Parse(err)),
            }
        }
    }
}
