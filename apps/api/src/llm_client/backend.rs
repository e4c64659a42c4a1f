//! The generation backend seam: "prompt in, typed result out, may fail".

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::prompts::{JSON_ONLY_SYSTEM, WRITER_SYSTEM};
use super::{parse_json_payload, LlmClient, LlmError};

/// Server-side tools a call may enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    WebSearch { max_uses: u32 },
}

impl Tool {
    pub(crate) fn to_anthropic(&self) -> Value {
        match self {
            Tool::WebSearch { max_uses } => json!({
                "type": "web_search_20250305",
                "name": "web_search",
                "max_uses": max_uses,
            }),
        }
    }
}

/// A grounding source reported by a search-augmented call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct StructuredGeneration {
    pub value: Value,
    pub citations: Vec<Citation>,
}

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Free-form text. An empty answer is an error, not an empty string.
    async fn generate_text(&self, prompt: &str, tools: &[Tool]) -> Result<Generation, LlmError>;

    /// JSON shaped by `schema`.
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &Value,
        tools: &[Tool],
    ) -> Result<StructuredGeneration, LlmError>;
}

/// Calls `generate_structured` and deserializes the payload into `T`.
pub async fn generate_json<T: DeserializeOwned>(
    backend: &dyn GenerationBackend,
    prompt: &str,
    schema: &Value,
    tools: &[Tool],
) -> Result<(T, Vec<Citation>), LlmError> {
    let generation = backend.generate_structured(prompt, schema, tools).await?;
    let parsed = serde_json::from_value(generation.value)?;
    Ok((parsed, generation.citations))
}

#[async_trait]
impl GenerationBackend for LlmClient {
    async fn generate_text(&self, prompt: &str, tools: &[Tool]) -> Result<Generation, LlmError> {
        let response = self.call(prompt, WRITER_SYSTEM, tools).await?;
        let text = response.joined_text().trim().to_string();
        if text.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(Generation { text })
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &Value,
        tools: &[Tool],
    ) -> Result<StructuredGeneration, LlmError> {
        let schema_text = serde_json::to_string_pretty(schema)?;
        let prompt = format!(
            "{prompt}\n\nRespond with JSON that matches this JSON Schema exactly:\n{schema_text}"
        );

        let response = self.call(&prompt, JSON_ONLY_SYSTEM, tools).await?;
        let text = response.joined_text();
        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }

        Ok(StructuredGeneration {
            value: parse_json_payload(&text)?,
            citations: response.citations(),
        })
    }
}
