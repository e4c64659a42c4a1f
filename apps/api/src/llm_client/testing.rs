//! Scripted `GenerationBackend` for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{Citation, Generation, GenerationBackend, LlmError, StructuredGeneration, Tool};

/// Replays queued responses in order, one queue per call kind.
/// An exhausted queue answers with `LlmError::EmptyContent`.
#[derive(Default)]
pub struct ScriptedBackend {
    text: Mutex<VecDeque<Result<Generation, LlmError>>>,
    structured: Mutex<VecDeque<Result<StructuredGeneration, LlmError>>>,
    prompts: Mutex<Vec<String>>,
    tools_seen: Mutex<Vec<Vec<Tool>>>,
    delay: Option<Duration>,
    completed: AtomicUsize,
}

pub fn unavailable() -> LlmError {
    LlmError::Api {
        status: 503,
        message: "overloaded".to_string(),
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_text(&self, text: &str) -> &Self {
        self.text.lock().unwrap().push_back(Ok(Generation {
            text: text.to_string(),
        }));
        self
    }

    pub fn push_text_error(&self) -> &Self {
        self.text.lock().unwrap().push_back(Err(unavailable()));
        self
    }

    pub fn push_json(&self, value: Value) -> &Self {
        self.push_json_with_citations(value, &[])
    }

    pub fn push_json_with_citations(&self, value: Value, urls: &[&str]) -> &Self {
        self.structured
            .lock()
            .unwrap()
            .push_back(Ok(StructuredGeneration {
                value,
                citations: urls
                    .iter()
                    .map(|u| Citation {
                        url: u.to_string(),
                        title: None,
                    })
                    .collect(),
            }));
        self
    }

    pub fn push_json_error(&self) -> &Self {
        self.structured.lock().unwrap().push_back(Err(unavailable()));
        self
    }

    /// Prompts in call order, text and structured interleaved.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn tools_seen(&self) -> Vec<Vec<Tool>> {
        self.tools_seen.lock().unwrap().clone()
    }

    /// Calls that ran to completion (were not dropped mid-flight).
    pub fn completed_calls(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    async fn begin(&self, prompt: &str, tools: &[Tool]) {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.tools_seen.lock().unwrap().push(tools.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate_text(&self, prompt: &str, tools: &[Tool]) -> Result<Generation, LlmError> {
        self.begin(prompt, tools).await;
        let next = self.text.lock().unwrap().pop_front();
        self.completed.fetch_add(1, Ordering::SeqCst);
        next.unwrap_or(Err(LlmError::EmptyContent))
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        _schema: &Value,
        tools: &[Tool],
    ) -> Result<StructuredGeneration, LlmError> {
        self.begin(prompt, tools).await;
        let next = self.structured.lock().unwrap().pop_front();
        self.completed.fetch_add(1, Ordering::SeqCst);
        next.unwrap_or(Err(LlmError::EmptyContent))
    }
}
