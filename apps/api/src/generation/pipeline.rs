//! Generation Pipeline: tailored resume → cover letter → outreach.
//!
//! Each stage consumes the previous stage's output, so the stages run strictly in
//! order. Stages 1 and 2 abort the pipeline on failure; stage 3 degrades to a
//! generic message. `GeneratedContent` is only assembled after all three finish.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::prompts::{
    outreach_schema, COVER_LETTER_PROMPT_TEMPLATE, OUTREACH_PROMPT_TEMPLATE,
    TAILORED_RESUME_PROMPT_TEMPLATE,
};
use crate::llm_client::prompts::{clip, fill, HONESTY_INSTRUCTION};
use crate::llm_client::{generate_json, GenerationBackend, LlmError, Tool};
use crate::models::content::GeneratedContent;

const OUTREACH_JD_CHARS: usize = 3_000;
const OUTREACH_RESUME_CHARS: usize = 2_000;
const OUTREACH_SEARCH: Tool = Tool::WebSearch { max_uses: 5 };
const MAX_CONTACT_SOURCES: usize = 2;

pub const DEFAULT_CONTACT: &str = "Hiring Team";
pub const DEFAULT_OUTREACH_MESSAGE: &str =
    "Hi, I just applied for this role and would love to connect.";
pub const CONTACT_NOT_IDENTIFIED: &str = "Could not identify a hiring contact.";
pub const FALLBACK_OUTREACH_MESSAGE: &str =
    "Hi, I recently applied for the position and would welcome the chance to connect.";

// ────────────────────────────────────────────────────────────────────────────
// Stages
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    TailoredResume,
    CoverLetter,
    Outreach,
}

impl Stage {
    /// Human-readable progress line shown while the stage runs.
    pub fn status_text(&self) -> &'static str {
        match self {
            Stage::TailoredResume => "Drafting tailored resume...",
            Stage::CoverLetter => "Writing cover letter...",
            Stage::Outreach => "Finding hiring manager...",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Stage::TailoredResume => "tailoring the resume",
            Stage::CoverLetter => "writing the cover letter",
            Stage::Outreach => "drafting outreach",
        }
    }
}

/// A stage that could not produce its output. Only stages 1 and 2 raise this.
#[derive(Debug, Error)]
#[error("generation failed while {}: {source}", .stage.label())]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub source: LlmError,
}

impl From<StageFailure> for AppError {
    fn from(failure: StageFailure) -> Self {
        AppError::BackendUnavailable(failure.to_string())
    }
}

/// Result of stage 3. Never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outreach {
    Identified { message: String, contact: String },
    Degraded { message: String, contact: String },
}

impl Outreach {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Outreach::Degraded { .. })
    }

    fn into_parts(self) -> (String, String) {
        match self {
            Outreach::Identified { message, contact } | Outreach::Degraded { message, contact } => {
                (message, contact)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutreachDraft {
    manager_info: Option<String>,
    draft_message: Option<String>,
}

/// Notified as each stage starts. The controller uses it for the loading status.
#[async_trait]
pub trait PipelineObserver: Send + Sync {
    async fn stage_started(&self, stage: Stage);
}

/// Copies of everything the pipeline reads. Stages never see controller state.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub resume: String,
    pub job_description: String,
    pub additional_context: String,
    pub known_facts: Vec<String>,
}

/// User-supplied context followed by every known fact.
pub fn combine_context(additional_context: &str, known_facts: &[String]) -> String {
    format!(
        "{additional_context}\n\nKNOWN FACTS:\n{}",
        known_facts.join("\n")
    )
}

fn non_empty(stage: Stage, text: String) -> Result<String, StageFailure> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StageFailure {
            stage,
            source: LlmError::EmptyContent,
        });
    }
    Ok(trimmed.to_string())
}

/// Stage 1.
pub async fn tailor_resume(
    backend: &dyn GenerationBackend,
    resume: &str,
    job_description: &str,
    combined_context: &str,
) -> Result<String, StageFailure> {
    let stage = Stage::TailoredResume;
    let prompt = fill(
        TAILORED_RESUME_PROMPT_TEMPLATE,
        &[
            ("honesty_instruction", HONESTY_INSTRUCTION),
            ("resume", resume),
            ("context", combined_context),
            ("job_description", job_description),
        ],
    );

    let generation = backend
        .generate_text(&prompt, &[])
        .await
        .map_err(|source| StageFailure { stage, source })?;
    non_empty(stage, generation.text)
}

/// Stage 2. Takes the tailored resume, not the original.
pub async fn write_cover_letter(
    backend: &dyn GenerationBackend,
    tailored_resume: &str,
    job_description: &str,
) -> Result<String, StageFailure> {
    let stage = Stage::CoverLetter;
    let prompt = fill(
        COVER_LETTER_PROMPT_TEMPLATE,
        &[
            ("honesty_instruction", HONESTY_INSTRUCTION),
            ("tailored_resume", tailored_resume),
            ("job_description", job_description),
        ],
    );

    let generation = backend
        .generate_text(&prompt, &[])
        .await
        .map_err(|source| StageFailure { stage, source })?;
    non_empty(stage, generation.text)
}

/// Stage 3. Search-augmented contact lookup plus a short message.
pub async fn draft_outreach(
    backend: &dyn GenerationBackend,
    job_description: &str,
    tailored_resume: &str,
) -> Outreach {
    let prompt = fill(
        OUTREACH_PROMPT_TEMPLATE,
        &[
            ("job_description", clip(job_description, OUTREACH_JD_CHARS)),
            ("resume_summary", clip(tailored_resume, OUTREACH_RESUME_CHARS)),
        ],
    );

    let (draft, citations) = match generate_json::<OutreachDraft>(
        backend,
        &prompt,
        &outreach_schema(),
        &[OUTREACH_SEARCH],
    )
    .await
    {
        Ok(found) => found,
        Err(e) => {
            warn!("Outreach lookup failed, using fallback message: {e}");
            return Outreach::Degraded {
                message: FALLBACK_OUTREACH_MESSAGE.to_string(),
                contact: CONTACT_NOT_IDENTIFIED.to_string(),
            };
        }
    };

    let message = draft
        .draft_message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_OUTREACH_MESSAGE.to_string());
    let mut contact = draft
        .manager_info
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONTACT.to_string());

    let sources: Vec<&str> = citations
        .iter()
        .take(MAX_CONTACT_SOURCES)
        .map(|c| c.url.as_str())
        .collect();
    if !sources.is_empty() {
        contact.push_str(&format!(" (Source: {})", sources.join(", ")));
    }

    Outreach::Identified { message, contact }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs the three stages in order and assembles the package.
pub async fn run_pipeline(
    backend: &dyn GenerationBackend,
    input: &PipelineInput,
    observer: &dyn PipelineObserver,
) -> Result<GeneratedContent, StageFailure> {
    let combined_context = combine_context(&input.additional_context, &input.known_facts);

    observer.stage_started(Stage::TailoredResume).await;
    let resume = tailor_resume(
        backend,
        &input.resume,
        &input.job_description,
        &combined_context,
    )
    .await?;
    info!("Tailored resume drafted ({} chars)", resume.len());

    observer.stage_started(Stage::CoverLetter).await;
    let cover_letter = write_cover_letter(backend, &resume, &input.job_description).await?;
    info!("Cover letter drafted ({} chars)", cover_letter.len());

    observer.stage_started(Stage::Outreach).await;
    let outreach = draft_outreach(backend, &input.job_description, &resume).await;
    if outreach.is_degraded() {
        warn!("Outreach degraded to fallback message");
    }
    let (outreach_message, contact) = outreach.into_parts();

    Ok(GeneratedContent {
        resume,
        cover_letter,
        outreach_message,
        hiring_manager_info: Some(contact),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::llm_client::testing::ScriptedBackend;

    struct NoopObserver;

    #[async_trait]
    impl PipelineObserver for NoopObserver {
        async fn stage_started(&self, _stage: Stage) {}
    }

    #[derive(Default)]
    struct RecordingObserver {
        stages: Mutex<Vec<Stage>>,
    }

    #[async_trait]
    impl PipelineObserver for RecordingObserver {
        async fn stage_started(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }
    }

    fn input() -> PipelineInput {
        PipelineInput {
            resume: "# Jane Doe\n## Experience\n- Built things".to_string(),
            job_description: "Staff Engineer at Acme. Must know Rust.".to_string(),
            additional_context: "I led the Rust migration.".to_string(),
            known_facts: vec!["Led a team of 5".to_string()],
        }
    }

    #[test]
    fn test_combine_context_appends_known_facts() {
        let combined = combine_context("answers", &["a".to_string(), "b".to_string()]);
        assert_eq!(combined, "answers\n\nKNOWN FACTS:\na\nb");
    }

    #[tokio::test]
    async fn test_user_text_with_placeholders_stays_literal() {
        let backend = ScriptedBackend::new();
        backend.push_text("tailored {job_description}").push_text("letter");
        backend.push_json(json!({"managerInfo": "Sam", "draftMessage": "Hi"}));
        let input = PipelineInput {
            resume: "Built a {job_description} templating engine".to_string(),
            additional_context: "Answer mentions {resume}".to_string(),
            ..input()
        };

        run_pipeline(&backend, &input, &NoopObserver).await.unwrap();

        let prompts = backend.prompts();
        assert!(prompts[0].contains("Built a {job_description} templating engine"));
        assert!(prompts[0].contains("Answer mentions {resume}"));
        assert_eq!(prompts[0].matches("Staff Engineer at Acme").count(), 1);
        assert!(prompts[1].contains("tailored {job_description}"));
    }

    #[tokio::test]
    async fn test_stages_run_in_order_and_chain_outputs() {
        let backend = ScriptedBackend::new();
        backend
            .push_text("# Jane Doe (tailored)")
            .push_text("Dear Acme,");
        backend.push_json_with_citations(
            json!({"managerInfo": "Sam Lee, Director", "draftMessage": "Hi Sam!"}),
            &["https://a.example", "https://b.example", "https://c.example"],
        );
        let observer = RecordingObserver::default();

        let content = run_pipeline(&backend, &input(), &observer).await.unwrap();

        assert_eq!(content.resume, "# Jane Doe (tailored)");
        assert_eq!(content.cover_letter, "Dear Acme,");
        assert_eq!(content.outreach_message, "Hi Sam!");
        assert_eq!(
            content.hiring_manager_info.as_deref(),
            Some("Sam Lee, Director (Source: https://a.example, https://b.example)")
        );

        let prompts = backend.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("# Jane Doe\n## Experience"));
        assert!(prompts[0].contains("I led the Rust migration.\n\nKNOWN FACTS:\nLed a team of 5"));
        // Stage 2 and 3 see the tailored resume, not the original.
        assert!(prompts[1].contains("# Jane Doe (tailored)"));
        assert!(!prompts[1].contains("- Built things"));
        assert!(prompts[2].contains("# Jane Doe (tailored)"));

        assert_eq!(backend.tools_seen()[2], vec![OUTREACH_SEARCH]);
        assert_eq!(
            *observer.stages.lock().unwrap(),
            vec![Stage::TailoredResume, Stage::CoverLetter, Stage::Outreach]
        );
    }

    #[tokio::test]
    async fn test_stage_one_failure_aborts_without_content() {
        let backend = ScriptedBackend::new();
        backend.push_text_error().push_text("never used");

        let err = run_pipeline(&backend, &input(), &NoopObserver)
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::TailoredResume);
        assert_eq!(backend.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_stage_two_failure_aborts() {
        let backend = ScriptedBackend::new();
        backend.push_text("tailored").push_text_error();

        let err = run_pipeline(&backend, &input(), &NoopObserver)
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::CoverLetter);
        assert_eq!(backend.prompts().len(), 2);
        assert!(matches!(AppError::from(err), AppError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_blank_resume_is_a_failure() {
        let backend = ScriptedBackend::new();
        backend.push_text("   \n ");

        let err = run_pipeline(&backend, &input(), &NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(err.source, LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_outreach_failure_degrades() {
        let backend = ScriptedBackend::new();
        backend.push_text("tailored").push_text("letter");
        backend.push_json_error();

        let content = run_pipeline(&backend, &input(), &NoopObserver)
            .await
            .unwrap();

        assert_eq!(content.outreach_message, FALLBACK_OUTREACH_MESSAGE);
        assert_eq!(
            content.hiring_manager_info.as_deref(),
            Some(CONTACT_NOT_IDENTIFIED)
        );
    }

    #[tokio::test]
    async fn test_outreach_missing_fields_use_defaults() {
        let backend = ScriptedBackend::new();
        backend.push_json(json!({"managerInfo": "  "}));

        let outreach = draft_outreach(&backend, "jd", "resume").await;

        assert_eq!(
            outreach,
            Outreach::Identified {
                message: DEFAULT_OUTREACH_MESSAGE.to_string(),
                contact: DEFAULT_CONTACT.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_outreach_prompt_is_clipped() {
        let backend = ScriptedBackend::new();
        backend.push_json(json!({"managerInfo": "x", "draftMessage": "y"}));

        let jd = "j".repeat(OUTREACH_JD_CHARS + 10);
        draft_outreach(&backend, &jd, "resume").await;

        assert!(!backend.prompts()[0].contains(&jd));
    }
}
