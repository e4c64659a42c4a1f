//! Analysis Gate: decides between clarification and direct generation.
//!
//! The gate never blocks the workflow: if the backend fails, the result says
//! "no information needed" and generation proceeds.

use tracing::{info, warn};

use crate::analysis::prompts::{analysis_schema, ANALYSIS_PROMPT_TEMPLATE};
use crate::errors::AppError;
use crate::llm_client::prompts::{clip, fill};
use crate::llm_client::{generate_json, GenerationBackend};
use crate::models::content::AnalysisResult;

/// Inputs at or below this many characters (trimmed) are not usable.
pub const MIN_INPUT_CHARS: usize = 50;
pub const MAX_QUESTIONS: usize = 3;
/// Per-document cap on what is sent to the backend.
const MAX_PROMPT_CHARS: usize = 15_000;

pub const FALLBACK_RATIONALE: &str = "analysis unavailable, proceeding";

/// Rejects intake that is too short to be useful, before any backend call.
pub fn validate_intake(resume: &str, job_description: &str) -> Result<(), AppError> {
    for (field, value) in [("resume", resume), ("job description", job_description)] {
        let chars = value.trim().chars().count();
        if chars <= MIN_INPUT_CHARS {
            return Err(AppError::Validation(format!(
                "{field} is too short ({chars} characters, need more than {MIN_INPUT_CHARS})"
            )));
        }
    }
    Ok(())
}

/// Runs the gap analysis. Always resolves.
pub async fn analyze(
    backend: &dyn GenerationBackend,
    resume: &str,
    job_description: &str,
    known_facts: &[String],
) -> AnalysisResult {
    let known_facts = if known_facts.is_empty() {
        "(none yet)".to_string()
    } else {
        known_facts.join("\n")
    };

    let prompt = fill(
        ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("known_facts", &known_facts),
            ("resume", clip(resume, MAX_PROMPT_CHARS)),
            ("job_description", clip(job_description, MAX_PROMPT_CHARS)),
        ],
    );

    let result = match generate_json::<AnalysisResult>(backend, &prompt, &analysis_schema(), &[])
        .await
    {
        Ok((result, _)) => result,
        Err(e) => {
            warn!("Gap analysis failed, proceeding without clarification: {e}");
            return AnalysisResult {
                needs_info: false,
                questions: vec![],
                rationale: FALLBACK_RATIONALE.to_string(),
            };
        }
    };

    let result = tidy(result);
    info!(
        "Gap analysis: needs_info={} questions={}",
        result.needs_info,
        result.questions.len()
    );
    result
}

fn tidy(mut result: AnalysisResult) -> AnalysisResult {
    result.questions = result
        .questions
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .take(MAX_QUESTIONS)
        .collect();
    result
}
