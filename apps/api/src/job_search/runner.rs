//! Job Search Runner: races the search call against a deadline.
//!
//! Exactly one of {opportunities, `AppError::Timeout`} reaches the caller. When the
//! deadline wins, the in-flight backend future is dropped, so the abandoned call
//! stops at its next await point and never reports back.

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::job_search::prompts::{job_list_schema, JOB_SEARCH_PROMPT_TEMPLATE};
use crate::llm_client::prompts::{clip, fill};
use crate::llm_client::{generate_json, GenerationBackend, Tool};
use crate::models::job::JobOpportunity;
use crate::models::profile::{SearchPreferences, UserProfile};

pub const DEFAULT_SEARCH_DEADLINE: Duration = Duration::from_secs(45);
const RESUME_SUMMARY_CHARS: usize = 1_000;
const JOB_SEARCH: Tool = Tool::WebSearch { max_uses: 5 };

type Entry = Map<String, Value>;

/// A trimmed, non-empty string. Numbers are accepted and rendered as text.
fn text_field(entry: &Entry, key: &str) -> Option<String> {
    match entry.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts `87`, `87.5`, `"87"` and `"87%"`.
fn score_field(entry: &Entry) -> Option<f64> {
    match entry.get("matchScore")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

/// Clamps to 0..=100 and rounds. Missing or non-finite scores become 0.
fn clamp_score(score: Option<f64>) -> u8 {
    match score {
        Some(s) if s.is_finite() => s.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

/// `None` when the entry is not an object or has no title to show.
fn to_opportunity(entry: Value) -> Option<JobOpportunity> {
    let Value::Object(entry) = entry else {
        return None;
    };
    let title = text_field(&entry, "title")?;
    Some(JobOpportunity {
        id: text_field(&entry, "id").unwrap_or_else(|| Uuid::new_v4().to_string()),
        title,
        company: text_field(&entry, "company").unwrap_or_else(|| "Unknown company".to_string()),
        location: text_field(&entry, "location").unwrap_or_default(),
        salary: text_field(&entry, "salary"),
        url: text_field(&entry, "url"),
        match_score: clamp_score(score_field(&entry)),
        reasoning: text_field(&entry, "reasoning").unwrap_or_default(),
    })
}

fn build_prompt(profile: &UserProfile, prefs: &SearchPreferences) -> String {
    let work_modes = prefs
        .work_modes
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let or_none = |s: &str| {
        if s.trim().is_empty() {
            "None provided.".to_string()
        } else {
            s.to_string()
        }
    };

    let resume_summary = format!(
        "{}... (truncated)",
        clip(&profile.master_resume, RESUME_SUMMARY_CHARS)
    );
    let radius = prefs.radius.to_string();
    let salary_min = or_none(&prefs.salary_min);
    let exclusions = or_none(&prefs.exclusions);
    let search_context = or_none(&prefs.search_context);

    fill(
        JOB_SEARCH_PROMPT_TEMPLATE,
        &[
            ("resume_summary", &resume_summary),
            ("roles", &prefs.roles),
            ("locations", &prefs.locations),
            ("radius", &radius),
            ("work_modes", &work_modes),
            ("salary_min", &salary_min),
            ("exclusions", &exclusions),
            ("search_context", &search_context),
        ],
    )
}

async fn fetch(
    backend: &dyn GenerationBackend,
    profile: &UserProfile,
    prefs: &SearchPreferences,
) -> Vec<JobOpportunity> {
    let prompt = build_prompt(profile, prefs);
    match generate_json::<Vec<Value>>(backend, &prompt, &job_list_schema(), &[JOB_SEARCH]).await {
        Ok((raw, citations)) => {
            debug!("Job search returned {} entries, {} citations", raw.len(), citations.len());
            raw.into_iter()
                .enumerate()
                .filter_map(|(index, entry)| {
                    let job = to_opportunity(entry);
                    if job.is_none() {
                        warn!("Dropping job search entry {index}: not an object or no title");
                    }
                    job
                })
                .collect()
        }
        Err(e) => {
            warn!("Job search failed, returning no results: {e}");
            Vec::new()
        }
    }
}

/// Runs one search. Ranking is whatever order the backend returned.
pub async fn search(
    backend: &dyn GenerationBackend,
    profile: &UserProfile,
    prefs: &SearchPreferences,
    deadline: Duration,
) -> Result<Vec<JobOpportunity>, AppError> {
    match tokio::time::timeout(deadline, fetch(backend, profile, prefs)).await {
        Ok(jobs) => {
            info!("Job search found {} opportunities", jobs.len());
            Ok(jobs)
        }
        Err(_) => {
            warn!("Job search timed out after {}s", deadline.as_secs());
            Err(AppError::Timeout {
                seconds: deadline.as_secs(),
            })
        }
    }
}
