//! Knowledge accumulation: learned facts merged into the persisted profile.
//!
//! Facts are compared by exact string equality. The merge re-reads the stored
//! profile right before writing, which narrows but does not close the window for
//! lost updates from another writer (there is no compare-and-swap).

use std::collections::HashSet;

use tracing::{info, warn};

use crate::llm_client::prompts::fill;
use crate::llm_client::{generate_json, GenerationBackend};
use crate::models::profile::UserProfile;
use crate::profile::prompts::{fact_list_schema, FACT_EXTRACTION_PROMPT};
use crate::profile::store::ProfileStore;

/// `existing` in order, then every fact from `new` not seen yet.
pub fn merge_facts(existing: &[String], new: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(existing.len() + new.len());
    let mut merged = Vec::with_capacity(existing.len() + new.len());
    for fact in existing.iter().chain(new) {
        if seen.insert(fact.as_str()) {
            merged.push(fact.clone());
        }
    }
    merged
}

/// Asks the backend for candidate facts revealed in a clarification transcript.
/// Any backend failure yields an empty list.
pub async fn extract_facts(backend: &dyn GenerationBackend, transcript: &str) -> Vec<String> {
    if transcript.trim().is_empty() {
        return Vec::new();
    }

    let prompt = fill(FACT_EXTRACTION_PROMPT, &[("conversation", transcript)]);
    match generate_json::<Vec<String>>(backend, &prompt, &fact_list_schema(), &[]).await {
        Ok((facts, _)) => facts
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect(),
        Err(e) => {
            warn!("Fact extraction failed: {e}");
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LearningOutcome {
    /// Facts the backend reported, before dedupe.
    pub extracted: usize,
    /// Facts that were not in the profile yet, in the order they were appended.
    pub added: Vec<String>,
    /// The profile as written, when a write happened.
    pub profile: Option<UserProfile>,
}

/// Extracts facts from `transcript` and merges them into the latest stored profile.
pub async fn learn_from_transcript(
    store: &ProfileStore,
    backend: &dyn GenerationBackend,
    transcript: &str,
) -> LearningOutcome {
    let facts = extract_facts(backend, transcript).await;
    if facts.is_empty() {
        info!("No new facts learned from clarification");
        return LearningOutcome::default();
    }

    let mut latest = store.load().await;
    let known = latest.facts.len();
    let merged = merge_facts(&latest.facts, &facts);
    let added: Vec<String> = merged[known..].to_vec();

    if added.is_empty() {
        info!("All {} extracted facts already known", facts.len());
        return LearningOutcome {
            extracted: facts.len(),
            added,
            profile: None,
        };
    }

    latest.facts = merged;
    store.save(&latest).await;
    info!("Learned {} new facts: {:?}", added.len(), added);

    LearningOutcome {
        extracted: facts.len(),
        added,
        profile: Some(latest),
    }
}
