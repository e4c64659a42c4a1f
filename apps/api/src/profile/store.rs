//! Versioned persistence of the user profile.
//!
//! The record lives under a key that embeds `PROFILE_SCHEMA_VERSION`. Bumping the
//! version abandons the old record, so defaults win after a breaking schema change.
//! Within one version, loads are migrated field by field: whatever the stored
//! record has is kept, anything absent or null comes from the defaults.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::errors::AppError;
use crate::models::profile::{SearchPreferences, UserProfile, WorkMode};
use crate::profile::knowledge::merge_facts;
use crate::storage::KeyValueStore;

pub const PROFILE_SCHEMA_VERSION: u32 = 3;

type Record = Map<String, Value>;

/// A stored value that does not fit its field is dropped on its own; the rest of
/// the record survives.
fn field<T: DeserializeOwned>(record: &Record, key: &str) -> Option<T> {
    let value = record.get(key).filter(|v| !v.is_null())?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Ignoring stored field {key}: {e}");
            None
        }
    }
}

/// Text fields also accept numbers (`"salaryMin": 140000`).
fn text(record: &Record, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        other => {
            warn!("Ignoring stored field {key}: expected text, found {other}");
            None
        }
    }
}

/// Non-string entries are dropped.
fn text_list(record: &Record, key: &str) -> Option<Vec<String>> {
    field::<Vec<Value>>(record, key).map(|items| {
        items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect()
    })
}

fn parse_work_modes(raw: Vec<String>) -> Vec<WorkMode> {
    let mut modes = Vec::with_capacity(raw.len());
    for value in raw {
        match value.parse::<WorkMode>() {
            Ok(mode) if !modes.contains(&mode) => modes.push(mode),
            Ok(_) => {}
            Err(e) => warn!("Dropping stored work mode: {e}"),
        }
    }
    modes
}

fn migrate_preferences(record: &Record) -> SearchPreferences {
    let defaults = SearchPreferences::default();
    SearchPreferences {
        roles: text(record, "roles").unwrap_or(defaults.roles),
        locations: text(record, "locations").unwrap_or(defaults.locations),
        salary_min: text(record, "salaryMin").unwrap_or(defaults.salary_min),
        exclusions: text(record, "exclusions").unwrap_or(defaults.exclusions),
        // Saturating cast: negatives become 0.
        radius: field::<f64>(record, "radius")
            .map(|r| r.round() as u32)
            .unwrap_or(defaults.radius),
        work_modes: text_list(record, "workModes")
            .map(parse_work_modes)
            .unwrap_or(defaults.work_modes),
        search_context: text(record, "searchContext").unwrap_or(defaults.search_context),
    }
}

/// Parses a stored record and backfills absent or unusable fields from the
/// defaults, one field at a time. Fails only when the record is not a JSON object.
pub fn migrate(raw: &str) -> Result<UserProfile, serde_json::Error> {
    let record: Record = serde_json::from_str(raw)?;
    let defaults = UserProfile::default();

    Ok(UserProfile {
        master_resume: text(&record, "masterResume").unwrap_or(defaults.master_resume),
        facts: text_list(&record, "facts")
            .map(|facts| merge_facts(&[], &facts))
            .unwrap_or(defaults.facts),
        search_preferences: field::<Record>(&record, "searchPreferences")
            .map(|prefs| migrate_preferences(&prefs))
            .unwrap_or(defaults.search_preferences),
    })
}

/// Load/save handle for the single persisted profile.
#[derive(Clone)]
pub struct ProfileStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl ProfileStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, namespace: &str) -> Self {
        Self {
            kv,
            key: format!("{namespace}:profile:v{PROFILE_SCHEMA_VERSION}"),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Never fails. Missing, unreadable or corrupt records yield the default profile.
    pub async fn load(&self) -> UserProfile {
        let raw = match self.kv.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No stored profile under {}, using defaults", self.key);
                return UserProfile::default();
            }
            Err(e) => {
                error!("Failed to read profile {}: {e}", self.key);
                return UserProfile::default();
            }
        };

        match migrate(&raw) {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Stored profile {} is corrupt ({e}), using defaults", self.key);
                UserProfile::default()
            }
        }
    }

    /// Best-effort overwrite. Returns whether the record was persisted; failures are
    /// logged and otherwise swallowed.
    pub async fn save(&self, profile: &UserProfile) -> bool {
        let normalized = UserProfile {
            facts: merge_facts(&[], &profile.facts),
            ..profile.clone()
        };

        let raw = match serde_json::to_string(&normalized) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Failed to serialize profile: {e}");
                return false;
            }
        };

        match self.kv.set(&self.key, &raw).await {
            Ok(()) => {
                debug!(
                    "Saved profile {} ({} facts)",
                    self.key,
                    normalized.facts.len()
                );
                true
            }
            Err(e) => {
                error!("Failed to save profile {}: {e}", self.key);
                false
            }
        }
    }

    /// Appends one fact to the latest stored profile unless it is already known.
    pub async fn add_fact(&self, fact: &str) -> Result<UserProfile, AppError> {
        let fact = fact.trim();
        if fact.is_empty() {
            return Err(AppError::Validation("fact cannot be empty".to_string()));
        }

        let mut profile = self.load().await;
        if profile.facts.iter().any(|f| f == fact) {
            debug!("Fact already known, skipping save");
            return Ok(profile);
        }

        profile.facts.push(fact.to_string());
        self.save(&profile).await;
        info!("Added fact #{} to profile", profile.facts.len());
        Ok(profile)
    }

    pub async fn remove_fact(&self, index: usize) -> Result<UserProfile, AppError> {
        let mut profile = self.load().await;
        if index >= profile.facts.len() {
            return Err(AppError::NotFound(format!("Fact {index} not found")));
        }

        let removed = profile.facts.remove(index);
        self.save(&profile).await;
        info!("Removed fact {index}: {:?}", clip_for_log(&removed));
        Ok(profile)
    }

    pub async fn save_preferences(&self, preferences: SearchPreferences) -> UserProfile {
        let mut profile = self.load().await;
        profile.search_preferences = preferences;
        self.save(&profile).await;
        profile
    }
}

fn clip_for_log(text: &str) -> String {
    text.chars().take(60).collect()
}
