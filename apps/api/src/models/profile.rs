use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Work arrangements a search may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkMode {
    Remote,
    Hybrid,
    #[serde(rename = "On-site")]
    OnSite,
}

impl WorkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkMode::Remote => "Remote",
            WorkMode::Hybrid => "Hybrid",
            WorkMode::OnSite => "On-site",
        }
    }
}

impl fmt::Display for WorkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(WorkMode::Remote),
            "hybrid" => Ok(WorkMode::Hybrid),
            "on-site" | "onsite" | "on site" => Ok(WorkMode::OnSite),
            other => Err(format!("unknown work mode '{other}'")),
        }
    }
}

/// Job search preferences. Every field is always present after a profile load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchPreferences {
    pub roles: String,
    pub locations: String,
    pub salary_min: String,
    pub exclusions: String,
    /// Miles around each listed location.
    pub radius: u32,
    pub work_modes: Vec<WorkMode>,
    pub search_context: String,
}

impl Default for SearchPreferences {
    fn default() -> Self {
        Self {
            roles: String::new(),
            locations: "Remote".to_string(),
            salary_min: String::new(),
            exclusions: String::new(),
            radius: 50,
            work_modes: vec![WorkMode::Remote, WorkMode::Hybrid],
            search_context: String::new(),
        }
    }
}

/// The single persistent aggregate: master resume, learned facts and search preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub master_resume: String,
    /// Ordered set: no duplicates, insertion order preserved.
    pub facts: Vec<String>,
    pub search_preferences: SearchPreferences,
}
