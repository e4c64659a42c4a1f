use serde::{Deserialize, Serialize};

/// A single search hit. Produced per search call and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOpportunity {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<String>,
    pub url: Option<String>,
    /// 0 – 100
    pub match_score: u8,
    pub reasoning: String,
}
