use serde::{Deserialize, Serialize};

/// Outcome of the gap analysis. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub needs_info: bool,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub rationale: String,
}

impl AnalysisResult {
    /// Clarification is only worth entering when there is something to ask.
    pub fn requires_clarification(&self) -> bool {
        self.needs_info && !self.questions.is_empty()
    }
}

/// The finished application package. Only ever published complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub resume: String,
    pub cover_letter: String,
    pub outreach_message: String,
    pub hiring_manager_info: Option<String>,
}
