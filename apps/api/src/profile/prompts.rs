// Knowledge base prompt templates.

/// Fact extraction prompt. Replace `{conversation}` before sending.
pub const FACT_EXTRACTION_PROMPT: &str = r#"Analyze the following conversation between a career coach and a candidate.
Extract distinct, useful facts about the candidate's experience, skills, or preferences
that were revealed in the candidate's answers.

Each fact must be a standalone statement, e.g. "Led a team of 5 engineers using React".
Ignore small talk and anything the coach said that the candidate did not confirm.
Return an empty array when nothing new was revealed.

CONVERSATION:
{conversation}"#;

pub fn fact_list_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "array",
        "items": { "type": "string" }
    })
}
