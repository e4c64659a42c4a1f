// Gap analysis prompt templates.

/// Gap analysis prompt. Replace: {known_facts}, {resume}, {job_description}
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are an expert career coach. Analyze the resume and job description.

KNOWN FACTS ABOUT THE CANDIDATE:
{known_facts}

RESUME:
{resume}

JOB DESCRIPTION:
{job_description}

TASK:
1. Check whether the resume plus the known facts cover the critical requirements of the job description.
2. If critical information is still missing (a specific metric, how a skill was used), set "needsInfo" to true and ask at most 3 probing questions.
3. If the known facts fill the gap, set "needsInfo" to false. The drafting step will use them.
Always explain your decision in "rationale"."#;

pub fn analysis_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "needsInfo": { "type": "boolean" },
            "questions": { "type": "array", "items": { "type": "string" } },
            "rationale": { "type": "string" }
        },
        "required": ["needsInfo", "rationale"]
    })
}
