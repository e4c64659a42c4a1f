// Prompt constants for the Job Search module.

/// Replace: {resume_summary}, {roles}, {locations}, {radius}, {work_modes},
/// {salary_min}, {exclusions}, {search_context}
pub const JOB_SEARCH_PROMPT_TEMPLATE: &str = r#"You are an experienced headhunter.

CANDIDATE PROFILE SUMMARY:
{resume_summary}

SEARCH PARAMETERS:
- TARGET ROLES: {roles}
- TARGET LOCATIONS: {locations} (look within a {radius} mile radius)
- WORK MODES: {work_modes}
- MINIMUM SALARY: {salary_min}

STRICT EXCLUSIONS:
- Ignore any job containing these terms: {exclusions}

ADDITIONAL CANDIDATE INSTRUCTIONS:
{search_context}

LOCATION RULES:
1. If "Remote" is in WORK MODES, prioritize fully remote roles.
2. If "Hybrid" is in WORK MODES, look for roles in TARGET LOCATIONS that allow hybrid work.
3. If "On-site" is in WORK MODES, look for on-site roles in TARGET LOCATIONS.
4. If a specific city is listed, include nearby cities within the {radius} mile radius.

TASK:
Use web search to find 5 active job openings that match the parameters above.

VETTING:
- Boost: matches the candidate's skills, reputable companies, follows the additional instructions.
- Downrank: low salary, mismatching location, any exclusion term.

Return the top 5 distinct opportunities ranked best first, each with a short "reasoning"
explaining why it fits, and a "matchScore" from 0 to 100."#;

pub fn job_list_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "title": { "type": "string" },
                "company": { "type": "string" },
                "location": { "type": "string" },
                "salary": { "type": "string" },
                "url": { "type": "string" },
                "matchScore": { "type": "number" },
                "reasoning": { "type": "string" }
            },
            "required": ["title", "company", "matchScore"]
        }
    })
}
