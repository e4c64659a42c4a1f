// All prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Stage 1. Replace: {honesty_instruction}, {resume}, {context}, {job_description}
pub const TAILORED_RESUME_PROMPT_TEMPLATE: &str = r#"Rewrite the resume to target the job description, STRICTLY keeping its Markdown format.

INSTRUCTIONS:
1. Title: frame the candidate appropriately for the target role.
2. Hook: write a summary that bridges the candidate's actual experience with the job requirements.

FORMATTING RULES (hard):
1. Keep the exact same Markdown structure: headers, spacing, bullet style.
2. Keep the same section order.
3. Keep the same contact info header format.
4. Do not drastically change the length.

CONTENT RULES:
{honesty_instruction}
1. Use the additional context (learned facts and the candidate's answers) to fill gaps truthfully.
2. Swap generic keywords for the specific keywords found in the job description.
3. Rephrase bullets to highlight achievements relevant to the job.
4. Use active voice and strong action verbs. Quantify results where the sources allow.

ORIGINAL RESUME:
{resume}

ADDITIONAL CONTEXT (known facts and answers):
{context}

TARGET JOB DESCRIPTION:
{job_description}"#;

/// Stage 2. Replace: {honesty_instruction}, {tailored_resume}, {job_description}
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Write a cover letter for this candidate.

TONE: confident, professional but human.

STRATEGY:
- Focus on where the candidate's skills meet the company's pain points.
- Address the requirements in the job description directly.
- Keep it under 400 words.

{honesty_instruction}

FORMAT: Markdown.

RESUME:
{tailored_resume}

JOB DESCRIPTION:
{job_description}"#;

/// Stage 3. Replace: {job_description}, {resume_summary}
pub const OUTREACH_PROMPT_TEMPLATE: &str = r#"Extract the role and company from the job description.
Step 1: Use web search to identify the hiring manager, talent acquisition lead, or engineering director for this role.
Step 2: Draft a LinkedIn connection message (max 300 characters) highlighting the candidate's value.

Return "managerInfo" (name and title of the contact, or who to address if nobody specific was found)
and "draftMessage".

JOB DESCRIPTION:
{job_description}

RESUME SUMMARY:
{resume_summary}"#;

pub fn outreach_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "managerInfo": { "type": "string" },
            "draftMessage": { "type": "string" }
        },
        "required": ["managerInfo", "draftMessage"]
    })
}
