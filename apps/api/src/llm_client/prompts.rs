// Shared prompt constants and prompt-building utilities.
// Each feature that needs backend calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt for free-form document writing.
pub const WRITER_SYSTEM: &str = "You are an expert career writer. \
    Respond with the requested document only, in Markdown. \
    Do NOT add preambles, sign-offs about the task, or commentary.";

/// Truthfulness rule appended to every drafting prompt.
pub const HONESTY_INSTRUCTION: &str = "\
    CRITICAL: Do NOT lie or fabricate. Every claim must be supported by the resume, \
    the known facts, or the candidate's own answers. If something is not supported, omit it.";

/// Returns at most `max_chars` characters of `text`, cut on a char boundary.
pub fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Substitutes `{name}` placeholders in one pass over `template`. Inserted values
/// are never scanned again, so placeholder-like text inside them stays literal.
/// Unknown placeholders are left as they are.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let candidate = &rest[open..];
        let value = candidate.find('}').and_then(|close| {
            let name = &candidate[1..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });
        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &candidate[close + 1..];
            }
            None => {
                out.push('{');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
