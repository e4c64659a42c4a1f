// Generation: the three-stage application package pipeline.
// Tailored resume, then cover letter, then hiring-contact outreach.
// All backend calls go through llm_client::GenerationBackend.

pub mod pipeline;
pub mod prompts;
