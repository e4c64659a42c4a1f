// Job Search: preference-driven discovery with a hard wall-clock deadline.
// Independent of the application workflow; results are never persisted.

pub mod handlers;
pub mod prompts;
pub mod runner;
