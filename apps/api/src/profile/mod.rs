// Profile: versioned persistence of the user profile and the learned-facts
// knowledge base that grows from clarification sessions.

pub mod handlers;
pub mod knowledge;
pub mod prompts;
pub mod store;
