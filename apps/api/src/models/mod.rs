pub mod content;
pub mod job;
pub mod profile;
pub mod workflow;
