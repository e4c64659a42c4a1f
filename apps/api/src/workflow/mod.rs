// Workflow: the application state machine and its HTTP surface.

pub mod controller;
pub mod handlers;
