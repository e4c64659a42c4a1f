use std::sync::Arc;

use crate::config::Config;
use crate::workflow::controller::WorkflowController;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Single-user session: one controller per process.
    pub controller: Arc<WorkflowController>,
    pub config: Config,
}
