pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::job_search::handlers as jobs;
use crate::profile::handlers as profile;
use crate::state::AppState;
use crate::workflow::handlers as workflow;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Workflow API
        .route("/api/v1/workflow", get(workflow::handle_get_workflow))
        .route(
            "/api/v1/workflow/intake",
            post(workflow::handle_submit_intake),
        )
        .route(
            "/api/v1/workflow/clarification/messages",
            post(workflow::handle_post_message),
        )
        .route(
            "/api/v1/workflow/clarification/complete",
            post(workflow::handle_complete_clarification),
        )
        .route("/api/v1/workflow/restart", post(workflow::handle_restart))
        .route("/api/v1/workflow/navigate", post(workflow::handle_navigate))
        .route("/api/v1/workflow/select", post(workflow::handle_select))
        // Profile API
        .route(
            "/api/v1/profile",
            get(profile::handle_get_profile).put(profile::handle_save_profile),
        )
        .route("/api/v1/profile/facts", post(profile::handle_add_fact))
        .route(
            "/api/v1/profile/facts/:index",
            delete(profile::handle_remove_fact),
        )
        .route(
            "/api/v1/profile/preferences",
            put(profile::handle_save_preferences),
        )
        // Discovery API
        .route("/api/v1/jobs/search", post(jobs::handle_search))
        .with_state(state)
}
