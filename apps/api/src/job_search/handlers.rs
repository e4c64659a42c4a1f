use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::job::JobOpportunity;
use crate::models::profile::SearchPreferences;
use crate::state::AppState;

/// Preferences default to the ones stored in the profile.
#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    pub preferences: Option<SearchPreferences>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub jobs: Vec<JobOpportunity>,
}

/// POST /api/v1/jobs/search
///
/// Bounded by the configured deadline; a timeout answers 504 and may be retried.
pub async fn handle_search(
    State(state): State<AppState>,
    request: Option<Json<SearchRequest>>,
) -> Result<Json<SearchResponse>, AppError> {
    let Json(request) = request.unwrap_or_default();
    let profile = state.controller.profile().await;
    let preferences = request
        .preferences
        .unwrap_or_else(|| profile.search_preferences.clone());

    let jobs = state.controller.run_search(&profile, &preferences).await?;
    Ok(Json(SearchResponse { jobs }))
}
