use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::profile::{SearchPreferences, UserProfile};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddFactRequest {
    pub fact: String,
}

/// GET /api/v1/profile
pub async fn handle_get_profile(State(state): State<AppState>) -> Json<UserProfile> {
    Json(state.controller.profile().await)
}

/// PUT /api/v1/profile
pub async fn handle_save_profile(
    State(state): State<AppState>,
    Json(profile): Json<UserProfile>,
) -> Json<UserProfile> {
    Json(state.controller.save_profile(profile).await)
}

/// POST /api/v1/profile/facts
pub async fn handle_add_fact(
    State(state): State<AppState>,
    Json(request): Json<AddFactRequest>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.controller.add_fact(&request.fact).await?))
}

/// DELETE /api/v1/profile/facts/:index
pub async fn handle_remove_fact(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.controller.remove_fact(index).await?))
}

/// PUT /api/v1/profile/preferences
pub async fn handle_save_preferences(
    State(state): State<AppState>,
    Json(preferences): Json<SearchPreferences>,
) -> Json<UserProfile> {
    Json(state.controller.save_preferences(preferences).await)
}
