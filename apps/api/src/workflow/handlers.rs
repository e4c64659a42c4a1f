//! Axum route handlers for the Workflow API.

use std::future::Future;

use anyhow::anyhow;
use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::job::JobOpportunity;
use crate::models::workflow::WorkflowStep;
use crate::state::AppState;
use crate::workflow::controller::WorkflowSnapshot;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeRequest {
    pub resume: String,
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

/// Both fields absent: derive them from the recorded conversation.
#[derive(Debug, Default, Deserialize)]
pub struct CompleteClarificationRequest {
    pub context: Option<String>,
    pub transcript: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub step: WorkflowStep,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub job: JobOpportunity,
}

/// Runs a generation-path call on its own task so a dropped connection cannot
/// cancel it halfway and leave the session loading.
async fn detached<F>(work: F) -> Result<WorkflowSnapshot, AppError>
where
    F: Future<Output = Result<WorkflowSnapshot, AppError>> + Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| AppError::Internal(anyhow!("workflow task failed: {e}")))?
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/workflow
pub async fn handle_get_workflow(State(state): State<AppState>) -> Json<WorkflowSnapshot> {
    Json(state.controller.snapshot().await)
}

/// POST /api/v1/workflow/intake
///
/// Analyzes the inputs, then either opens clarification or generates the full
/// package. Responds once the workflow has settled.
pub async fn handle_submit_intake(
    State(state): State<AppState>,
    Json(request): Json<IntakeRequest>,
) -> Result<Json<WorkflowSnapshot>, AppError> {
    let controller = state.controller.clone();
    let snapshot = detached(async move {
        controller
            .submit_intake(&request.resume, &request.job_description)
            .await
    })
    .await?;
    Ok(Json(snapshot))
}

/// POST /api/v1/workflow/clarification/messages
pub async fn handle_post_message(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<WorkflowSnapshot>, AppError> {
    Ok(Json(state.controller.post_message(&request.content).await?))
}

/// POST /api/v1/workflow/clarification/complete
pub async fn handle_complete_clarification(
    State(state): State<AppState>,
    request: Option<Json<CompleteClarificationRequest>>,
) -> Result<Json<WorkflowSnapshot>, AppError> {
    let Json(request) = request.unwrap_or_default();
    let controller = state.controller.clone();
    let snapshot = detached(async move {
        match (request.context, request.transcript) {
            (None, None) => controller.complete_clarification_from_conversation().await,
            (context, transcript) => {
                controller
                    .complete_clarification(
                        &context.unwrap_or_default(),
                        &transcript.unwrap_or_default(),
                    )
                    .await
            }
        }
    })
    .await?;
    Ok(Json(snapshot))
}

/// POST /api/v1/workflow/restart
pub async fn handle_restart(
    State(state): State<AppState>,
) -> Result<Json<WorkflowSnapshot>, AppError> {
    Ok(Json(state.controller.restart().await?))
}

/// POST /api/v1/workflow/navigate
pub async fn handle_navigate(
    State(state): State<AppState>,
    Json(request): Json<NavigateRequest>,
) -> Result<Json<WorkflowSnapshot>, AppError> {
    Ok(Json(state.controller.navigate(request.step).await?))
}

/// POST /api/v1/workflow/select
pub async fn handle_select(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<WorkflowSnapshot>, AppError> {
    Ok(Json(state.controller.select_opportunity(&request.job).await?))
}
