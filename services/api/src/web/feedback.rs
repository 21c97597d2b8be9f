//! services/api/src/web/feedback.rs
//!
//! Per-user feedback rows on sections: upsert, list, delete. One row per
//! (section, user) pair, overwritten on repeat submissions. Listing a
//! section with no feedback returns an empty list, not a 404.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use draftforge_core::domain::Feedback;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::port_error_response;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct FeedbackRequest {
    pub section_id: Uuid,
    pub is_liked: Option<bool>,
    pub comment: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct FeedbackResponse {
    pub id: Uuid,
    pub section_id: Uuid,
    pub user_id: Uuid,
    pub is_liked: Option<bool>,
    pub comment: Option<String>,
}

impl From<Feedback> for FeedbackResponse {
    fn from(f: Feedback) -> Self {
        Self {
            id: f.id,
            section_id: f.section_id,
            user_id: f.user_id,
            is_liked: f.is_liked,
            comment: f.comment,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create or overwrite the caller's feedback for a section.
#[utoipa::path(
    post,
    path = "/feedback",
    request_body = FeedbackRequest,
    responses(
        (status = 201, description = "Feedback stored", body = FeedbackResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Section not found or not owned by caller")
    )
)]
pub async fn upsert_feedback_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<FeedbackRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // Ownership check before any write.
    let section = state
        .db
        .get_section_for_owner(req.section_id, user_id)
        .await
        .map_err(port_error_response)?;

    let feedback = state
        .db
        .upsert_feedback(section.id, user_id, req.is_liked, req.comment.as_deref())
        .await
        .map_err(port_error_response)?;

    Ok((StatusCode::CREATED, Json(FeedbackResponse::from(feedback))))
}

/// List all feedback rows for a section.
#[utoipa::path(
    get,
    path = "/feedback/{section_id}",
    params(("section_id" = Uuid, Path, description = "The section whose feedback to list")),
    responses(
        (status = 200, description = "Feedback rows, possibly empty", body = [FeedbackResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Section not found or not owned by caller")
    )
)]
pub async fn list_feedback_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(section_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let section = state
        .db
        .get_section_for_owner(section_id, user_id)
        .await
        .map_err(port_error_response)?;

    let rows = state
        .db
        .list_feedback(section.id)
        .await
        .map_err(port_error_response)?;

    let responses: Vec<FeedbackResponse> = rows.into_iter().map(FeedbackResponse::from).collect();
    Ok(Json(responses))
}

/// Delete the caller's own feedback row for a section.
#[utoipa::path(
    delete,
    path = "/feedback/{section_id}",
    params(("section_id" = Uuid, Path, description = "The section whose feedback to delete")),
    responses(
        (status = 204, description = "Feedback deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No feedback row for the caller")
    )
)]
pub async fn delete_feedback_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(section_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .delete_feedback(section_id, user_id)
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
