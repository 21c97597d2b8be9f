//! services/api/src/web/generation.rs
//!
//! Outline generation and section refinement. The outline call site
//! propagates provider failures (a sentinel cannot be parsed into titles);
//! refinement degrades to sentinel text so section content never becomes
//! null.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use draftforge_core::domain::OutputKind;
use draftforge_core::generation::generate_or_sentinel;
use draftforge_core::prompt::{build_outline_prompt, build_refine_prompt, parse_outline};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::port_error_response;
use crate::web::projects::SectionResponse;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct GenerateOutlineRequest {
    pub topic: String,
    pub output_kind: String,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateOutlineResponse {
    pub outline: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RefineRequest {
    pub instruction: String,
}

#[derive(Serialize, ToSchema)]
pub struct RefineResponse {
    pub content: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RatingRequest {
    pub is_liked: Option<bool>,
    pub comment: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Generate an outline: a list of candidate section titles for a topic.
#[utoipa::path(
    post,
    path = "/generate/outline",
    request_body = GenerateOutlineRequest,
    responses(
        (status = 200, description = "Outline generated", body = GenerateOutlineResponse),
        (status = 400, description = "Missing topic or unsupported output kind"),
        (status = 401, description = "Not authenticated"),
        (status = 502, description = "Generation provider failed")
    )
)]
pub async fn generate_outline_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateOutlineRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.topic.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Missing topic".to_string()));
    }
    let kind = OutputKind::parse(&req.output_kind)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let prompt = build_outline_prompt(req.topic.trim(), kind);
    let raw = state.generator.generate(&prompt).await.map_err(|e| {
        error!("Outline generation failed: {:?}", e);
        (
            StatusCode::BAD_GATEWAY,
            "Generation provider failed".to_string(),
        )
    })?;

    Ok(Json(GenerateOutlineResponse {
        outline: parse_outline(&raw),
    }))
}

/// Rewrite one section's content per a natural-language instruction.
#[utoipa::path(
    post,
    path = "/sections/{section_id}/refine",
    params(("section_id" = Uuid, Path, description = "The section to refine")),
    request_body = RefineRequest,
    responses(
        (status = 200, description = "Section refined", body = RefineResponse),
        (status = 400, description = "Missing instruction"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Section not found or not owned by caller")
    )
)]
pub async fn refine_section_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(section_id): Path<Uuid>,
    Json(req): Json<RefineRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.instruction.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Missing instruction".to_string()));
    }

    let section = state
        .db
        .get_section_for_owner(section_id, user_id)
        .await
        .map_err(port_error_response)?;

    let prompt = build_refine_prompt(
        req.instruction.trim(),
        section.content.as_deref().unwrap_or(""),
    );
    let refined = generate_or_sentinel(state.generator.as_ref(), &prompt).await;

    let updated = state
        .db
        .update_section_content(section.id, refined.trim())
        .await
        .map_err(port_error_response)?;

    Ok(Json(RefineResponse {
        content: updated.content.unwrap_or_default(),
    }))
}

/// Record the owner's like/dislike and comment on a section. Fields left
/// out of the request keep their stored values.
#[utoipa::path(
    post,
    path = "/sections/{section_id}/rating",
    params(("section_id" = Uuid, Path, description = "The section to rate")),
    request_body = RatingRequest,
    responses(
        (status = 200, description = "Rating saved", body = SectionResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Section not found or not owned by caller")
    )
)]
pub async fn rate_section_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(section_id): Path<Uuid>,
    Json(req): Json<RatingRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let section = state
        .db
        .get_section_for_owner(section_id, user_id)
        .await
        .map_err(port_error_response)?;

    let updated = state
        .db
        .update_section_rating(section.id, req.is_liked, req.comment.as_deref())
        .await
        .map_err(port_error_response)?;

    Ok(Json(SectionResponse::from(updated)))
}
