//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, aggregating the
//! handlers and schemas declared across the web modules.

use utoipa::OpenApi;

use crate::web::{auth, feedback, generation, projects};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        generation::generate_outline_handler,
        generation::refine_section_handler,
        generation::rate_section_handler,
        projects::create_project_handler,
        projects::list_projects_handler,
        projects::get_project_handler,
        projects::delete_project_handler,
        projects::export_project_handler,
        feedback::upsert_feedback_handler,
        feedback::list_feedback_handler,
        feedback::delete_feedback_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            generation::GenerateOutlineRequest,
            generation::GenerateOutlineResponse,
            generation::RefineRequest,
            generation::RefineResponse,
            generation::RatingRequest,
            projects::SectionStub,
            projects::CreateProjectRequest,
            projects::SectionResponse,
            projects::ProjectResponse,
            feedback::FeedbackRequest,
            feedback::FeedbackResponse,
        )
    ),
    tags(
        (name = "draftforge API", description = "API endpoints for the AI-assisted document and presentation authoring tool.")
    )
)]
pub struct ApiDoc;
