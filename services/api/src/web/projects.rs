//! services/api/src/web/projects.rs
//!
//! Project CRUD and export. Creating a project with section stubs fills
//! each stub's content synchronously, one generation call per section in
//! ascending index order; a failed call degrades to sentinel text and the
//! remaining sections are still generated.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use draftforge_core::domain::{OutputKind, Project, Section};
use draftforge_core::generation::generate_section_content;
use draftforge_core::render::{render_project, RenderError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::port_error_response;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SectionStub {
    pub title: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub title: String,
    pub output_kind: String,
    pub description: Option<String>,
    pub sections: Option<Vec<SectionStub>>,
}

#[derive(Serialize, ToSchema)]
pub struct SectionResponse {
    pub id: Uuid,
    pub order_index: i32,
    pub title: String,
    pub content: Option<String>,
    pub is_liked: Option<bool>,
    pub comment: Option<String>,
    pub last_refined_at: DateTime<Utc>,
}

impl From<Section> for SectionResponse {
    fn from(s: Section) -> Self {
        Self {
            id: s.id,
            order_index: s.order_index,
            title: s.title,
            content: s.content,
            is_liked: s.is_liked,
            comment: s.comment,
            last_refined_at: s.last_refined_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub title: String,
    pub output_kind: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sections: Vec<SectionResponse>,
}

impl ProjectResponse {
    fn from_parts(project: Project, sections: Vec<Section>) -> Self {
        Self {
            id: project.id,
            title: project.title,
            output_kind: project.output_kind,
            description: project.description,
            created_at: project.created_at,
            sections: sections.into_iter().map(SectionResponse::from).collect(),
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a new project, generating content for any initial section stubs.
#[utoipa::path(
    post,
    path = "/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Missing title or unsupported output kind"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_project_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // All input validation happens before the first write, so a rejected
    // request leaves no partial state behind.
    if req.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Missing project title".to_string()));
    }
    let kind = OutputKind::parse(&req.output_kind)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let stubs = req.sections.unwrap_or_default();
    if stubs.iter().any(|s| s.title.trim().is_empty()) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Section titles must be non-empty".to_string(),
        ));
    }

    let project = state
        .db
        .create_project(
            user_id,
            req.title.trim(),
            kind.as_str(),
            req.description.as_deref(),
        )
        .await
        .map_err(port_error_response)?;

    let mut sections = Vec::new();
    for (idx, stub) in stubs.into_iter().enumerate() {
        let content = generate_section_content(
            state.generator.as_ref(),
            &project.title,
            stub.title.trim(),
            kind,
        )
        .await;
        let section = state
            .db
            .insert_section(project.id, idx as i32, stub.title.trim(), Some(&content))
            .await
            .map_err(port_error_response)?;
        sections.push(section);
    }

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse::from_parts(project, sections)),
    ))
}

/// List the caller's projects with their sections.
#[utoipa::path(
    get,
    path = "/projects",
    responses(
        (status = 200, description = "Projects for the current user", body = [ProjectResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_projects_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let projects = state
        .db
        .list_projects(user_id)
        .await
        .map_err(port_error_response)?;

    let mut responses = Vec::with_capacity(projects.len());
    for project in projects {
        let sections = state
            .db
            .get_sections_for_project(project.id)
            .await
            .map_err(port_error_response)?;
        responses.push(ProjectResponse::from_parts(project, sections));
    }
    Ok(Json(responses))
}

/// Fetch one project with its sections, sorted by order index.
#[utoipa::path(
    get,
    path = "/projects/{project_id}",
    params(("project_id" = Uuid, Path, description = "The project to fetch")),
    responses(
        (status = 200, description = "The project", body = ProjectResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Project not found or not owned by caller")
    )
)]
pub async fn get_project_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let project = state
        .db
        .get_project_for_owner(project_id, user_id)
        .await
        .map_err(port_error_response)?;
    let sections = state
        .db
        .get_sections_for_project(project.id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(ProjectResponse::from_parts(project, sections)))
}

/// Delete a project. Sections and feedback go with it.
#[utoipa::path(
    delete,
    path = "/projects/{project_id}",
    params(("project_id" = Uuid, Path, description = "The project to delete")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Project not found or not owned by caller")
    )
)]
pub async fn delete_project_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .delete_project(project_id, user_id)
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Export a project as a downloadable office file.
#[utoipa::path(
    get,
    path = "/projects/{project_id}/export",
    params(("project_id" = Uuid, Path, description = "The project to export")),
    responses(
        (status = 200, description = "The rendered file as an attachment"),
        (status = 400, description = "Unsupported output kind"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Project not found or not owned by caller"),
        (status = 500, description = "Rendering failed")
    )
)]
pub async fn export_project_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let project = state
        .db
        .get_project_for_owner(project_id, user_id)
        .await
        .map_err(port_error_response)?;
    let sections = state
        .db
        .get_sections_for_project(project.id)
        .await
        .map_err(port_error_response)?;

    let rendered = render_project(&project, &sections).map_err(|e| match e {
        RenderError::UnsupportedKind(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        other => {
            error!("Failed to render project {}: {:?}", project_id, other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to render project".to_string(),
            )
        }
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, rendered.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", rendered.filename),
            ),
        ],
        rendered.bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use draftforge_core::domain::{AuthSession, Feedback, User, UserCredentials};
    use draftforge_core::ports::{
        DatabaseService, PortError, PortResult, TextGenerationService,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A database double that counts writes and fails every call the
    /// handler under test is not expected to make.
    #[derive(Default)]
    struct RecordingDb {
        projects_created: AtomicUsize,
        sections_inserted: AtomicUsize,
    }

    fn not_exercised<T>() -> PortResult<T> {
        Err(PortError::Unexpected("not exercised by this test".to_string()))
    }

    #[async_trait]
    impl DatabaseService for RecordingDb {
        async fn create_user_with_email(
            &self,
            _email: &str,
            _hashed_password: &str,
            _full_name: Option<&str>,
        ) -> PortResult<User> {
            not_exercised()
        }

        async fn get_user_by_email(&self, _email: &str) -> PortResult<UserCredentials> {
            not_exercised()
        }

        async fn create_auth_session(
            &self,
            _session_id: &str,
            _user_id: Uuid,
            _expires_at: DateTime<Utc>,
        ) -> PortResult<AuthSession> {
            not_exercised()
        }

        async fn validate_auth_session(&self, _session_id: &str) -> PortResult<Uuid> {
            not_exercised()
        }

        async fn delete_auth_session(&self, _session_id: &str) -> PortResult<()> {
            not_exercised()
        }

        async fn create_project(
            &self,
            owner_id: Uuid,
            title: &str,
            output_kind: &str,
            description: Option<&str>,
        ) -> PortResult<Project> {
            self.projects_created.fetch_add(1, Ordering::SeqCst);
            Ok(Project {
                id: Uuid::new_v4(),
                owner_id,
                title: title.to_string(),
                output_kind: output_kind.to_string(),
                description: description.map(str::to_string),
                created_at: Utc::now(),
            })
        }

        async fn list_projects(&self, _owner_id: Uuid) -> PortResult<Vec<Project>> {
            not_exercised()
        }

        async fn get_project_for_owner(
            &self,
            _project_id: Uuid,
            _owner_id: Uuid,
        ) -> PortResult<Project> {
            not_exercised()
        }

        async fn delete_project(&self, _project_id: Uuid, _owner_id: Uuid) -> PortResult<()> {
            not_exercised()
        }

        async fn insert_section(
            &self,
            project_id: Uuid,
            order_index: i32,
            title: &str,
            content: Option<&str>,
        ) -> PortResult<Section> {
            self.sections_inserted.fetch_add(1, Ordering::SeqCst);
            Ok(Section {
                id: Uuid::new_v4(),
                project_id,
                order_index,
                title: title.to_string(),
                content: content.map(str::to_string),
                is_liked: None,
                comment: None,
                last_refined_at: Utc::now(),
            })
        }

        async fn get_sections_for_project(&self, _project_id: Uuid) -> PortResult<Vec<Section>> {
            not_exercised()
        }

        async fn get_section_for_owner(
            &self,
            _section_id: Uuid,
            _owner_id: Uuid,
        ) -> PortResult<Section> {
            not_exercised()
        }

        async fn update_section_content(
            &self,
            _section_id: Uuid,
            _content: &str,
        ) -> PortResult<Section> {
            not_exercised()
        }

        async fn update_section_rating(
            &self,
            _section_id: Uuid,
            _is_liked: Option<bool>,
            _comment: Option<&str>,
        ) -> PortResult<Section> {
            not_exercised()
        }

        async fn upsert_feedback(
            &self,
            _section_id: Uuid,
            _user_id: Uuid,
            _is_liked: Option<bool>,
            _comment: Option<&str>,
        ) -> PortResult<Feedback> {
            not_exercised()
        }

        async fn list_feedback(&self, _section_id: Uuid) -> PortResult<Vec<Feedback>> {
            not_exercised()
        }

        async fn delete_feedback(&self, _section_id: Uuid, _user_id: Uuid) -> PortResult<()> {
            not_exercised()
        }
    }

    struct CannedGateway;

    #[async_trait]
    impl TextGenerationService for CannedGateway {
        async fn generate(&self, _prompt: &str) -> PortResult<String> {
            Ok("a body of generated text comfortably past the minimum length".to_string())
        }
    }

    fn app_state(db: Arc<RecordingDb>) -> Arc<AppState> {
        Arc::new(AppState {
            db,
            generator: Arc::new(CannedGateway),
        })
    }

    fn request(sections: Vec<SectionStub>) -> CreateProjectRequest {
        CreateProjectRequest {
            title: "Renewable Energy".to_string(),
            output_kind: "docx".to_string(),
            description: None,
            sections: Some(sections),
        }
    }

    #[tokio::test]
    async fn blank_stub_title_is_rejected_before_any_write() {
        let db = Arc::new(RecordingDb::default());
        let result = create_project_handler(
            State(app_state(db.clone())),
            Extension(Uuid::new_v4()),
            Json(request(vec![
                SectionStub {
                    title: "Solar Adoption Trends".to_string(),
                },
                SectionStub {
                    title: "   ".to_string(),
                },
            ])),
        )
        .await;

        let (status, _) = match result {
            Ok(_) => panic!("expected a validation failure"),
            Err(e) => e,
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(db.projects_created.load(Ordering::SeqCst), 0);
        assert_eq!(db.sections_inserted.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unsupported_kind_is_rejected_before_any_write() {
        let db = Arc::new(RecordingDb::default());
        let mut req = request(vec![]);
        req.output_kind = "xlsx".to_string();
        let result =
            create_project_handler(State(app_state(db.clone())), Extension(Uuid::new_v4()), Json(req))
                .await;

        let (status, message) = match result {
            Ok(_) => panic!("expected a validation failure"),
            Err(e) => e,
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("xlsx"));
        assert_eq!(db.projects_created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_stubs_create_one_project_and_all_sections() {
        let db = Arc::new(RecordingDb::default());
        let result = create_project_handler(
            State(app_state(db.clone())),
            Extension(Uuid::new_v4()),
            Json(request(vec![
                SectionStub {
                    title: "Solar Adoption Trends".to_string(),
                },
                SectionStub {
                    title: "Grid Storage Challenges".to_string(),
                },
            ])),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(db.projects_created.load(Ordering::SeqCst), 1);
        assert_eq!(db.sections_inserted.load(Ordering::SeqCst), 2);
    }
}
