//! crates/draftforge_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{AuthSession, Feedback, Project, Section, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User and Auth Management ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
        full_name: Option<&str>,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<AuthSession>;

    /// Returns the owning user id for a live (non-expired) auth session.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Project Management ---
    async fn create_project(
        &self,
        owner_id: Uuid,
        title: &str,
        output_kind: &str,
        description: Option<&str>,
    ) -> PortResult<Project>;

    async fn list_projects(&self, owner_id: Uuid) -> PortResult<Vec<Project>>;

    /// Loads a project only if it belongs to the given user, else not-found.
    async fn get_project_for_owner(&self, project_id: Uuid, owner_id: Uuid)
        -> PortResult<Project>;

    /// Deletes a project owned by the given user. Sections and their feedback
    /// are removed by the storage layer's cascade rules.
    async fn delete_project(&self, project_id: Uuid, owner_id: Uuid) -> PortResult<()>;

    // --- Section Management ---
    async fn insert_section(
        &self,
        project_id: Uuid,
        order_index: i32,
        title: &str,
        content: Option<&str>,
    ) -> PortResult<Section>;

    /// All sections of a project, ordered by `order_index` ascending.
    async fn get_sections_for_project(&self, project_id: Uuid) -> PortResult<Vec<Section>>;

    /// The centralized ownership primitive: loads a section only if it belongs
    /// to a project owned by the given user, else not-found.
    async fn get_section_for_owner(&self, section_id: Uuid, owner_id: Uuid)
        -> PortResult<Section>;

    /// Replaces a section's content and bumps `last_refined_at`.
    async fn update_section_content(&self, section_id: Uuid, content: &str)
        -> PortResult<Section>;

    /// Partial update of the owner's tri-state rating and comment. A field
    /// that is `None` is left unchanged.
    async fn update_section_rating(
        &self,
        section_id: Uuid,
        is_liked: Option<bool>,
        comment: Option<&str>,
    ) -> PortResult<Section>;

    // --- Feedback Management ---
    /// Inserts or overwrites the caller's feedback row for a section.
    /// The (section_id, user_id) pair stays unique across calls.
    async fn upsert_feedback(
        &self,
        section_id: Uuid,
        user_id: Uuid,
        is_liked: Option<bool>,
        comment: Option<&str>,
    ) -> PortResult<Feedback>;

    /// All feedback rows for a section. An empty list is a valid result,
    /// not an error.
    async fn list_feedback(&self, section_id: Uuid) -> PortResult<Vec<Feedback>>;

    /// Removes the caller's own feedback row; not-found when none exists.
    async fn delete_feedback(&self, section_id: Uuid, user_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Submits one prompt to the external text-generation provider and
    /// returns the raw text result. One attempt, no retries; failures are
    /// typed so each call site can decide whether to degrade or propagate.
    async fn generate(&self, prompt: &str) -> PortResult<String>;
}
