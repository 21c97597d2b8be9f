//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use draftforge_core::domain::{AuthSession, Feedback, Project, Section, User, UserCredentials};
use draftforge_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    full_name: Option<String>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
            full_name: self.full_name,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct UserCredentialsRecord {
    id: Uuid,
    email: String,
    hashed_password: String,
}
impl UserCredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct AuthSessionRecord {
    id: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}
impl AuthSessionRecord {
    fn to_domain(self) -> AuthSession {
        AuthSession {
            id: self.id,
            user_id: self.user_id,
            expires_at: self.expires_at,
        }
    }
}

#[derive(FromRow)]
struct ProjectRecord {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    output_kind: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}
impl ProjectRecord {
    fn to_domain(self) -> Project {
        Project {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            output_kind: self.output_kind,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct SectionRecord {
    id: Uuid,
    project_id: Uuid,
    order_index: i32,
    title: String,
    content: Option<String>,
    is_liked: Option<bool>,
    comment: Option<String>,
    last_refined_at: DateTime<Utc>,
}
impl SectionRecord {
    fn to_domain(self) -> Section {
        Section {
            id: self.id,
            project_id: self.project_id,
            order_index: self.order_index,
            title: self.title,
            content: self.content,
            is_liked: self.is_liked,
            comment: self.comment,
            last_refined_at: self.last_refined_at,
        }
    }
}

#[derive(FromRow)]
struct FeedbackRecord {
    id: Uuid,
    section_id: Uuid,
    user_id: Uuid,
    is_liked: Option<bool>,
    comment: Option<String>,
}
impl FeedbackRecord {
    fn to_domain(self) -> Feedback {
        Feedback {
            id: self.id,
            section_id: self.section_id,
            user_id: self.user_id,
            is_liked: self.is_liked,
            comment: self.comment,
        }
    }
}

const SECTION_COLUMNS: &str =
    "id, project_id, order_index, title, content, is_liked, comment, last_refined_at";

fn update_section_content_sql() -> String {
    format!(
        "UPDATE sections SET content = $2, last_refined_at = now() \
         WHERE id = $1 RETURNING {}",
        SECTION_COLUMNS
    )
}

// Rating a section is not a refinement, so `last_refined_at` stays put.
// COALESCE keeps a field unchanged when the caller did not send it.
fn update_section_rating_sql() -> String {
    format!(
        "UPDATE sections SET is_liked = COALESCE($2, is_liked), \
         comment = COALESCE($3, comment) WHERE id = $1 RETURNING {}",
        SECTION_COLUMNS
    )
}

// Locks the caller's feedback row for the rest of the transaction so that
// two concurrent upserts serialize instead of both inserting.
const SELECT_FEEDBACK_FOR_UPDATE_SQL: &str =
    "SELECT id, section_id, user_id, is_liked, comment \
     FROM feedback WHERE section_id = $1 AND user_id = $2 FOR UPDATE";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
        full_name: Option<&str>,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, email, hashed_password, full_name) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, full_name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .bind(full_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::Conflict(format!("Email {} is already registered", email))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserCredentialsRecord>(
            "SELECT id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<AuthSession> {
        let record = sqlx::query_as::<_, AuthSessionRecord>(
            "INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3) \
             RETURNING id, user_id, expires_at",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let record = sqlx::query_as::<_, AuthSessionRecord>(
            "SELECT id, user_id, expires_at FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => unexpected(e),
        })?;
        Ok(record.user_id)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_project(
        &self,
        owner_id: Uuid,
        title: &str,
        output_kind: &str,
        description: Option<&str>,
    ) -> PortResult<Project> {
        let record = sqlx::query_as::<_, ProjectRecord>(
            "INSERT INTO projects (id, owner_id, title, output_kind, description) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, owner_id, title, output_kind, description, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(title)
        .bind(output_kind)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_projects(&self, owner_id: Uuid) -> PortResult<Vec<Project>> {
        let records = sqlx::query_as::<_, ProjectRecord>(
            "SELECT id, owner_id, title, output_kind, description, created_at \
             FROM projects WHERE owner_id = $1 ORDER BY created_at ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_project_for_owner(
        &self,
        project_id: Uuid,
        owner_id: Uuid,
    ) -> PortResult<Project> {
        let record = sqlx::query_as::<_, ProjectRecord>(
            "SELECT id, owner_id, title, output_kind, description, created_at \
             FROM projects WHERE id = $1 AND owner_id = $2",
        )
        .bind(project_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Project {} not found", project_id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn delete_project(&self, project_id: Uuid, owner_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND owner_id = $2")
            .bind(project_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Project {} not found",
                project_id
            )));
        }
        Ok(())
    }

    async fn insert_section(
        &self,
        project_id: Uuid,
        order_index: i32,
        title: &str,
        content: Option<&str>,
    ) -> PortResult<Section> {
        let record = sqlx::query_as::<_, SectionRecord>(&format!(
            "INSERT INTO sections (id, project_id, order_index, title, content) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            SECTION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(order_index)
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_sections_for_project(&self, project_id: Uuid) -> PortResult<Vec<Section>> {
        let records = sqlx::query_as::<_, SectionRecord>(&format!(
            "SELECT {} FROM sections WHERE project_id = $1 ORDER BY order_index ASC",
            SECTION_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_section_for_owner(
        &self,
        section_id: Uuid,
        owner_id: Uuid,
    ) -> PortResult<Section> {
        let record = sqlx::query_as::<_, SectionRecord>(
            "SELECT s.id, s.project_id, s.order_index, s.title, s.content, \
                    s.is_liked, s.comment, s.last_refined_at \
             FROM sections s \
             JOIN projects p ON p.id = s.project_id \
             WHERE s.id = $1 AND p.owner_id = $2",
        )
        .bind(section_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Section {} not found", section_id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn update_section_content(
        &self,
        section_id: Uuid,
        content: &str,
    ) -> PortResult<Section> {
        let record = sqlx::query_as::<_, SectionRecord>(&update_section_content_sql())
            .bind(section_id)
            .bind(content)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Section {} not found", section_id))
                }
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn update_section_rating(
        &self,
        section_id: Uuid,
        is_liked: Option<bool>,
        comment: Option<&str>,
    ) -> PortResult<Section> {
        let record = sqlx::query_as::<_, SectionRecord>(&update_section_rating_sql())
            .bind(section_id)
            .bind(is_liked)
            .bind(comment)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Section {} not found", section_id))
                }
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn upsert_feedback(
        &self,
        section_id: Uuid,
        user_id: Uuid,
        is_liked: Option<bool>,
        comment: Option<&str>,
    ) -> PortResult<Feedback> {
        // Uniqueness of (section_id, user_id) is an access-layer invariant:
        // overwrite the existing row when one is present. The select and the
        // write run inside one transaction so a concurrent upsert cannot
        // interleave between them.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let existing = sqlx::query_as::<_, FeedbackRecord>(SELECT_FEEDBACK_FOR_UPDATE_SQL)
            .bind(section_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?;

        let record = match existing {
            Some(row) => sqlx::query_as::<_, FeedbackRecord>(
                "UPDATE feedback SET is_liked = $2, comment = $3 WHERE id = $1 \
                 RETURNING id, section_id, user_id, is_liked, comment",
            )
            .bind(row.id)
            .bind(is_liked)
            .bind(comment)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?,
            None => sqlx::query_as::<_, FeedbackRecord>(
                "INSERT INTO feedback (id, section_id, user_id, is_liked, comment) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, section_id, user_id, is_liked, comment",
            )
            .bind(Uuid::new_v4())
            .bind(section_id)
            .bind(user_id)
            .bind(is_liked)
            .bind(comment)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?,
        };
        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_feedback(&self, section_id: Uuid) -> PortResult<Vec<Feedback>> {
        let records = sqlx::query_as::<_, FeedbackRecord>(
            "SELECT id, section_id, user_id, is_liked, comment \
             FROM feedback WHERE section_id = $1 ORDER BY id ASC",
        )
        .bind(section_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn delete_feedback(&self, section_id: Uuid, user_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM feedback WHERE section_id = $1 AND user_id = $2")
            .bind(section_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Feedback for section {} not found",
                section_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refining_content_stamps_last_refined_at() {
        let sql = update_section_content_sql();
        assert!(sql.contains("content = $2"));
        assert!(sql.contains("last_refined_at = now()"));
    }

    #[test]
    fn rating_a_section_does_not_touch_last_refined_at() {
        let sql = update_section_rating_sql();
        assert!(sql.contains("is_liked = COALESCE($2, is_liked)"));
        assert!(sql.contains("comment = COALESCE($3, comment)"));
        assert!(!sql.contains("last_refined_at"));
    }

    #[test]
    fn feedback_upsert_locks_the_existing_row() {
        assert!(SELECT_FEEDBACK_FOR_UPDATE_SQL.ends_with("FOR UPDATE"));
    }
}
