//! crates/draftforge_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

// Represents a registered user - used throughout the app
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A document or slide-deck authoring project owned by one user.
///
/// `output_kind` is kept as the stored string rather than a parsed
/// [`OutputKind`] so that an invalid stored value surfaces as an explicit
/// unsupported-type error at the point of use (prompting, rendering)
/// instead of being unrepresentable.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub output_kind: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One titled content block within a project, ordered by `order_index`.
///
/// `content` stays `None` until it has been generated; `is_liked` is the
/// owner's tri-state rating (liked / disliked / unrated).
#[derive(Debug, Clone)]
pub struct Section {
    pub id: Uuid,
    pub project_id: Uuid,
    pub order_index: i32,
    pub title: String,
    pub content: Option<String>,
    pub is_liked: Option<bool>,
    pub comment: Option<String>,
    pub last_refined_at: DateTime<Utc>,
}

/// A per-user reaction to a section. At most one row exists per
/// (section, user) pair; the access layer enforces this via upsert.
#[derive(Debug, Clone)]
pub struct Feedback {
    pub id: Uuid,
    pub section_id: Uuid,
    pub user_id: Uuid,
    pub is_liked: Option<bool>,
    pub comment: Option<String>,
}

/// The two supported output container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Document,
    SlideDeck,
}

/// Error returned when a stored or submitted output kind is not one of
/// the supported values.
#[derive(Debug, thiserror::Error)]
#[error("unsupported project type: {0}")]
pub struct UnknownOutputKind(pub String);

impl OutputKind {
    /// Parses a stored/submitted kind string ("docx" or "pptx").
    pub fn parse(value: &str) -> Result<Self, UnknownOutputKind> {
        match value.trim().to_ascii_lowercase().as_str() {
            "docx" => Ok(OutputKind::Document),
            "pptx" => Ok(OutputKind::SlideDeck),
            _ => Err(UnknownOutputKind(value.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Document => "docx",
            OutputKind::SlideDeck => "pptx",
        }
    }

    /// The filename extension for this kind.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// The standard office media type for this kind.
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputKind::Document => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            OutputKind::SlideDeck => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_kinds_case_insensitively() {
        assert_eq!(OutputKind::parse("docx").unwrap(), OutputKind::Document);
        assert_eq!(OutputKind::parse("PPTX").unwrap(), OutputKind::SlideDeck);
        assert_eq!(OutputKind::parse(" docx ").unwrap(), OutputKind::Document);
    }

    #[test]
    fn parse_rejects_unknown_kind_naming_the_value() {
        let err = OutputKind::parse("xlsx").unwrap_err();
        assert!(err.to_string().contains("xlsx"));
    }
}
