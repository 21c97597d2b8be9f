//! crates/draftforge_core/src/generation.rs
//!
//! Degradation policy around the [`TextGenerationService`] port. The port
//! itself returns a typed result; the helpers here let call sites that must
//! always end up with renderable text (section content, refinements) absorb
//! provider failures into sentinel strings instead of hard errors.

use crate::domain::OutputKind;
use crate::ports::TextGenerationService;
use crate::prompt::build_content_prompt;

/// A generation result shorter than this (after trimming) is judged
/// insufficient and replaced by a sentinel. Exactly this length passes.
pub const MIN_CONTENT_CHARS: usize = 50;

/// Sentinel embedded in place of content when the provider call fails.
pub fn error_sentinel(cause: &str) -> String {
    format!("(Error generating response: {})", cause)
}

/// Sentinel embedded when the provider returned near-empty content.
pub fn insufficient_sentinel(title: &str) -> String {
    format!("(Insufficient content generated for '{}')", title)
}

/// Applies the minimum-length guard to a raw generation result.
pub fn guard_content(title: &str, raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() < MIN_CONTENT_CHARS {
        insufficient_sentinel(title)
    } else {
        trimmed.to_string()
    }
}

/// One generation attempt that always resolves to text: a provider failure
/// degrades to [`error_sentinel`] rather than propagating.
pub async fn generate_or_sentinel(gateway: &dyn TextGenerationService, prompt: &str) -> String {
    match gateway.generate(prompt).await {
        Ok(text) => text,
        Err(e) => error_sentinel(&e.to_string()),
    }
}

/// Produces the body for one section: builds the content prompt, makes a
/// single provider attempt, and applies the length guard. Never fails, so a
/// bad result for one section cannot abort the remaining sections of a
/// project.
pub async fn generate_section_content(
    gateway: &dyn TextGenerationService,
    topic: &str,
    section_title: &str,
    kind: OutputKind,
) -> String {
    let prompt = build_content_prompt(topic, section_title, kind);
    let raw = generate_or_sentinel(gateway, &prompt).await;
    guard_content(section_title, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;

    /// A scripted gateway: returns the canned result for every prompt.
    struct FixedGateway(PortResult<String>);

    #[async_trait]
    impl TextGenerationService for FixedGateway {
        async fn generate(&self, _prompt: &str) -> PortResult<String> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(PortError::Unexpected(msg)) => Err(PortError::Unexpected(msg.clone())),
                Err(_) => Err(PortError::Unexpected("scripted failure".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_error_sentinel() {
        let gateway = FixedGateway(Err(PortError::Unexpected("quota exceeded".to_string())));
        let text = generate_or_sentinel(&gateway, "any prompt").await;
        assert_eq!(
            text,
            "(Error generating response: An unexpected error occurred: quota exceeded)"
        );
    }

    #[tokio::test]
    async fn successful_generation_passes_through() {
        let gateway = FixedGateway(Ok("a perfectly reasonable answer".to_string()));
        let text = generate_or_sentinel(&gateway, "any prompt").await;
        assert_eq!(text, "a perfectly reasonable answer");
    }

    #[test]
    fn short_content_is_replaced_by_insufficient_sentinel() {
        let guarded = guard_content("Revenue", "too short");
        assert_eq!(guarded, "(Insufficient content generated for 'Revenue')");
    }

    #[test]
    fn exactly_fifty_chars_is_accepted_unmodified() {
        let body = "x".repeat(MIN_CONTENT_CHARS);
        assert_eq!(guard_content("Revenue", &body), body);

        let short = "x".repeat(MIN_CONTENT_CHARS - 1);
        assert_eq!(
            guard_content("Revenue", &short),
            insufficient_sentinel("Revenue")
        );
    }

    #[test]
    fn guard_trims_before_measuring() {
        let body = format!("  {}  ", "y".repeat(MIN_CONTENT_CHARS));
        assert_eq!(guard_content("Revenue", &body), "y".repeat(MIN_CONTENT_CHARS));
    }

    #[tokio::test]
    async fn section_content_is_guarded_after_generation() {
        let gateway = FixedGateway(Ok("ok".to_string()));
        let text = generate_section_content(
            &gateway,
            "Renewable Energy",
            "Grid Storage Challenges",
            crate::domain::OutputKind::Document,
        )
        .await;
        assert_eq!(
            text,
            "(Insufficient content generated for 'Grid Storage Challenges')"
        );
    }
}
