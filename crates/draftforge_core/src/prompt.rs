//! crates/draftforge_core/src/prompt.rs
//!
//! Pure prompt construction for the text-generation provider, plus the
//! outline parsing that turns raw provider output back into section titles.
//! Deterministic: no network, no storage, no clock.

use crate::domain::OutputKind;

const DOCUMENT_OUTLINE_TEMPLATE: &str = r#"You are an expert document author.
Create 6-10 section titles for a formal document on:
"{topic}".

Rules:
- Maintain logical progression of topics.
- Each section should have a distinct focus.
- Avoid generic filler titles such as Introduction, Overview, or Conclusion.
- Return a simple numbered list, one title per line."#;

const SLIDE_OUTLINE_TEMPLATE: &str = r#"You are an expert presentation content designer.
Generate 7-10 creative slide titles for a presentation on:
"{topic}".

Rules:
- Titles must flow logically like a storytelling arc.
- Avoid generic or filler slides (like Introduction, Overview, Conclusion).
- Use catchy phrasing that makes sense for a professional presentation.
- Return each title on a new line, numbered."#;

const DOCUMENT_CONTENT_TEMPLATE: &str = r#"You are a professional research writer.
Write a comprehensive section for a report.

Document Topic: "{topic}"
Section Title: "{section_title}"

Requirements:
- Length: around 350-400 words.
- Tone: formal, coherent, informative.
- Include relevant insights, data context, and reasoning.
- No repetition or filler.
- Return clean paragraph text, ready to include in a report."#;

const SLIDE_CONTENT_TEMPLATE: &str = r#"You are an expert corporate storyteller.
Create content for one presentation slide.

Presentation Topic: "{topic}"
Slide Title: "{section_title}"

Requirements:
- Write 6-8 impactful bullet points.
- Each bullet must be concise but insightful.
- Maintain logical flow specific to this slide.
- Avoid repeating previous slides.
- Avoid generic intros or conclusions.
- Keep tone professional and engaging.
- Return only bullet points (no slide numbers or headers)."#;

const REFINE_TEMPLATE: &str = r#"You are an advanced language editor.

User instruction:
"{instruction}"

Refine ONLY the content below according to the instruction.
Keep meaning correct and tone consistent unless explicitly asked.
Return only the improved text, no explanations.

---CONTENT START---
{content}
---CONTENT END---"#;

/// Substituted for the existing content when a refinement is requested on a
/// section that has no content yet.
pub const EMPTY_CONTENT_PLACEHOLDER: &str =
    "(No existing content - generate fresh content based on the instruction.)";

/// Builds the instruction requesting an outline: 6-10 numbered section
/// titles for a document, 7-10 slide titles for a slide deck.
pub fn build_outline_prompt(topic: &str, kind: OutputKind) -> String {
    let template = match kind {
        OutputKind::Document => DOCUMENT_OUTLINE_TEMPLATE,
        OutputKind::SlideDeck => SLIDE_OUTLINE_TEMPLATE,
    };
    template.replace("{topic}", topic)
}

/// Builds the instruction requesting the body of a single section:
/// ~350-400 words of formal prose for a document, 6-8 bullet lines for a
/// slide deck.
pub fn build_content_prompt(topic: &str, section_title: &str, kind: OutputKind) -> String {
    let template = match kind {
        OutputKind::Document => DOCUMENT_CONTENT_TEMPLATE,
        OutputKind::SlideDeck => SLIDE_CONTENT_TEMPLATE,
    };
    template
        .replace("{topic}", topic)
        .replace("{section_title}", section_title)
}

/// Builds the rewrite instruction for a refinement. An empty existing
/// content is replaced by [`EMPTY_CONTENT_PLACEHOLDER`] so the provider
/// knows to generate fresh text.
pub fn build_refine_prompt(instruction: &str, existing_content: &str) -> String {
    let content = if existing_content.trim().is_empty() {
        EMPTY_CONTENT_PLACEHOLDER
    } else {
        existing_content
    };
    REFINE_TEMPLATE
        .replace("{instruction}", instruction)
        .replace("{content}", content)
}

/// Turns raw outline text from the provider into a list of titles:
/// numbering and bullet prefixes are stripped, blank lines dropped.
pub fn parse_outline(raw: &str) -> Vec<String> {
    raw.lines()
        .map(strip_list_prefix)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_list_prefix(line: &str) -> &str {
    line.trim()
        .trim_start_matches(|c: char| {
            c.is_ascii_digit() || matches!(c, '.' | ')' | '-' | '*' | '•' | ' ')
        })
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_prompt_embeds_topic_and_matches_kind() {
        let doc = build_outline_prompt("Renewable Energy", OutputKind::Document);
        assert!(doc.contains("\"Renewable Energy\""));
        assert!(doc.contains("6-10 section titles"));

        let deck = build_outline_prompt("Renewable Energy", OutputKind::SlideDeck);
        assert!(deck.contains("7-10 creative slide titles"));
    }

    #[test]
    fn content_prompt_embeds_topic_and_section_title() {
        let prompt =
            build_content_prompt("Renewable Energy", "Grid Storage Challenges", OutputKind::Document);
        assert!(prompt.contains("\"Renewable Energy\""));
        assert!(prompt.contains("\"Grid Storage Challenges\""));
        assert!(prompt.contains("350-400 words"));

        let bullets =
            build_content_prompt("Renewable Energy", "Grid Storage Challenges", OutputKind::SlideDeck);
        assert!(bullets.contains("6-8 impactful bullet points"));
    }

    #[test]
    fn refine_prompt_substitutes_placeholder_for_empty_content() {
        let prompt = build_refine_prompt("Make it shorter", "   ");
        assert!(prompt.contains(EMPTY_CONTENT_PLACEHOLDER));
        assert!(prompt.contains("\"Make it shorter\""));

        let prompt = build_refine_prompt("Make it shorter", "Existing body text.");
        assert!(prompt.contains("Existing body text."));
        assert!(!prompt.contains(EMPTY_CONTENT_PLACEHOLDER));
    }

    #[test]
    fn prompts_are_deterministic() {
        let a = build_content_prompt("Topic", "Title", OutputKind::Document);
        let b = build_content_prompt("Topic", "Title", OutputKind::Document);
        assert_eq!(a, b);
    }

    #[test]
    fn parse_outline_strips_numbering_and_blank_lines() {
        let raw = "1. Solar Adoption Trends\n\n2) Grid Storage Challenges\n   \n- Policy Landscape\n• Market Outlook\n";
        let titles = parse_outline(raw);
        assert_eq!(
            titles,
            vec![
                "Solar Adoption Trends",
                "Grid Storage Challenges",
                "Policy Landscape",
                "Market Outlook",
            ]
        );
    }

    #[test]
    fn parse_outline_keeps_interior_digits() {
        let titles = parse_outline("1. Q3 2024 Revenue in 5 Charts");
        assert_eq!(titles, vec!["Q3 2024 Revenue in 5 Charts"]);
    }
}
