//! Whole-document synthesis: front matter plus the four fixed headings.

use chrono::{DateTime, Utc};
use mnemo_core::SectionType;
use mnemo_core::types::DOCUMENT_SECTIONS;

use crate::codec::format_timestamp;

pub const SCHEMA_VERSION: &str = "0.1";
const FRONT_MATTER_FENCE: &str = "---";

/// Stack details recorded in front matter by `init`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedStack {
    pub language: String,
    pub framework: Option<String>,
    pub project_type: Option<String>,
    pub database: Option<String>,
    pub features: Vec<String>,
}

/// Metadata block written at the top of a new document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub created_at: DateTime<Utc>,
    pub generated_by: Option<String>,
    pub detected_stack: Option<DetectedStack>,
}

impl FrontMatter {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            generated_by: None,
            detected_stack: None,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(FRONT_MATTER_FENCE);
        out.push('\n');
        out.push_str(&format!("schema_version: \"{SCHEMA_VERSION}\"\n"));
        out.push_str("entry_format: \"anchored\"\n");
        out.push_str(&format!(
            "created_at: \"{}\"\n",
            format_timestamp(&self.created_at)
        ));
        if let Some(generated_by) = &self.generated_by {
            out.push_str(&format!("generated_by: \"{generated_by}\"\n"));
        }
        if let Some(stack) = &self.detected_stack {
            out.push_str("detected_stack:\n");
            out.push_str(&format!("  language: \"{}\"\n", stack.language));
            if let Some(framework) = &stack.framework {
                out.push_str(&format!("  framework: \"{framework}\"\n"));
            }
            if let Some(project_type) = &stack.project_type {
                out.push_str(&format!("  project_type: \"{project_type}\"\n"));
            }
            if let Some(database) = &stack.database {
                out.push_str(&format!("  database: \"{database}\"\n"));
            }
            if !stack.features.is_empty() {
                out.push_str("  features:\n");
                for feature in &stack.features {
                    out.push_str(&format!("    - \"{feature}\"\n"));
                }
            }
        }
        out.push_str(FRONT_MATTER_FENCE);
        out.push('\n');
        out
    }
}

/// Minimal document created on first append: front matter and four empty
/// headings in fixed order.
pub fn initial_document(now: DateTime<Utc>) -> String {
    render_document(&FrontMatter::new(now), &[])
}

/// Render front matter followed by the four headings, each followed by the
/// blocks seeded for it. Heading lines inside blocks are demoted first.
pub fn render_document(front_matter: &FrontMatter, blocks: &[(SectionType, String)]) -> String {
    let mut out = front_matter.render();
    out.push('\n');

    for (index, section) in DOCUMENT_SECTIONS.iter().enumerate() {
        out.push_str(&format!("## {}\n", section.heading()));

        let mut seeded = blocks
            .iter()
            .filter(|(target, _)| target == section)
            .map(|(_, text)| text.trim())
            .filter(|text| !text.is_empty())
            .peekable();
        if seeded.peek().is_some() {
            out.push('\n');
            for text in seeded {
                out.push_str(&demote_headings(text));
                out.push('\n');
            }
        }

        if index + 1 < DOCUMENT_SECTIONS.len() {
            out.push('\n');
        }
    }
    out
}

/// Turn `## ` lines into `### ` so seeded text cannot end a section early.
pub fn demote_headings(text: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| {
            if line.starts_with("## ") {
                format!("#{line}")
            } else {
                line.to_string()
            }
        })
        .collect()
}

/// Remove a leading front-matter block, returning the remaining text.
pub fn strip_front_matter(doc: &str) -> &str {
    split_front_matter(doc).map_or(doc, |(_, rest)| rest)
}

fn split_front_matter(doc: &str) -> Option<(&str, &str)> {
    let inner = doc
        .strip_prefix("---\n")
        .or_else(|| doc.strip_prefix("---\r\n"))?;
    let mut offset = 0;
    for line in inner.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_FENCE {
            return Some((&inner[..offset], &inner[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_initial_document_exact_text() {
        let doc = initial_document(fixed_now());
        assert_eq!(
            doc,
            "---\n\
             schema_version: \"0.1\"\n\
             entry_format: \"anchored\"\n\
             created_at: \"2024-01-15T10:30:00Z\"\n\
             ---\n\
             \n\
             ## Constraints\n\
             \n\
             ## Decisions\n\
             \n\
             ## Patterns\n\
             \n\
             ## Anti-Patterns\n"
        );
    }

    #[test]
    fn test_render_document_seeds_blocks_in_their_sections() {
        let blocks = vec![
            (SectionType::Patterns, "* **[Style]** Use rustfmt\n".to_string()),
            (SectionType::Constraints, "No unsafe code".to_string()),
            (SectionType::Patterns, "Prefer iterators".to_string()),
        ];
        let doc = render_document(&FrontMatter::new(fixed_now()), &blocks);
        assert!(doc.contains("## Constraints\n\nNo unsafe code\n\n## Decisions\n\n## Patterns\n"));
        assert!(doc.contains(
            "## Patterns\n\n* **[Style]** Use rustfmt\nPrefer iterators\n\n## Anti-Patterns\n"
        ));
    }

    #[test]
    fn test_front_matter_with_stack() {
        let front = FrontMatter {
            created_at: fixed_now(),
            generated_by: Some("mnemo init".to_string()),
            detected_stack: Some(DetectedStack {
                language: "rust".to_string(),
                framework: Some("axum".to_string()),
                database: None,
                ..DetectedStack::default()
            }),
        };
        let rendered = front.render();
        assert!(rendered.contains("generated_by: \"mnemo init\"\n"));
        assert!(rendered.contains("detected_stack:\n  language: \"rust\"\n  framework: \"axum\"\n"));
        assert!(!rendered.contains("database"));
    }

    #[test]
    fn test_demote_headings() {
        let text = "## Quoted\nbody\n### Already deep\n##NoSpace\n";
        assert_eq!(
            demote_headings(text),
            "### Quoted\nbody\n### Already deep\n##NoSpace\n"
        );
    }

    #[test]
    fn test_front_matter_detection() {
        let doc = initial_document(fixed_now());
        let (body, _) = split_front_matter(&doc).expect("front matter present");
        assert!(body.starts_with("schema_version: \"0.1\"\n"));
        assert!(body.ends_with("created_at: \"2024-01-15T10:30:00Z\"\n"));

        assert!(split_front_matter("## Constraints\n").is_none());
        assert!(split_front_matter("---\nunterminated: true\n").is_none());
    }

    #[test]
    fn test_strip_front_matter() {
        let doc = "---\nkey: value\n---\n## Constraints\nbody\n";
        assert_eq!(strip_front_matter(doc), "## Constraints\nbody\n");
        assert_eq!(strip_front_matter("plain text\n"), "plain text\n");
    }
}
