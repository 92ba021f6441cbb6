use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Memory category. The first four map to document headings; `Note` is the
/// default category for captures that do not name one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionType {
    Constraints,
    Decisions,
    Patterns,
    AntiPatterns,
    Note,
}

/// Headed sections of a memory document, in on-disk order.
pub const DOCUMENT_SECTIONS: [SectionType; 4] = [
    SectionType::Constraints,
    SectionType::Decisions,
    SectionType::Patterns,
    SectionType::AntiPatterns,
];

impl SectionType {
    /// Category name as accepted from callers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constraints => "constraints",
            Self::Decisions => "decisions",
            Self::Patterns => "patterns",
            Self::AntiPatterns => "anti-patterns",
            Self::Note => "note",
        }
    }

    /// Heading text used in the document (`## <heading>`).
    ///
    /// `Note` has no heading in a synthesized document; looking it up fails
    /// with "section not found" unless a caller-provided document adds one.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Constraints => "Constraints",
            Self::Decisions => "Decisions",
            Self::Patterns => "Patterns",
            Self::AntiPatterns => "Anti-Patterns",
            Self::Note => "Note",
        }
    }

    /// Section that actually stores entries of this category.
    pub fn storage_target(&self) -> SectionType {
        match self {
            Self::Note => Self::Decisions,
            other => *other,
        }
    }

    pub fn all() -> [SectionType; 5] {
        [
            Self::Constraints,
            Self::Decisions,
            Self::Patterns,
            Self::AntiPatterns,
            Self::Note,
        ]
    }
}

impl std::fmt::Display for SectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Textual encoding an entry was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryFormat {
    /// Four-line block with `entry-id` / `entry-end` comment markers.
    Anchored,
    /// Single `* **[Tag]** content` line without id or timestamp.
    LegacyInline,
}

impl EntryFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anchored => "anchored",
            Self::LegacyInline => "legacy_inline",
        }
    }
}

/// A single memory record.
///
/// `id` and `created_at` are `None` only for entries read from the legacy
/// inline format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Option<String>,
    /// Bracketed display form, e.g. `[Architecture]`.
    pub tag: String,
    /// Bare form, e.g. `Architecture`.
    pub tag_name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Entries of one category, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub section_type: SectionType,
    pub entries: Vec<Entry>,
    /// Encoding the entries were parsed from; `None` when the section is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<EntryFormat>,
}

impl Section {
    pub fn empty(section_type: SectionType) -> Self {
        Self {
            section_type,
            entries: Vec::new(),
            format: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Raw capture request as received from a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendInput {
    #[serde(default)]
    pub category: String,
    pub tag: String,
    pub content: String,
    #[serde(default)]
    pub rationale: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_headings_match_document_order() {
        let headings: Vec<&str> = DOCUMENT_SECTIONS.iter().map(|s| s.heading()).collect();
        assert_eq!(
            headings,
            vec!["Constraints", "Decisions", "Patterns", "Anti-Patterns"]
        );
    }

    #[test]
    fn test_section_from_str_round_trips_names() {
        for section in SectionType::all() {
            let parsed: SectionType = section.as_str().parse().expect("known category");
            assert_eq!(parsed, section);
        }
        assert!("Constraints".parse::<SectionType>().is_err());
        assert!("notes".parse::<SectionType>().is_err());
    }

    #[test]
    fn test_note_is_stored_under_decisions() {
        assert_eq!(SectionType::Note.storage_target(), SectionType::Decisions);
        assert_eq!(
            SectionType::AntiPatterns.storage_target(),
            SectionType::AntiPatterns
        );
    }

    #[test]
    fn test_section_type_serde_uses_kebab_case() {
        let json = serde_json::to_string(&SectionType::AntiPatterns).unwrap();
        assert_eq!(json, "\"anti-patterns\"");
        let format = serde_json::to_string(&EntryFormat::LegacyInline).unwrap();
        assert_eq!(format, "\"legacy_inline\"");
    }

    #[test]
    fn test_append_input_defaults_optional_fields() {
        let input: AppendInput =
            serde_json::from_str(r#"{"tag":"API","content":"Use REST"}"#).unwrap();
        assert!(input.category.is_empty());
        assert!(input.rationale.is_empty());
    }
}
