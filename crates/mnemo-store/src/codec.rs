//! Entry codec: the anchored four-line block written today, and the legacy
//! inline line still found in older files.

use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use mnemo_core::{Entry, EntryFormat};
use regex::Regex;

/// One anchored block, anchored at line boundaries.
static ANCHORED_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)^<!-- entry-id: ([^,\s]*), tag: \[([^\]\n]*)\], time: ([^\n]*?) -->\n",
        r"\* \*\*\[([^\]\n]+)\]\*\* ([^\n]+?)(?: \(\*Rationale: ([^\n]*?)\*\))?\n",
        r"<!-- entry-end -->$",
    ))
    .unwrap()
});

static LEGACY_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\* \*\*\[([^\]]+)\]\*\* (.+?)(?: \(\*Rationale: (.*?)\*\))?$").unwrap()
});

/// Parsers tried in order; the first one that yields entries wins.
pub const PARSE_ORDER: [EntryFormat; 2] = [EntryFormat::Anchored, EntryFormat::LegacyInline];

/// Entries pulled out of a section body, with the format that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntries {
    pub entries: Vec<Entry>,
    /// `None` when no strategy found anything.
    pub format: Option<EntryFormat>,
}

/// Serialize a timestamp the way entry headers and front matter carry it.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

/// Render an entry as its anchored block (no trailing newline).
///
/// The rationale suffix is left out entirely when there is no rationale.
pub fn render_entry(entry: &Entry) -> String {
    let time = entry
        .created_at
        .as_ref()
        .map(format_timestamp)
        .unwrap_or_default();

    let mut block = format!(
        "<!-- entry-id: {}, tag: {}, time: {} -->\n* **[{}]** {}",
        entry.id.as_deref().unwrap_or_default(),
        entry.tag,
        time,
        entry.tag_name,
        entry.content
    );
    if let Some(rationale) = entry.rationale.as_deref().filter(|r| !r.is_empty()) {
        block.push_str(&format!(" (*Rationale: {rationale}*)"));
    }
    block.push_str("\n<!-- entry-end -->");
    block
}

/// Parse a section body, trying each format in [`PARSE_ORDER`].
///
/// Text neither format recognizes is skipped; an empty result is not an error.
pub fn parse_section_entries(block: &str) -> ParsedEntries {
    let normalized = block.replace("\r\n", "\n");
    for format in PARSE_ORDER {
        if let Some(entries) = parse_with(format, &normalized) {
            return ParsedEntries {
                entries,
                format: Some(format),
            };
        }
    }
    ParsedEntries {
        entries: Vec::new(),
        format: None,
    }
}

/// Run a single strategy. `None` means the strategy declined the block.
pub fn parse_with(format: EntryFormat, block: &str) -> Option<Vec<Entry>> {
    let entries = match format {
        EntryFormat::Anchored => parse_anchored(block),
        EntryFormat::LegacyInline => parse_legacy_inline(block),
    };
    (!entries.is_empty()).then_some(entries)
}

fn parse_anchored(block: &str) -> Vec<Entry> {
    ANCHORED_ENTRY_RE
        .captures_iter(block)
        .map(|caps| {
            let id = &caps[1];
            Entry {
                id: (!id.is_empty()).then(|| id.to_string()),
                tag: format!("[{}]", &caps[2]),
                tag_name: caps[4].to_string(),
                content: caps[5].to_string(),
                rationale: non_empty(caps.get(6).map(|m| m.as_str())),
                created_at: parse_timestamp(&caps[3]),
            }
        })
        .collect()
}

fn parse_legacy_inline(block: &str) -> Vec<Entry> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("* **["))
        .filter_map(|line| LEGACY_ENTRY_RE.captures(line))
        .map(|caps| Entry {
            id: None,
            tag: format!("[{}]", &caps[1]),
            tag_name: caps[1].to_string(),
            content: caps[2].to_string(),
            rationale: non_empty(caps.get(3).map(|m| m.as_str())),
            created_at: None,
        })
        .collect()
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.filter(|t| !t.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn sample_entry(rationale: Option<&str>) -> Entry {
        Entry {
            id: Some("01J9Z3K8Q4W5E6R7T8Y9U0I1O2".to_string()),
            tag: "[Architecture]".to_string(),
            tag_name: "Architecture".to_string(),
            content: "Use hexagonal architecture".to_string(),
            rationale: rationale.map(str::to_string),
            created_at: Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()),
        }
    }

    #[test]
    fn test_render_with_rationale() {
        let rendered = render_entry(&sample_entry(Some("For separation of concerns")));
        assert_eq!(
            rendered,
            "<!-- entry-id: 01J9Z3K8Q4W5E6R7T8Y9U0I1O2, tag: [Architecture], time: 2024-01-15T10:30:00Z -->\n\
             * **[Architecture]** Use hexagonal architecture (*Rationale: For separation of concerns*)\n\
             <!-- entry-end -->"
        );
    }

    #[test]
    fn test_render_omits_empty_rationale() {
        for rationale in [None, Some("")] {
            let rendered = render_entry(&sample_entry(rationale));
            assert!(!rendered.contains("Rationale"));
            assert_eq!(rendered.lines().count(), 3);
            assert!(rendered.contains("* **[Architecture]** Use hexagonal architecture\n"));
        }
    }

    #[test]
    fn test_anchored_round_trip() {
        for rationale in [None, Some("For separation of concerns")] {
            let entry = sample_entry(rationale);
            let parsed = parse_section_entries(&format!("\n{}\n", render_entry(&entry)));
            assert_eq!(parsed.format, Some(EntryFormat::Anchored));
            assert_eq!(parsed.entries, vec![entry]);
        }
    }

    #[test]
    fn test_multi_bracket_tag_kept_raw() {
        let block = "<!-- entry-id: abc-123, tag: [a, b], time: 2024-01-15T10:30:00Z -->\n\
                     * **[a]** Keep both tags\n\
                     <!-- entry-end -->\n";
        let parsed = parse_section_entries(block);
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].tag, "[a, b]");
        assert_eq!(parsed.entries[0].tag_name, "a");
    }

    #[test]
    fn test_noise_between_blocks_is_skipped() {
        let first = render_entry(&sample_entry(None));
        let mut second = sample_entry(Some("why"));
        second.id = Some("01J9Z3K8Q4W5E6R7T8Y9U0I1O3".to_string());
        second.content = "Second rule".to_string();
        let block = format!(
            "stray paragraph\n{first}\n<!-- entry-id: broken -->\n* not an entry\n{}\n\ntrailing",
            render_entry(&second)
        );

        let parsed = parse_section_entries(&block);
        assert_eq!(parsed.format, Some(EntryFormat::Anchored));
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[1].content, "Second rule");
        assert_eq!(parsed.entries[1].rationale.as_deref(), Some("why"));
    }

    #[test]
    fn test_legacy_fallback() {
        let block = "\n* **[API]** Use RESTful conventions\n\
                     * **[DB]** Prefer Postgres (*Rationale: team knows it*)\n\
                     free text\n";
        let parsed = parse_section_entries(block);
        assert_eq!(parsed.format, Some(EntryFormat::LegacyInline));
        assert_eq!(parsed.entries.len(), 2);

        let api = &parsed.entries[0];
        assert_eq!(api.id, None);
        assert_eq!(api.created_at, None);
        assert_eq!(api.tag, "[API]");
        assert_eq!(api.tag_name, "API");
        assert_eq!(api.content, "Use RESTful conventions");
        assert_eq!(api.rationale, None);

        let db = &parsed.entries[1];
        assert_eq!(db.content, "Prefer Postgres");
        assert_eq!(db.rationale.as_deref(), Some("team knows it"));
    }

    #[test]
    fn test_anchored_entries_take_precedence_over_legacy_lines() {
        let block = format!(
            "* **[Old]** Legacy line\n{}\n",
            render_entry(&sample_entry(None))
        );
        let parsed = parse_section_entries(&block);
        assert_eq!(parsed.format, Some(EntryFormat::Anchored));
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].tag_name, "Architecture");
    }

    #[test]
    fn test_unrecognized_block_yields_nothing() {
        for block in ["", "\n", "just some prose\n- a bullet\n", "### Sub heading\n"] {
            let parsed = parse_section_entries(block);
            assert!(parsed.entries.is_empty());
            assert_eq!(parsed.format, None);
        }
    }

    #[test]
    fn test_crlf_line_endings_parse() {
        let block = render_entry(&sample_entry(Some("why"))).replace('\n', "\r\n");
        let parsed = parse_section_entries(&block);
        assert_eq!(parsed.entries, vec![sample_entry(Some("why"))]);
    }

    #[test]
    fn test_unparseable_time_leaves_created_at_empty() {
        let block = "<!-- entry-id: x1, tag: [T], time: yesterday -->\n\
                     * **[T]** Content here\n\
                     <!-- entry-end -->";
        let parsed = parse_section_entries(block);
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].created_at, None);
        assert_eq!(parsed.entries[0].id.as_deref(), Some("x1"));
    }

    #[test]
    fn test_parse_with_declines_on_empty() {
        assert!(parse_with(EntryFormat::Anchored, "nothing").is_none());
        assert!(parse_with(EntryFormat::LegacyInline, "nothing").is_none());
    }

    proptest! {
        #[test]
        fn prop_render_then_parse_preserves_entry(
            id in "[0-9A-HJKMNP-TV-Z]{26}",
            tag_name in "[A-Za-z][A-Za-z0-9 _.-]{0,30}",
            head in "[A-Za-z0-9][A-Za-z0-9 ,.;:!?()*'\"/=+-]{0,60}",
            fragment in prop::sample::select(vec![
                "", " (*Rationale: inline*)", " (*Rationale:", "Rationale: x*)", " (*aside*)", " *)",
            ]),
            tail in "[A-Za-z0-9 ,.;:!?()*'/=+-]{0,60}",
            rationale in proptest::option::of("[A-Za-z0-9][A-Za-z0-9 ,.;:!?()*'/-]{0,80}"),
            secs in 0i64..4_000_000_000i64,
        ) {
            let content = format!("{head}{fragment}{tail}");
            prop_assume!(mnemo_core::validate_content(&content).is_ok());
            let entry = Entry {
                id: Some(id),
                tag: format!("[{tag_name}]"),
                tag_name,
                content,
                rationale,
                created_at: Utc.timestamp_opt(secs, 0).single(),
            };
            let parsed = parse_section_entries(&render_entry(&entry));
            prop_assert_eq!(parsed.entries, vec![entry]);
        }
    }
}
