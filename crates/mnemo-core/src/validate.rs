use crate::error::ValidationError;
use crate::types::{AppendInput, SectionType};

pub const MAX_TAG_CHARS: usize = 50;
pub const MAX_CONTENT_CHARS: usize = 2000;
pub const MAX_RATIONALE_CHARS: usize = 500;

/// Substrings that would break the single-line entry encoding or be read as
/// markup by clients.
const FORBIDDEN_CONTENT: [&str; 6] = ["\n", "\r", "###", "```", "<", ">"];

/// Opening of the rendered rationale suffix; content carrying it would be
/// split into content and rationale on the way back in.
pub const RATIONALE_MARKER: &str = "(*Rationale:";

/// Characters a tag name cannot carry: they delimit the tag in both formats.
const FORBIDDEN_TAG: [&str; 6] = ["[", "]", "<", ">", "\n", "\r"];

/// Validate a capture request and resolve its category.
///
/// A blank category resolves to [`SectionType::Note`].
pub fn validate_input(input: &AppendInput) -> Result<SectionType, ValidationError> {
    let category = input.category.trim();
    let section = if category.is_empty() {
        SectionType::Note
    } else {
        category
            .parse::<SectionType>()
            .map_err(ValidationError::InvalidCategory)?
    };

    validate_tag(&input.tag)?;

    let content_len = input.content.chars().count();
    if input.content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if content_len > MAX_CONTENT_CHARS {
        return Err(ValidationError::ContentTooLong {
            len: content_len,
            max: MAX_CONTENT_CHARS,
        });
    }
    validate_content(&input.content)?;

    let rationale_len = input.rationale.chars().count();
    if rationale_len > MAX_RATIONALE_CHARS {
        return Err(ValidationError::RationaleTooLong {
            len: rationale_len,
            max: MAX_RATIONALE_CHARS,
        });
    }
    if input.rationale.contains(['\n', '\r']) {
        return Err(ValidationError::RationaleLineBreak);
    }

    Ok(section)
}

/// Check content against the forbidden-pattern and list-item rules.
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if let Some(pattern) = FORBIDDEN_CONTENT.iter().find(|p| content.contains(**p)) {
        return Err(ValidationError::ForbiddenContent((*pattern).to_string()));
    }
    if content.contains(RATIONALE_MARKER) {
        return Err(ValidationError::RationaleMarker(RATIONALE_MARKER.to_string()));
    }

    let trimmed = content.trim();
    if trimmed.starts_with("- ") || trimmed.starts_with("* ") {
        return Err(ValidationError::ListItem);
    }

    Ok(())
}

fn validate_tag(tag: &str) -> Result<(), ValidationError> {
    let len = tag.chars().count();
    if len == 0 {
        return Err(ValidationError::EmptyTag);
    }
    if len > MAX_TAG_CHARS {
        return Err(ValidationError::TagTooLong {
            len,
            max: MAX_TAG_CHARS,
        });
    }

    let name = strip_tag_brackets(tag);
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyTag);
    }
    if let Some(pattern) = FORBIDDEN_TAG.iter().find(|p| name.contains(**p)) {
        return Err(ValidationError::InvalidTag((*pattern).to_string()));
    }
    Ok(())
}

/// Strip one pair of wrapping brackets, if the tag was supplied as `[Name]`.
pub fn strip_tag_brackets(tag: &str) -> &str {
    tag.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(tag)
}
