//! Document mutator: splices a rendered entry in as the last element of a
//! section, leaving every byte outside that section untouched.

use mnemo_core::MemoryError;

use crate::locator::{find_section_end, find_section_start};

/// Append `rendered` (plus a newline) to the end of the `## <heading>` section.
///
/// Fails with [`MemoryError::SectionNotFound`] when the heading is absent;
/// headings are never invented here.
pub fn append_to_section(doc: &str, heading: &str, rendered: &str) -> Result<String, MemoryError> {
    let start = find_section_start(doc, heading)
        .ok_or_else(|| MemoryError::SectionNotFound(heading.to_string()))?;
    let end = find_section_end(doc, start);

    let mut updated = String::with_capacity(doc.len() + rendered.len() + 2);
    updated.push_str(&doc[..end]);
    // Only reachable for a last section whose final line has no newline.
    if !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(rendered);
    updated.push('\n');
    updated.push_str(&doc[end..]);
    Ok(updated)
}
