//! Section locator: byte ranges of `## <Heading>` sections in a document.
//!
//! A section starts at its heading line and ends at the next line beginning
//! with `## `, whatever heading that is, or at end of document.

use std::ops::Range;

const HEADING_PREFIX: &str = "## ";

/// Offset of the first line that is exactly `## <heading>`.
///
/// Trailing whitespace (including a `\r`) on the heading line is ignored.
pub fn find_section_start(doc: &str, heading: &str) -> Option<usize> {
    let mut offset = 0;
    for line in doc.split_inclusive('\n') {
        if let Some(title) = line.strip_prefix(HEADING_PREFIX)
            && title.trim_end() == heading
        {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

/// Offset where the section starting at `start` ends: the next line that
/// begins with `## `, or the end of the document.
pub fn find_section_end(doc: &str, start: usize) -> usize {
    let Some(body_start) = heading_line_end(doc, start) else {
        return doc.len();
    };

    let mut offset = body_start;
    for line in doc[body_start..].split_inclusive('\n') {
        if line.starts_with(HEADING_PREFIX) {
            return offset;
        }
        offset += line.len();
    }
    doc.len()
}

/// Byte range of the whole section, heading line included.
pub fn section_span(doc: &str, heading: &str) -> Option<Range<usize>> {
    let start = find_section_start(doc, heading)?;
    Some(start..find_section_end(doc, start))
}

/// Section body with the heading line stripped; empty when the heading is absent.
pub fn extract_section<'a>(doc: &'a str, heading: &str) -> &'a str {
    let Some(span) = section_span(doc, heading) else {
        return "";
    };
    match heading_line_end(doc, span.start) {
        Some(body_start) => &doc[body_start..span.end],
        None => "",
    }
}

/// Offset just past the newline that ends the heading line at `start`.
fn heading_line_end(doc: &str, start: usize) -> Option<usize> {
    doc[start..].find('\n').map(|pos| start + pos + 1)
}
