use super::blocks::render_document;
use super::heading_ids::plain_text;
use super::images::NoAssets;
use super::lines::{Fence, fence_open, is_fence_close, parse_heading};
use serde::Serialize;

/// Heading levels that appear in the table of contents.
const TOC_LEVELS: std::ops::RangeInclusive<u8> = 2..=4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocHeading {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// Visit every top-level heading outside fenced code, in document order.
fn for_each_heading<'a>(lines: impl Iterator<Item = &'a str>, mut f: impl FnMut(u8, &'a str)) {
    let mut fence: Option<Fence> = None;
    for line in lines {
        match &fence {
            Some(open) => {
                if is_fence_close(line, open) {
                    fence = None;
                }
            }
            None => {
                if let Some(open) = fence_open(line) {
                    fence = Some(open);
                } else if let Some((level, text)) = parse_heading(line) {
                    f(level, text);
                }
            }
        }
    }
}

/// Keep the headings that belong in a table of contents.
pub(super) fn table_of_contents(headings: Vec<TocHeading>) -> Vec<TocHeading> {
    headings
        .into_iter()
        .filter(|h| TOC_LEVELS.contains(&h.level))
        .collect()
}

/// The outline of a document. The ids come from a full render, so they are
/// exactly the ones on the rendered headings, including any nested in list
/// items.
pub fn extract_table_of_contents(markdown: &str) -> Vec<TocHeading> {
    let (_, headings) = render_document(markdown, None, &NoAssets);
    table_of_contents(headings)
}

/// The plain text of the first level-1 heading, if any.
pub fn document_title(markdown: &str) -> Option<String> {
    let mut title = None;
    for_each_heading(markdown.lines(), |level, text| {
        if level == 1 && title.is_none() {
            title = Some(plain_text(text).trim().to_string());
        }
    });
    title
}
