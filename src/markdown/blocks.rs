use super::heading_ids::{HeadingIds, plain_text};
use super::highlight::highlight;
use super::images::{AssetProbe, resolve_image_src};
use super::inline::render_inline;
use super::toc::TocHeading;
use super::lines::{
    Fence, expand_leading_tabs, fence_open, indent_width, is_blank, is_fence_close,
    is_table_starter, parse_heading, parse_image_line, parse_list_line, parse_table_row,
};
use serde::Serialize;

/// One rendered piece of a document. Every `html` field is already escaped
/// and safe to insert verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading {
        level: u8,
        id: String,
        html: String,
    },
    Code {
        raw: String,
        highlighted: String,
        language: Option<String>,
    },
    List {
        ordered: bool,
        items: Vec<ListItem>,
    },
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Image {
        src: String,
        alt: String,
        title: Option<String>,
    },
    Paragraph {
        html: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub html: String,
    pub children: Vec<Block>,
}

/// Renders a run of lines into blocks. List item bodies are rendered by
/// calling back into the same renderer, sharing its heading ids.
pub struct BlockRenderer<'a> {
    ids: HeadingIds,
    slug: Option<&'a str>,
    assets: &'a dyn AssetProbe,
    /// Every heading emitted so far, nested ones included, in document order.
    pub headings: Vec<TocHeading>,
}

/// Render a whole document, returning its blocks and every heading in it.
pub fn render_document(
    markdown: &str,
    slug: Option<&str>,
    assets: &dyn AssetProbe,
) -> (Vec<Block>, Vec<TocHeading>) {
    let source = markdown.replace("\r\n", "\n");
    let lines: Vec<&str> = source.split('\n').collect();
    let mut renderer = BlockRenderer::new(slug, assets);
    let blocks = renderer.render(&lines);
    (blocks, renderer.headings)
}

/// Does this line begin a block other than a paragraph?
fn starts_block<S: AsRef<str>>(lines: &[S], i: usize) -> bool {
    let line = lines[i].as_ref();
    fence_open(line).is_some()
        || parse_heading(line).is_some()
        || parse_list_line(line).is_some()
        || is_table_starter(lines, i)
        || parse_image_line(line).is_some()
}

/// Remove the indentation shared by every non-blank line, after expanding
/// leading tabs. Blank lines become empty.
fn strip_common_indent<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let lines: Vec<String> = lines
        .iter()
        .map(|l| expand_leading_tabs(l.as_ref()))
        .collect();
    let common = lines
        .iter()
        .filter(|l| !is_blank(l))
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            if is_blank(l) {
                String::new()
            } else {
                l[common..].to_string()
            }
        })
        .collect()
}

impl<'a> BlockRenderer<'a> {
    pub fn new(slug: Option<&'a str>, assets: &'a dyn AssetProbe) -> Self {
        Self {
            ids: HeadingIds::new(),
            slug,
            assets,
            headings: vec![],
        }
    }

    pub fn render<S: AsRef<str>>(&mut self, lines: &[S]) -> Vec<Block> {
        let mut blocks = vec![];
        let mut i = 0;
        while i < lines.len() {
            let line = lines[i].as_ref();
            if is_blank(line) {
                i += 1;
            } else if let Some(fence) = fence_open(line) {
                i = self.code_block(lines, i, fence, &mut blocks);
            } else if let Some((level, text)) = parse_heading(line) {
                let id = self.ids.allocate(text);
                self.headings.push(TocHeading {
                    id: id.clone(),
                    text: plain_text(text).trim().to_string(),
                    level,
                });
                blocks.push(Block::Heading {
                    level,
                    id,
                    html: render_inline(text),
                });
                i += 1;
            } else if parse_list_line(line).is_some() {
                i = self.list(lines, i, &mut blocks);
            } else if is_table_starter(lines, i) {
                i = table(lines, i, &mut blocks);
            } else if let Some(image) = parse_image_line(line) {
                blocks.push(Block::Image {
                    src: resolve_image_src(image.src, self.slug, self.assets),
                    alt: image.alt.to_string(),
                    title: image.title.map(str::to_string),
                });
                i += 1;
            } else {
                i = paragraph(lines, i, &mut blocks);
            }
        }
        blocks
    }

    /// Consume a fenced code block starting at `start`, returning the index
    /// of the first line after it.
    fn code_block<S: AsRef<str>>(
        &mut self,
        lines: &[S],
        start: usize,
        fence: Fence,
        blocks: &mut Vec<Block>,
    ) -> usize {
        let mut end = start + 1;
        while end < lines.len() && !is_fence_close(lines[end].as_ref(), &fence) {
            end += 1;
        }
        let raw = strip_common_indent(&lines[start + 1..end]).join("\n");

        blocks.push(Block::Code {
            highlighted: highlight(&raw, fence.language.as_deref()),
            raw,
            language: fence.language,
        });
        (end + 1).min(lines.len())
    }

    /// Consume a list whose first item is at `start`.
    fn list<S: AsRef<str>>(&mut self, lines: &[S], start: usize, blocks: &mut Vec<Block>) -> usize {
        let Some(first) = parse_list_line(lines[start].as_ref()) else {
            return start + 1;
        };
        let (base, ordered) = (first.indent, first.ordered);
        let same_list = |line: &str| {
            parse_list_line(line).is_some_and(|l| l.indent == base && l.ordered == ordered)
        };

        let mut items = vec![];
        let mut i = start;
        while i < lines.len() {
            let line = lines[i].as_ref();
            if is_blank(line) {
                // Blank lines between items of this list do not end it.
                let next = next_non_blank(lines, i);
                if next < lines.len() && same_list(lines[next].as_ref()) {
                    i = next;
                    continue;
                }
                break;
            }
            let Some(item) = parse_list_line(line).filter(|_| same_list(line)) else {
                break;
            };

            let (body, next) = continuation(lines, i + 1, base);
            let children = if body.is_empty() {
                vec![]
            } else {
                self.render(&strip_common_indent(&body))
            };
            items.push(ListItem {
                html: render_inline(item.text),
                children,
            });
            i = next;
        }

        blocks.push(Block::List { ordered, items });
        i
    }
}

fn next_non_blank<S: AsRef<str>>(lines: &[S], from: usize) -> usize {
    let mut j = from;
    while j < lines.len() && is_blank(lines[j].as_ref()) {
        j += 1;
    }
    j
}

/// Collect the lines belonging to a list item's body: everything indented
/// deeper than the marker, blank lines followed by more such lines, and
/// whole fenced blocks once opened. Returns the captured lines (tabs
/// expanded) and the index of the first line not taken.
fn continuation<S: AsRef<str>>(lines: &[S], from: usize, base: usize) -> (Vec<String>, usize) {
    let mut body = vec![];
    let mut fence: Option<Fence> = None;
    let mut i = from;
    while i < lines.len() {
        let line = lines[i].as_ref();
        if let Some(open) = &fence {
            if is_fence_close(line, open) {
                fence = None;
            }
            body.push(expand_leading_tabs(line));
            i += 1;
            continue;
        }

        if is_blank(line) {
            let next = next_non_blank(lines, i);
            if next < lines.len() && indent_width(lines[next].as_ref()) > base {
                body.extend((i..next).map(|_| String::new()));
                i = next;
                continue;
            }
            break;
        }

        if indent_width(line) <= base {
            break;
        }
        fence = fence_open(line);
        body.push(expand_leading_tabs(line));
        i += 1;
    }
    (body, i)
}

fn table<S: AsRef<str>>(lines: &[S], start: usize, blocks: &mut Vec<Block>) -> usize {
    let Some(header) = parse_table_row(lines[start].as_ref()) else {
        return start + 1;
    };

    let mut rows = vec![];
    let mut i = start + 2;
    while i < lines.len() {
        let line = lines[i].as_ref();
        if is_blank(line)
            || fence_open(line).is_some()
            || parse_heading(line).is_some()
            || parse_list_line(line).is_some()
        {
            break;
        }
        match parse_table_row(line) {
            Some(cells) if cells.len() == header.len() => {
                rows.push(cells.iter().map(|c| render_inline(c)).collect());
                i += 1;
            }
            _ => break,
        }
    }

    blocks.push(Block::Table {
        header: header.iter().map(|c| render_inline(c)).collect(),
        rows,
    });
    i
}

fn paragraph<S: AsRef<str>>(lines: &[S], start: usize, blocks: &mut Vec<Block>) -> usize {
    let mut i = start;
    let mut text: Vec<&str> = vec![];
    while i < lines.len() && !is_blank(lines[i].as_ref()) && !starts_block(lines, i) {
        text.push(lines[i].as_ref().trim());
        i += 1;
    }

    if text.is_empty() {
        // Always make progress, even on a line nothing else would take.
        blocks.push(Block::Paragraph {
            html: render_inline(lines[start].as_ref()),
        });
        return start + 1;
    }
    blocks.push(Block::Paragraph {
        html: render_inline(&text.join(" ")),
    });
    i
}
