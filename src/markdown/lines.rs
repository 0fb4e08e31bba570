//! Single-line parsers used to decide which kind of block a line starts.
//!
//! None of these keep state; the block renderer composes them in a fixed
//! precedence order.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceMarker {
    Backtick,
    Tilde,
}

impl FenceMarker {
    fn char(self) -> char {
        match self {
            FenceMarker::Backtick => '`',
            FenceMarker::Tilde => '~',
        }
    }
}

/// An open code fence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence {
    pub marker: FenceMarker,
    pub count: usize,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListLine<'a> {
    pub indent: usize,
    pub ordered: bool,
    pub text: &'a str,
}

/// A Markdown image that occupies a whole line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownImage<'a> {
    pub alt: &'a str,
    pub src: &'a str,
    pub title: Option<&'a str>,
}

/// Count the leading run of `c` in `s`.
fn run_length(s: &str, c: char) -> usize {
    s.chars().take_while(|&x| x == c).count()
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Width of the leading whitespace, with tabs counted as four columns.
pub fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Replace tabs in the leading whitespace with four spaces each.
pub fn expand_leading_tabs(line: &str) -> String {
    let body = line.trim_start_matches([' ', '\t']);
    let lead = &line[..line.len() - body.len()];
    let mut out = String::with_capacity(line.len());
    for c in lead.chars() {
        if c == '\t' {
            out.push_str("    ");
        } else {
            out.push(c);
        }
    }
    out.push_str(body);
    out
}

pub fn fence_open(line: &str) -> Option<Fence> {
    let trimmed = line.trim_start();
    let marker = match trimmed.chars().next()? {
        '`' => FenceMarker::Backtick,
        '~' => FenceMarker::Tilde,
        _ => return None,
    };
    let count = run_length(trimmed, marker.char());
    if count < 3 {
        return None;
    }

    // Fence characters are ASCII, so `count` is also a byte offset.
    let info = trimmed[count..].trim();
    if info.contains(marker.char()) {
        return None;
    }
    let language = info.split_whitespace().next().map(str::to_lowercase);
    Some(Fence {
        marker,
        count,
        language,
    })
}

pub fn is_fence_close(line: &str, fence: &Fence) -> bool {
    let trimmed = line.trim();
    let count = run_length(trimmed, fence.marker.char());
    count >= fence.count && count == trimmed.len()
}

/// Match `#{1,6}` followed by whitespace and some text, returning the level
/// and the trimmed text.
pub fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let level = run_length(line, '#');
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = &line[level..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }
    Some((level as u8, text))
}

pub fn parse_list_line(line: &str) -> Option<ListLine<'_>> {
    let body = line.trim_start_matches([' ', '\t']);
    let indent = indent_width(line);

    let (ordered, after_marker) = if let Some(rest) = body.strip_prefix(['-', '*', '+']) {
        (false, rest)
    } else {
        let digits = body.chars().take_while(char::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        (true, body[digits..].strip_prefix(['.', ')'])?)
    };

    if !after_marker.starts_with(char::is_whitespace) {
        return None;
    }
    Some(ListLine {
        indent,
        ordered,
        text: after_marker.trim(),
    })
}

pub fn parse_table_row(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    if !trimmed.contains('|') {
        return None;
    }
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    let cells: Vec<String> = inner.split('|').map(|c| c.trim().to_string()).collect();
    if cells.len() < 2 {
        return None;
    }
    Some(cells)
}

/// A separator cell is dashes with optional alignment colons: `---`, `:--`,
/// `-:`, `:-:`.
fn is_separator_cell(cell: &str) -> bool {
    let cell = cell.strip_prefix(':').unwrap_or(cell);
    let cell = cell.strip_suffix(':').unwrap_or(cell);
    !cell.is_empty() && cell.chars().all(|c| c == '-')
}

pub fn is_table_starter<S: AsRef<str>>(lines: &[S], i: usize) -> bool {
    let (Some(header), Some(separator)) = (lines.get(i), lines.get(i + 1)) else {
        return false;
    };
    match (
        parse_table_row(header.as_ref()),
        parse_table_row(separator.as_ref()),
    ) {
        (Some(head), Some(sep)) => {
            head.len() == sep.len() && sep.iter().all(|c| is_separator_cell(c))
        }
        _ => false,
    }
}

pub fn parse_image_line(line: &str) -> Option<MarkdownImage<'_>> {
    let rest = line.trim().strip_prefix("![")?;
    let (alt, rest) = rest.split_once("](")?;
    if alt.contains(']') {
        return None;
    }
    let inner = rest.strip_suffix(')')?;

    let (src, title) = match inner.split_once(char::is_whitespace) {
        None => (inner, None),
        Some((src, tail)) => {
            let title = tail
                .trim()
                .strip_prefix('"')
                .and_then(|t| t.strip_suffix('"'))?;
            if title.contains('"') {
                return None;
            }
            (src, Some(title))
        }
    };
    if src.is_empty() || src.contains(')') {
        return None;
    }
    Some(MarkdownImage { alt, src, title })
}
