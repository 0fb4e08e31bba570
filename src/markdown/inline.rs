//! Inline Markdown: links, code spans, and emphasis.
//!
//! The whole input is HTML-escaped first, so only the constructs recognized
//! here ever become markup. Generated tags are parked in a side table and
//! referenced from the text by NUL-delimited placeholders until the end, so
//! later passes never look inside them.

const MARK: char = '\0';

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render one logical line (or a joined paragraph) of inline Markdown to
/// HTML.
pub fn render_inline(text: &str) -> String {
    let mut stash = Stash::default();
    let escaped = escape_html(&text.replace(MARK, "\u{FFFD}"));

    let with_code = code_spans(&escaped, &mut stash);
    let with_links = links(&with_code, &mut stash);
    let bold = emphasis(&with_links, "**", "strong");
    let italic = emphasis(&bold, "*", "em");

    stash.restore(&italic)
}

#[derive(Default)]
struct Stash(Vec<String>);

impl Stash {
    fn park(&mut self, html: String) -> String {
        self.0.push(html);
        format!("{MARK}{}{MARK}", self.0.len() - 1)
    }

    fn restore(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut parts = text.split(MARK);
        if let Some(first) = parts.next() {
            out.push_str(first);
        }
        // Placeholders alternate with ordinary text: index, text, index, ...
        while let (Some(index), Some(after)) = (parts.next(), parts.next()) {
            if let Some(html) = index.parse::<usize>().ok().and_then(|i| self.0.get(i)) {
                out.push_str(html);
            }
            out.push_str(after);
        }
        out
    }
}

fn code_spans(text: &str, stash: &mut Stash) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('`') {
        let after = &rest[start + 1..];
        match after.find('`') {
            Some(len) if len > 0 => {
                out.push_str(&rest[..start]);
                out.push_str(&stash.park(format!("<code>{}</code>", &after[..len])));
                rest = &after[len + 1..];
            }
            _ => {
                out.push_str(&rest[..start + 1]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// A `[text](url "title")` link, matched against already-escaped text.
struct Link<'a> {
    text: &'a str,
    url: &'a str,
    title: Option<&'a str>,
    len: usize,
}

fn match_link(s: &str) -> Option<Link<'_>> {
    let body = s.strip_prefix('[')?;
    let close = body.find(']')?;
    let text = &body[..close];
    if text.is_empty() || text.contains('[') {
        return None;
    }
    let dest = body[close + 1..].strip_prefix('(')?;
    let end = dest.find(')')?;
    let inner = &dest[..end];

    // A placeholder here would be parked inside the tag and never restored.
    if inner.contains(MARK) {
        return None;
    }

    // Quotes were escaped to `&quot;` before we got here.
    let (url, title) = match inner.split_once(char::is_whitespace) {
        None => (inner, None),
        Some((url, tail)) => {
            let title = tail
                .trim()
                .strip_prefix("&quot;")
                .and_then(|t| t.strip_suffix("&quot;"))?;
            (url, Some(title))
        }
    };
    if url.is_empty() {
        return None;
    }
    Some(Link {
        text,
        url,
        title,
        len: 1 + close + 2 + end + 1,
    })
}

/// Browsers drop leading spaces and control characters from a URL, and
/// tabs and newlines anywhere in it, before looking at the scheme.
pub(super) fn normalize_url(url: &str) -> String {
    url.trim_start_matches(|c: char| c <= ' ')
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

/// The lowercased scheme of a normalized URL, or `None` for a relative one.
pub(super) fn url_scheme(url: &str) -> Option<String> {
    let (scheme, _) = url.split_once(':')?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| scheme.to_ascii_lowercase())
}

/// The href to emit for a link: relative, web and mail URLs only.
fn link_href(url: &str) -> String {
    let url = normalize_url(url);
    match url_scheme(&url).as_deref() {
        None | Some("http" | "https" | "mailto") => url,
        Some(_) => "#".to_string(),
    }
}

fn is_external(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn links(text: &str, stash: &mut Stash) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('[') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        let Some(link) = match_link(rest) else {
            out.push('[');
            rest = &rest[1..];
            continue;
        };

        let href = link_href(link.url);
        let mut open = format!("<a href=\"{href}\"");
        if let Some(title) = link.title {
            open.push_str(&format!(" title=\"{title}\""));
        }
        if is_external(&href) {
            open.push_str(" target=\"_blank\" rel=\"noopener noreferrer\"");
        }
        open.push('>');

        out.push_str(&stash.park(open));
        out.push_str(link.text);
        out.push_str(&stash.park("</a>".to_string()));
        rest = &rest[link.len..];
    }
    out.push_str(rest);
    out
}

/// Wrap `delim`-delimited, non-empty runs in `<tag>`. The closing delimiter
/// is the nearest one, as in a lazy `\*(.+?)\*`.
fn emphasis(text: &str, delim: &str, tag: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(delim) {
        out.push_str(&rest[..start]);
        let after = &rest[start + delim.len()..];
        let first = after.chars().next().map_or(0, char::len_utf8);
        let close = after[first..].find(delim).map(|i| i + first);
        match close {
            Some(end) if first > 0 => {
                out.push_str(&format!("<{tag}>{}</{tag}>", &after[..end]));
                rest = &after[end + delim.len()..];
            }
            _ => {
                // No partner here; retry one character further on.
                out.push('*');
                rest = &rest[start + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}
