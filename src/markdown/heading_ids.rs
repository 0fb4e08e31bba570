use std::collections::{HashMap, HashSet};

/// Allocates anchor ids for the headings of one document.
///
/// Use one allocator per render call and pass it by `&mut` into nested
/// renders (e.g., list item bodies) so ids stay unique across the document.
#[derive(Debug, Default)]
pub struct HeadingIds {
    counts: HashMap<String, usize>,
    issued: HashSet<String>,
    heading_index: usize,
}

impl HeadingIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the id for the next heading, given its raw (Markdown) text.
    pub fn allocate(&mut self, heading: &str) -> String {
        self.heading_index += 1;
        let mut base = slugify(&plain_text(heading));
        if base.is_empty() {
            base = format!("section-{}", self.heading_index);
        }

        let count = self.counts.entry(base.clone()).or_insert(0);
        *count += 1;
        let mut id = if *count == 1 {
            base.clone()
        } else {
            format!("{base}-{count}")
        };

        // A suffixed id can clash with a heading whose text already ended in
        // that suffix, e.g. "Intro", "Intro 2", "Intro".
        while self.issued.contains(&id) {
            *count += 1;
            id = format!("{base}-{count}");
        }
        self.issued.insert(id.clone());
        id
    }
}

/// Strip inline Markdown and HTML from heading text, leaving what a reader
/// would see.
pub fn plain_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        // `![alt](src)` and `[text](url)` both collapse to their label.
        let bracket = if rest.starts_with("![") {
            Some(2)
        } else if c == '[' {
            Some(1)
        } else {
            None
        };
        if let Some(skip) = bracket
            && let Some((label, len)) = bracketed_link(&rest[skip..])
        {
            out.push_str(label);
            rest = &rest[skip + len..];
            continue;
        }

        match c {
            '`' | '*' | '_' | '~' => {}
            '<' => {
                if let Some(end) = rest.find('>') {
                    rest = &rest[end + 1..];
                    continue;
                }
                out.push(c);
            }
            '&' => {
                if let Some(len) = entity_len(rest) {
                    out.push(' ');
                    rest = &rest[len..];
                    continue;
                }
                out.push(c);
            }
            _ => out.push(c),
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Match `label](target)` and return the label and the matched byte length.
fn bracketed_link(s: &str) -> Option<(&str, usize)> {
    let close = s.find(']')?;
    let after = s[close + 1..].strip_prefix('(')?;
    let end = after.find(')')?;
    Some((&s[..close], close + 2 + end + 1))
}

/// Length of an HTML entity like `&amp;` or `&#39;` at the start of `s`.
fn entity_len(s: &str) -> Option<usize> {
    let semi = s.find(';')?;
    let name = s[1..semi].strip_prefix('#').unwrap_or(&s[1..semi]);
    if !name.is_empty() && name.len() <= 32 && name.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(semi + 1)
    } else {
        None
    }
}

fn is_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '‘' | '’' | '“' | '”')
}

/// Turn plain text into a URL-safe base id: lowercase words joined by `-`.
pub fn slugify(text: &str) -> String {
    let mut spaced = String::with_capacity(text.len());
    let mut in_junk = false;
    for c in text.to_lowercase().chars().filter(|c| !is_quote(*c)) {
        if c.is_alphanumeric() || c == '-' || c.is_whitespace() {
            spaced.push(c);
            in_junk = false;
        } else if !in_junk {
            spaced.push(' ');
            in_junk = true;
        }
    }

    spaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple() {
        assert_eq!(HeadingIds::new().allocate("Hello World"), "hello-world");
    }

    #[test]
    fn duplicates() {
        let mut ids = HeadingIds::new();
        assert_eq!(ids.allocate("Intro"), "intro");
        assert_eq!(ids.allocate("Intro"), "intro-2");
        assert_eq!(ids.allocate("intro"), "intro-3");
    }

    #[test]
    fn suffix_collision() {
        let mut ids = HeadingIds::new();
        assert_eq!(ids.allocate("Intro 2"), "intro-2");
        assert_eq!(ids.allocate("Intro"), "intro");
        assert_eq!(ids.allocate("Intro"), "intro-3");
    }

    #[test]
    fn inline_markup() {
        let mut ids = HeadingIds::new();
        assert_eq!(
            ids.allocate("Using `render` with [links](http://x.org) and **bold**"),
            "using-render-with-links-and-bold"
        );
    }

    #[test]
    fn punctuation_and_quotes() {
        let mut ids = HeadingIds::new();
        assert_eq!(ids.allocate("What's new?"), "whats-new");
        assert_eq!(ids.allocate("a / b"), "a-b");
        assert_eq!(ids.allocate("pre-release"), "pre-release");
    }

    #[test]
    fn entities_and_tags() {
        assert_eq!(plain_text("Tom &amp; <em>Jerry</em>"), "Tom   Jerry");
        assert_eq!(HeadingIds::new().allocate("Tom &amp; Jerry"), "tom-jerry");
    }

    #[test]
    fn non_ascii() {
        assert_eq!(HeadingIds::new().allocate("产品 决策"), "产品-决策");
    }

    #[test]
    fn empty_falls_back_to_index() {
        let mut ids = HeadingIds::new();
        assert_eq!(ids.allocate("First"), "first");
        assert_eq!(ids.allocate("???"), "section-2");
    }

    #[test]
    fn image_alt() {
        assert_eq!(plain_text("![Logo](logo.png) Title"), "Logo Title");
    }
}
