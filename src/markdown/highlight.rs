//! A tiny syntax highlighter for Python code blocks. Every other language is
//! only escaped.

use super::inline::escape_html;
use std::iter::Peekable;
use std::str::CharIndices;

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    String,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub value: &'a str,
}

pub fn is_python(language: Option<&str>) -> bool {
    matches!(language, Some("py" | "python" | "python3"))
}

/// Highlight `code` as HTML for the given fence language.
pub fn highlight(code: &str, language: Option<&str>) -> String {
    if !is_python(language) {
        return escape_html(code);
    }

    let mut out = String::with_capacity(code.len() * 2);
    for token in tokenize_python(code) {
        match token.kind {
            TokenKind::Text => highlight_text(token.value, &mut out),
            TokenKind::String => push_span(&mut out, "tok-string", token.value),
            TokenKind::Comment => push_span(&mut out, "tok-comment", token.value),
        }
    }
    out
}

fn push_span(out: &mut String, class: &str, value: &str) {
    out.push_str("<span class=\"");
    out.push_str(class);
    out.push_str("\">");
    out.push_str(&escape_html(value));
    out.push_str("</span>");
}

/// Split Python source into comments, string literals, and everything else.
pub fn tokenize_python(code: &str) -> Vec<Token<'_>> {
    let bytes = code.as_bytes();
    let mut tokens = vec![];
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let span = if bytes[i] == b'#' {
            let end = code[i..].find('\n').map_or(bytes.len(), |n| i + n);
            Some((TokenKind::Comment, end))
        } else {
            string_end(bytes, i).map(|end| (TokenKind::String, end))
        };

        match span {
            Some((kind, end)) => {
                push_text(&mut tokens, &code[text_start..i]);
                tokens.push(Token {
                    kind,
                    value: &code[i..end],
                });
                i = end;
                text_start = end;
            }
            None => i += 1,
        }
    }
    push_text(&mut tokens, &code[text_start..]);
    tokens
}

fn push_text<'a>(tokens: &mut Vec<Token<'a>>, value: &'a str) {
    if !value.is_empty() {
        tokens.push(Token {
            kind: TokenKind::Text,
            value,
        });
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

/// If a string literal (with an optional `rubf` prefix) starts at `start`,
/// return the byte offset just past it.
fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start;
    while i < start + 2 && i < bytes.len() && b"rRuUbBfF".contains(&bytes[i]) {
        i += 1;
    }
    // A prefix must start a word: `buf'x'` is not a `uf` string.
    if i > start && start > 0 && is_ident_byte(bytes[start - 1]) {
        return None;
    }
    let quote = *bytes.get(i)?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let triple = [quote; 3];
    if bytes[i..].starts_with(&triple) {
        let mut k = i + 3;
        while k < bytes.len() {
            if bytes[k] == b'\\' {
                k += 2;
            } else if bytes[k..].starts_with(&triple) {
                return Some(k + 3);
            } else {
                k += 1;
            }
        }
        return Some(bytes.len());
    }

    let mut k = i + 1;
    while k < bytes.len() {
        match bytes[k] {
            b'\\' => k += 2,
            b'\n' => return Some(k),
            b if b == quote => return Some(k + 1),
            _ => k += 1,
        }
    }
    Some(bytes.len())
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Advance `chars` past every character matching `f`, moving `end` along.
fn take_while(chars: &mut Peekable<CharIndices<'_>>, end: &mut usize, f: impl Fn(char) -> bool) {
    while let Some(&(i, n)) = chars.peek() {
        if !f(n) {
            break;
        }
        *end = i + n.len_utf8();
        chars.next();
    }
}

/// Highlight decorators, numbers, and keywords within plain code.
fn highlight_text(text: &str, out: &mut String) {
    let mut chars = text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        let mut end = start + c.len_utf8();

        if c == '@' && text[end..].starts_with(is_ident_start) {
            take_while(&mut chars, &mut end, |n| is_ident_char(n) || n == '.');
            push_span(out, "tok-decorator", &text[start..end]);
        } else if is_ident_start(c) {
            take_while(&mut chars, &mut end, is_ident_char);
            let word = &text[start..end];
            if PYTHON_KEYWORDS.contains(&word) {
                push_span(out, "tok-keyword", word);
            } else {
                out.push_str(&escape_html(word));
            }
        } else if c.is_ascii_digit() {
            take_while(&mut chars, &mut end, |n| n.is_ascii_digit());
            let rest = &text[end..];
            if rest.starts_with('.') && rest[1..].starts_with(|n: char| n.is_ascii_digit()) {
                end += 1;
                chars.next();
                take_while(&mut chars, &mut end, |n| n.is_ascii_digit());
            }
            push_span(out, "tok-number", &text[start..end]);
        } else {
            out.push_str(&escape_html(&text[start..end]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(code: &str) -> Vec<(TokenKind, &str)> {
        tokenize_python(code)
            .into_iter()
            .map(|t| (t.kind, t.value))
            .collect()
    }

    #[test]
    fn comment_and_assignment() {
        assert_eq!(
            highlight("# comment\nx = 1", Some("py")),
            "<span class=\"tok-comment\"># comment</span>\n\
             x = <span class=\"tok-number\">1</span>"
        );
    }

    #[test]
    fn other_languages_are_escaped_only() {
        assert_eq!(highlight("if a < b: pass", Some("rust")), "if a &lt; b: pass");
        assert_eq!(highlight("def f(): pass", None), "def f(): pass");
    }

    #[test]
    fn keywords_and_decorators() {
        assert_eq!(
            highlight("@app.route\ndef f(): return None", Some("python")),
            "<span class=\"tok-decorator\">@app.route</span>\n\
             <span class=\"tok-keyword\">def</span> f(): \
             <span class=\"tok-keyword\">return</span> \
             <span class=\"tok-keyword\">None</span>"
        );
    }

    #[test]
    fn identifiers_with_digits_are_not_numbers() {
        assert_eq!(
            highlight("x1 = 2.5", Some("py")),
            "x1 = <span class=\"tok-number\">2.5</span>"
        );
    }

    #[test]
    fn prefixed_strings() {
        assert_eq!(
            kinds("print(f\"hi {x}\", rb'\\x00')"),
            vec![
                (TokenKind::Text, "print("),
                (TokenKind::String, "f\"hi {x}\""),
                (TokenKind::Text, ", "),
                (TokenKind::String, "rb'\\x00'"),
                (TokenKind::Text, ")"),
            ]
        );
    }

    #[test]
    fn hash_inside_string_is_not_a_comment() {
        assert_eq!(
            kinds("s = '#no' # yes"),
            vec![
                (TokenKind::Text, "s = "),
                (TokenKind::String, "'#no'"),
                (TokenKind::Text, " "),
                (TokenKind::Comment, "# yes"),
            ]
        );
    }

    #[test]
    fn escaped_quote() {
        assert_eq!(
            kinds(r#""a\"b" c"#),
            vec![(TokenKind::String, r#""a\"b""#), (TokenKind::Text, " c")]
        );
    }

    #[test]
    fn triple_quoted_spans_lines() {
        assert_eq!(
            kinds("'''doc\nstring''' + 1"),
            vec![
                (TokenKind::String, "'''doc\nstring'''"),
                (TokenKind::Text, " + 1"),
            ]
        );
    }

    #[test]
    fn unterminated_strings() {
        assert_eq!(
            kinds("'open\nx"),
            vec![(TokenKind::String, "'open"), (TokenKind::Text, "\nx")]
        );
        assert_eq!(
            kinds("\"\"\"never closed\n"),
            vec![(TokenKind::String, "\"\"\"never closed\n")]
        );
    }

    #[test]
    fn prefix_letters_inside_identifiers() {
        assert_eq!(
            kinds("buf'x'"),
            vec![(TokenKind::Text, "buf"), (TokenKind::String, "'x'")]
        );
    }

    #[test]
    fn markup_in_code_is_escaped() {
        assert_eq!(
            highlight("s = '<b>'", Some("py")),
            "s = <span class=\"tok-string\">&#39;&lt;b&gt;&#39;</span>"
        );
    }
}
