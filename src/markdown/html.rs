use super::blocks::{Block, ListItem};
use super::inline::escape_html;

/// Append the HTML for a sequence of blocks to `buf`.
pub fn push_html(buf: &mut String, blocks: &[Block]) {
    for block in blocks {
        push_block(buf, block);
    }
}

fn push_block(buf: &mut String, block: &Block) {
    match block {
        Block::Heading { level, id, html } => {
            buf.push_str(&format!("<h{level} id=\"{}\">{html}</h{level}>\n", escape_html(id)));
        }
        Block::Code {
            raw,
            highlighted,
            language,
        } => {
            let label = escape_html(language.as_deref().unwrap_or("code"));
            let class = match language {
                Some(lang) => format!(" class=\"language-{}\"", escape_html(lang)),
                None => String::new(),
            };
            // The copy button copies `data-code`, the source before highlighting.
            buf.push_str(&format!(
                "<div class=\"code-block\" data-code=\"{}\">\n",
                escape_html(raw)
            ));
            buf.push_str(&format!(
                "<div class=\"code-header\"><span>{label}</span>\
                 <button type=\"button\" class=\"copy-button\">Copy</button></div>\n"
            ));
            buf.push_str(&format!("<pre><code{class}>{highlighted}</code></pre>\n</div>\n"));
        }
        Block::List { ordered, items } => {
            let tag = if *ordered { "ol" } else { "ul" };
            buf.push_str(&format!("<{tag}>\n"));
            for item in items {
                push_item(buf, item);
            }
            buf.push_str(&format!("</{tag}>\n"));
        }
        Block::Table { header, rows } => {
            buf.push_str("<table>\n<thead>\n<tr>");
            for cell in header {
                buf.push_str(&format!("<th>{cell}</th>"));
            }
            buf.push_str("</tr>\n</thead>\n");
            if !rows.is_empty() {
                buf.push_str("<tbody>\n");
                for row in rows {
                    buf.push_str("<tr>");
                    for cell in row {
                        buf.push_str(&format!("<td>{cell}</td>"));
                    }
                    buf.push_str("</tr>\n");
                }
                buf.push_str("</tbody>\n");
            }
            buf.push_str("</table>\n");
        }
        Block::Image { src, alt, title } => {
            buf.push_str(&format!(
                "<figure>\n<img src=\"{}\" alt=\"{}\" loading=\"lazy\"",
                escape_html(src),
                escape_html(alt)
            ));
            match title {
                Some(title) => {
                    let title = escape_html(title);
                    buf.push_str(&format!(
                        " title=\"{title}\">\n<figcaption>{title}</figcaption>\n</figure>\n"
                    ));
                }
                None => buf.push_str(">\n</figure>\n"),
            }
        }
        Block::Paragraph { html } => {
            buf.push_str(&format!("<p>{html}</p>\n"));
        }
    }
}

fn push_item(buf: &mut String, item: &ListItem) {
    buf.push_str("<li>");
    buf.push_str(&item.html);
    if !item.children.is_empty() {
        buf.push('\n');
        push_html(buf, &item.children);
    }
    buf.push_str("</li>\n");
}
