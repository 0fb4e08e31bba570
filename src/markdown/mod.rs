//! A small Markdown renderer for blog posts.
//!
//! Rendering produces typed [`Block`]s rather than a string so that pages can
//! lay them out as they like; [`html::push_html`] is the plain HTML rendition.

mod blocks;
mod heading_ids;
mod highlight;
pub mod html;
mod images;
mod inline;
mod lines;
mod toc;

pub use blocks::{Block, ListItem};
pub use heading_ids::HeadingIds;
pub use highlight::highlight;
pub use images::{AssetDir, AssetProbe, NoAssets, resolve_image_src};
pub use inline::{escape_html, render_inline};
pub use toc::{TocHeading, document_title, extract_table_of_contents};

use blocks::render_document;

/// Render a post body into blocks. `slug` is only used to find images named
/// after the post.
pub fn render_markdown(markdown: &str, slug: Option<&str>, assets: &dyn AssetProbe) -> Vec<Block> {
    render_document(markdown, slug, assets).0
}

/// Render a post body straight to HTML, along with its table of contents.
pub fn render(markdown: &str, slug: Option<&str>, assets: &dyn AssetProbe) -> (String, Vec<TocHeading>) {
    let (blocks, headings) = render_document(markdown, slug, assets);
    let mut buf = String::new();
    html::push_html(&mut buf, &blocks);
    (buf, toc::table_of_contents(headings))
}
