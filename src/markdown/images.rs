use super::inline::{normalize_url, url_scheme};
use std::path::PathBuf;

/// URL prefix under which blog assets are served.
pub const BLOG_ASSET_PREFIX: &str = "/blog/";

/// Extensions tried for a cover image named after the post's slug.
const SLUG_IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".webp", ".avif", ".gif"];

/// Read-only lookup of blog asset files by path relative to the blog asset
/// directory.
pub trait AssetProbe {
    fn exists(&self, rel_path: &str) -> bool;
}

/// Probe files in a real directory (normally `<public>/blog`).
#[derive(Debug, Clone)]
pub struct AssetDir {
    pub root: PathBuf,
}

impl AssetDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetProbe for AssetDir {
    fn exists(&self, rel_path: &str) -> bool {
        self.root.join(rel_path).is_file()
    }
}

/// A probe that never finds anything, so every relative image falls back to
/// its cleaned path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetProbe for NoAssets {
    fn exists(&self, _rel_path: &str) -> bool {
        false
    }
}

/// Drop leading `./`, `../`, and `/` segments, then a leading `blog/`.
fn clean_relative(src: &str) -> &str {
    let mut rel = src;
    loop {
        if let Some(rest) = rel.strip_prefix("./") {
            rel = rest;
        } else if let Some(rest) = rel.strip_prefix("../") {
            rel = rest;
        } else if let Some(rest) = rel.strip_prefix('/') {
            rel = rest;
        } else {
            break;
        }
    }
    rel.strip_prefix("blog/").unwrap_or(rel)
}

/// Turn the `src` of a Markdown image into a path the site can serve.
///
/// Relative sources are looked up in the blog asset directory, first as
/// written, then by file name alone, then (given a slug) as `<slug>.<ext>`.
/// If nothing is found the cleaned path is returned anyway, so a broken
/// image shows up on the page rather than disappearing.
pub fn resolve_image_src(src: &str, slug: Option<&str>, assets: &dyn AssetProbe) -> String {
    let src = normalize_url(src.trim());
    if src.is_empty() {
        return "#".to_string();
    }
    // Web and inline images load as-is; any other scheme is dropped.
    match url_scheme(&src).as_deref() {
        Some("http" | "https" | "data") => return src,
        Some(_) => return "#".to_string(),
        None if src.starts_with('/') => return src,
        None => {}
    }

    let rel = clean_relative(&src);
    if rel.is_empty() {
        return "#".to_string();
    }

    let file_name = rel.rsplit('/').next().unwrap_or(rel);
    let mut candidates = vec![rel.to_string()];
    if file_name != rel {
        candidates.push(file_name.to_string());
    }
    if let Some(slug) = slug.filter(|s| !s.is_empty()) {
        candidates.extend(SLUG_IMAGE_EXTENSIONS.iter().map(|ext| format!("{slug}{ext}")));
    }

    let found = candidates.into_iter().find(|c| assets.exists(c));
    format!("{BLOG_ASSET_PREFIX}{}", found.as_deref().unwrap_or(rel))
}
