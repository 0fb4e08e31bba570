//! File-backed post storage: one `<slug>.md` file per post.

use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ContentStore {
    pub blog_dir: PathBuf,
}

impl ContentStore {
    pub fn new(blog_dir: impl Into<PathBuf>) -> Self {
        Self {
            blog_dir: blog_dir.into(),
        }
    }

    /// The source file for a slug, or `None` if the slug could name something
    /// outside the blog directory or a hidden file.
    pub fn post_path(&self, slug: &str) -> Option<PathBuf> {
        if !is_valid_slug(slug) {
            return None;
        }
        Some(self.blog_dir.join(format!("{slug}.md")))
    }

    /// The post's Markdown with any front matter removed. `None` when there is
    /// no such post or it can't be read.
    pub fn markdown_body(&self, slug: &str) -> Option<String> {
        let path = self.post_path(slug)?;
        match fs::read_to_string(&path) {
            Ok(source) => Some(strip_front_matter(&source).to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("could not read {}: {e}", path.display());
                None
            }
        }
    }

    /// All post slugs, sorted.
    pub fn slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = WalkDir::new(&self.blog_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("directory walk error: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && !ignore_filename(entry.file_name()))
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension()? != "md" {
                    return None;
                }
                let slug = path.file_stem()?.to_str()?;
                is_valid_slug(slug).then(|| slug.to_string())
            })
            .collect();
        slugs.sort();
        slugs
    }
}

/// Should we skip a given file? We skip hidden files (prefixed with .) and
/// ones starting with _, which are special.
pub fn ignore_filename(name: &OsStr) -> bool {
    let bytes = name.as_encoded_bytes();
    (bytes != b"." && bytes.starts_with(b".")) || bytes.starts_with(b"_")
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with(['.', '_'])
        && slug
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Drop a leading `---` … `---` block. An unterminated block is left alone.
pub fn strip_front_matter(source: &str) -> &str {
    let Some(rest) = source
        .strip_prefix("---\n")
        .or_else(|| source.strip_prefix("---\r\n"))
    else {
        return source;
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        if line.trim_end() == "---" {
            return &rest[offset..];
        }
    }
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ContentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn front_matter() {
        assert_eq!(strip_front_matter("---\ntitle: x\n---\n# Body\n"), "# Body\n");
        assert_eq!(strip_front_matter("---\r\na: 1\r\n---\r\nbody"), "body");
        assert_eq!(strip_front_matter("# No front matter"), "# No front matter");
        assert_eq!(strip_front_matter("---\nnever closed"), "---\nnever closed");
        assert_eq!(strip_front_matter("---\n---"), "");
    }

    #[test]
    fn reads_body() {
        let (dir, store) = store();
        fs::write(dir.path().join("hello.md"), "---\ndate: 2026\n---\nHi").unwrap();
        assert_eq!(store.markdown_body("hello").as_deref(), Some("Hi"));
        assert_eq!(store.markdown_body("missing"), None);
    }

    #[test]
    fn rejects_unsafe_slugs() {
        let (_dir, store) = store();
        assert_eq!(store.post_path("../secret"), None);
        assert_eq!(store.post_path("a/b"), None);
        assert_eq!(store.post_path("_draft"), None);
        assert_eq!(store.post_path(""), None);
        assert!(store.post_path("my-post").is_some());
    }

    #[test]
    fn lists_slugs() {
        let (dir, store) = store();
        for name in ["b.md", "a.md", "_draft.md", ".hidden.md", "notes.txt"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        fs::create_dir(dir.path().join("sub.md")).unwrap();
        assert_eq!(store.slugs(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn ignored_names() {
        assert!(ignore_filename(OsStr::new(".git")));
        assert!(ignore_filename(OsStr::new("_config.toml")));
        assert!(!ignore_filename(OsStr::new(".")));
        assert!(!ignore_filename(OsStr::new("post.md")));
    }
}
