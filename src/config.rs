use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Site settings, read from `_config.toml` at the site root.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Site name shown in page titles and the header.
    pub title: String,
    pub author: Option<String>,
    /// Prepended to a post's path (relative to the root) to link to its
    /// source, e.g. `https://github.com/me/site/edit/main/`.
    pub edit_link_prefix: Option<String>,
    /// Directory holding `<slug>.md` posts, relative to the root.
    pub content_dir: PathBuf,
    /// Directory of static files copied to the output as-is. Post images live
    /// in its `blog/` subdirectory.
    pub public_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "folio".to_string(),
            author: None,
            edit_link_prefix: None,
            content_dir: PathBuf::from("content/blog"),
            public_dir: PathBuf::from("public"),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join("_config.toml");
        match fs::read_to_string(&path) {
            // Silently proceed if the file isn't found, but fail on other errors.
            Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
            Ok(s) => Self::parse(&s).with_context(|| format!("parsing {}", path.display())),
        }
    }

    pub fn parse(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }
}
