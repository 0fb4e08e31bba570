use crate::assets::assets;
use crate::config::Config;
use crate::content::{ContentStore, ignore_filename};
use crate::markdown::{self, AssetDir};
use crate::{git, parallel};
use anyhow::{Context as _, Result};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::{fs, io};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

assets!(
    TEMPLATES,
    "templates",
    ["post.html", "index.html", "style.css", "livereload.js"]
);

#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("no post named {0:?}")]
    PostNotFound(String),
    #[error("template asset {0:?} is missing")]
    MissingAsset(&'static str),
}

pub struct Context {
    pub root: PathBuf,
    pub livereload: bool,
    pub config: Config,
    pub store: ContentStore,
    tmpls: minijinja::Environment<'static>,
}

/// What the index page knows about each post.
#[derive(Debug, Serialize)]
struct PostSummary {
    slug: String,
    title: String,
}

impl Context {
    pub fn new(root: &Path, livereload: bool, config: Config) -> Result<Self> {
        let mut ctx = Self {
            root: root.into(),
            store: ContentStore::new(root.join(&config.content_dir)),
            tmpls: minijinja::Environment::new(),
            livereload,
            config,
        };
        ctx.reload_templates()?;
        Ok(ctx)
    }

    /// (Re-)register all templates. In debug builds this re-reads them from
    /// the filesystem.
    pub fn reload_templates(&mut self) -> Result<()> {
        self.tmpls.clear_templates();
        for (name, source) in TEMPLATES.load_all().context("reading templates")? {
            self.tmpls
                .add_template_owned(name, source.into_owned())
                .with_context(|| format!("error in template {name}"))?;
        }
        Ok(())
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root.join(&self.config.public_dir)
    }

    /// The directory images referenced from posts are looked up in.
    fn blog_assets(&self) -> AssetDir {
        AssetDir::new(self.public_dir().join("blog"))
    }

    /// Render the HTML page for a post.
    pub fn render_post<W: io::Write>(&self, slug: &str, dest: &mut W) -> Result<()> {
        let body = self
            .store
            .markdown_body(slug)
            .ok_or_else(|| SiteError::PostNotFound(slug.to_string()))?;
        let (html, toc) = markdown::render(&body, Some(slug), &self.blog_assets());
        let title = markdown::document_title(&body).unwrap_or_else(|| slug.to_string());
        debug!(slug, headings = toc.len(), "rendered post body");

        // Commit and edit-link info refer to the source file.
        let src_path = self.store.post_path(slug);
        let rel_src = src_path
            .as_deref()
            .and_then(|p| p.strip_prefix(&self.root).ok());
        let commit = rel_src.and_then(|p| git::last_commit(&self.root, p));
        let rel_path = rel_src.map(|p| p.to_string_lossy().into_owned());
        let edit_link = match (&self.config.edit_link_prefix, &rel_path) {
            (Some(prefix), Some(rel)) => Some(format!("{prefix}{rel}")),
            _ => None,
        };

        let tmpl = self.tmpls.get_template("post.html")?;
        tmpl.render_to_write(
            minijinja::context! {
                site => self.config.title,
                author => self.config.author,
                title => title,
                slug => slug,
                body => html,
                toc => toc,
                livereload => self.livereload,
                git => commit,
                path => rel_path,
                edit_link => edit_link,
            },
            dest,
        )?;
        Ok(())
    }

    /// Render the list of all posts.
    pub fn render_index<W: io::Write>(&self, dest: &mut W) -> Result<()> {
        let posts: Vec<PostSummary> = self
            .store
            .slugs()
            .into_iter()
            .map(|slug| {
                let title = self
                    .store
                    .markdown_body(&slug)
                    .and_then(|body| markdown::document_title(&body))
                    .unwrap_or_else(|| slug.clone());
                PostSummary { slug, title }
            })
            .collect();

        let tmpl = self.tmpls.get_template("index.html")?;
        tmpl.render_to_write(
            minijinja::context! {
                site => self.config.title,
                author => self.config.author,
                posts => posts,
                livereload => self.livereload,
            },
            dest,
        )?;
        Ok(())
    }

    /// Get the contents of a static template asset such as `style.css`.
    pub fn asset(&self, name: &'static str) -> Result<String> {
        Ok(TEMPLATES
            .load(name)?
            .ok_or(SiteError::MissingAsset(name))?
            .into_owned())
    }

    fn render_post_to_file(&self, slug: &str, dest_path: &Path) -> Result<()> {
        let mut out_file = fs::File::create(dest_path)?;
        self.render_post(slug, &mut out_file)
    }

    /// Render the whole site into `dest_dir`, replacing whatever was there.
    pub fn render_site(&self, threads: usize, dest_dir: &Path) -> Result<()> {
        remove_dir_force(dest_dir)?;
        fs::create_dir_all(dest_dir.join("blog"))?;

        self.mirror_public(dest_dir)?;
        fs::write(dest_dir.join("style.css"), self.asset("style.css")?)?;
        self.render_index(&mut fs::File::create(dest_dir.join("index.html"))?)?;

        let slugs = self.store.slugs();
        info!("rendering {} posts on {} threads", slugs.len(), threads);
        parallel::run_pool(
            threads,
            32,
            |slug: String| {
                let dest_path = dest_dir.join("blog").join(format!("{slug}.html"));
                match self.render_post_to_file(&slug, &dest_path) {
                    Ok(()) => debug!("wrote {}", dest_path.display()),
                    Err(e) => error!("error rendering post {slug}: {e:#}"),
                }
            },
            |pool| {
                for slug in slugs {
                    if pool.send(slug).is_err() {
                        break;
                    }
                }
            },
        );
        Ok(())
    }

    /// Copy the public directory into `dest_dir`, skipping hidden and special
    /// files.
    fn mirror_public(&self, dest_dir: &Path) -> Result<()> {
        let public = self.public_dir();
        if !public.is_dir() {
            warn!("no public directory at {}", public.display());
            return Ok(());
        }

        let walk = WalkDir::new(&public)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| !ignore_filename(e.file_name()));
        for entry in walk {
            let entry = entry?;
            let rel = entry
                .path()
                .strip_prefix(&public)
                .context("walked outside the public directory")?;
            let target = dest_dir.join(rel);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)?;
            } else if entry.file_type().is_file() {
                hard_link_or_copy(entry.path(), &target)?;
            }
        }
        Ok(())
    }

    /// Map a request path onto a file in the public directory, if one exists.
    pub fn resolve_static(&self, rel_path: &str) -> Option<PathBuf> {
        let path = self.public_dir().join(sanitize_path(rel_path)?);
        path.is_file().then_some(path)
    }
}

/// Try to hard-link `from` at `to`, falling back to a copy if the link fails
/// (e.g., the two paths are on different filesystems). This always removes the
/// current file at `to`.
fn hard_link_or_copy(from: &Path, to: &Path) -> io::Result<Option<u64>> {
    if to.exists() {
        fs::remove_file(to)?;
    }
    match fs::hard_link(from, to) {
        Ok(_) => Ok(None),
        Err(_) => fs::copy(from, to).map(Some),
    }
}

/// Like `std::fs::remove_dir_all`, but silently succeed if the directory already doesn't exist.
fn remove_dir_force(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Validate and relative-ize a requested path. If we return a path, it is now
/// safe to `join` with a base directory without "escaping" that directory. May
/// return `None` for any disallowed path.
fn sanitize_path(path: &str) -> Option<PathBuf> {
    let mut path_buf = PathBuf::new();
    for comp in Path::new(path).components() {
        match comp {
            Component::Normal(c) if ignore_filename(c) => return None,
            Component::Normal(c) => path_buf.push(c),
            Component::ParentDir => return None, // Disallow `..`.
            Component::Prefix(_) => return None, // Disallow `C:`.
            Component::RootDir | Component::CurDir => (),
        }
    }
    Some(path_buf)
}
