use anyhow::{Result, bail};
use argh::FromArgs;
use folio::{Config, Context, markdown, parallel, serve};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// A static site generator for a Markdown blog.
#[derive(FromArgs)]
struct Args {
    /// site root directory
    #[argh(option, default = "PathBuf::from(\".\")")]
    root: PathBuf,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Build(Build),
    Serve(Serve),
    Toc(Toc),
}

/// render the whole site to a directory
#[derive(FromArgs)]
#[argh(subcommand, name = "build")]
struct Build {
    /// output directory
    #[argh(option, short = 'o', default = "PathBuf::from(\"_site\")")]
    dest: PathBuf,

    /// number of rendering threads (default: one per core)
    #[argh(option, short = 'j')]
    threads: Option<usize>,
}

/// serve the site with live reload
#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
struct Serve {
    /// port to listen on
    #[argh(option, short = 'p', default = "3000")]
    port: u16,
}

/// print a post's table of contents
#[derive(FromArgs)]
#[argh(subcommand, name = "toc")]
struct Toc {
    /// the post's slug
    #[argh(positional)]
    slug: String,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn context(root: &Path, livereload: bool) -> Result<Context> {
    let config = Config::load(root)?;
    Context::new(root, livereload, config)
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    init_logging();

    match args.command {
        Command::Build(build) => {
            let ctx = context(&args.root, false)?;
            let threads = build.threads.unwrap_or_else(parallel::default_threads);
            ctx.render_site(threads, &build.dest)?;
            info!("site written to {}", build.dest.display());
        }
        Command::Serve(opts) => {
            let ctx = context(&args.root, true)?;
            serve::serve(ctx, opts.port)?;
        }
        Command::Toc(toc) => {
            let ctx = context(&args.root, false)?;
            let Some(body) = ctx.store.markdown_body(&toc.slug) else {
                bail!("no post named {:?}", toc.slug);
            };
            for heading in markdown::extract_table_of_contents(&body) {
                println!("{} {} {}", heading.level, heading.id, heading.text);
            }
        }
    }
    Ok(())
}
