use crate::site::{Context, SiteError};
use crate::watch::Watch;
use anyhow::Context as _;
use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse, Response, sse},
    routing::get,
};
use axum_extra::body::AsyncReadBody;
use std::convert::Infallible;
use std::path;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::fs;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info};

type HandlerResult = Result<Response, (StatusCode, String)>;

#[derive(Clone)]
struct AppState {
    ctx: Arc<RwLock<Context>>,
    watch: Arc<Watch>,
}

#[tokio::main]
pub async fn serve(ctx: Context, port: u16) -> anyhow::Result<()> {
    // Watch the posts, the static files and, in debug mode, the templates.
    let watch = Watch::new(&[
        ctx.store.blog_dir.clone(),
        ctx.public_dir(),
        #[cfg(debug_assertions)]
        path::PathBuf::from(crate::site::TEMPLATES.dir),
    ])
    .context("starting file watcher")?;
    let state = AppState {
        ctx: Arc::new(RwLock::new(ctx)),
        watch: Arc::new(watch),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/blog/{name}", get(blog))
        .route("/style.css", get(stylesheet))
        .route("/livereload.js", get(livereload))
        .route("/_notify", get(notify))
        .fallback(static_file)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("binding port {port}"))?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

fn poisoned<T>(_: PoisonError<T>) -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "site state is poisoned".into(),
    )
}

fn render_error(e: anyhow::Error) -> (StatusCode, String) {
    match e.downcast_ref::<SiteError>() {
        Some(SiteError::PostNotFound(_)) => (StatusCode::NOT_FOUND, format!("{e}")),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("rendering failed: {e:#}"),
        ),
    }
}

/// Render an HTML page with the site context. The lock is only held for the
/// duration of the (synchronous) render.
fn render_page<F>(state: &AppState, render: F) -> HandlerResult
where
    F: FnOnce(&Context, &mut Vec<u8>) -> anyhow::Result<()>,
{
    // In debug mode, reload templates before rendering.
    #[cfg(debug_assertions)]
    state
        .ctx
        .write()
        .map_err(poisoned)?
        .reload_templates()
        .map_err(render_error)?;

    let ctx = state.ctx.read().map_err(poisoned)?;
    let mut buf: Vec<u8> = vec![];
    render(&ctx, &mut buf).map_err(render_error)?;
    Ok(Html(buf).into_response())
}

/// Respond with the contents of a file on the filesystem.
async fn send_file(path: &path::Path) -> HandlerResult {
    let mime = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(mime_guess::mime::OCTET_STREAM.as_str());

    let file = fs::File::open(path)
        .await
        .map_err(|e| (StatusCode::NOT_FOUND, format!("not found: {e}")))?;

    let headers = [(header::CONTENT_TYPE, mime)];
    let body = AsyncReadBody::new(file);
    Ok((headers, body).into_response())
}

/// Serve a file from the public directory.
async fn send_static(state: &AppState, rel_path: &str) -> HandlerResult {
    let found = state.ctx.read().map_err(poisoned)?.resolve_static(rel_path);
    match found {
        Some(path) => send_file(&path).await,
        None => Err((StatusCode::NOT_FOUND, "not found".into())),
    }
}

/// Send one of the built-in assets.
fn send_asset(state: &AppState, name: &'static str, mime: &'static str) -> HandlerResult {
    let body = state
        .ctx
        .read()
        .map_err(poisoned)?
        .asset(name)
        .map_err(render_error)?;
    Ok(([(header::CONTENT_TYPE, mime)], body).into_response())
}

async fn index(State(state): State<AppState>) -> HandlerResult {
    debug!("GET /");
    render_page(&state, |ctx, buf| ctx.render_index(buf))
}

/// A post, addressed with or without `.html`, or a file under `public/blog/`.
async fn blog(State(state): State<AppState>, Path(name): Path<String>) -> HandlerResult {
    debug!("GET /blog/{name}");
    let slug = name.strip_suffix(".html").unwrap_or(&name);
    let is_post = state
        .ctx
        .read()
        .map_err(poisoned)?
        .store
        .post_path(slug)
        .is_some_and(|p| p.is_file());

    if is_post {
        render_page(&state, |ctx, buf| ctx.render_post(slug, buf))
    } else if name.ends_with(".html") || !name.contains('.') {
        Err((StatusCode::NOT_FOUND, format!("no post named {slug:?}")))
    } else {
        send_static(&state, &format!("blog/{name}")).await
    }
}

async fn stylesheet(State(state): State<AppState>) -> HandlerResult {
    send_asset(&state, "style.css", "text/css")
}

async fn livereload(State(state): State<AppState>) -> HandlerResult {
    send_asset(&state, "livereload.js", "text/javascript")
}

async fn static_file(State(state): State<AppState>, uri: Uri) -> HandlerResult {
    debug!("GET {}", uri.path());
    send_static(&state, uri.path()).await
}

/// Server-Sent Events endpoint for getting change notifications.
async fn notify(
    State(state): State<AppState>,
) -> sse::Sse<impl Stream<Item = Result<sse::Event, Infallible>>> {
    let stream = state.watch.stream().map(|_| {
        debug!("sending reload event");
        Ok(sse::Event::default().event("reload").data("_"))
    });
    sse::Sse::new(stream)
}
