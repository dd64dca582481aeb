//! HTTP layer serving stored documents as rendered HTML.
//!
//! Two routes: `/` redirects to the first section, `/sections/{name}` renders
//! a stored document inside a layout with a navigation sidebar of every
//! document. The server holds a read-only storage handle; the importer is the
//! sole writer.

use std::sync::Arc;

use axum::Extension;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use docshelf_shared::{DocshelfError, Result};
use docshelf_storage::Storage;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    storage: Arc<Storage>,
}

impl AppState {
    /// Create server state over a storage handle.
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_root))
        .route("/sections/{name}", get(get_section))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

/// Serve the router on `listener` until `cancel` fires.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    cancel: CancellationToken,
) -> Result<()> {
    let addr = listener
        .local_addr()
        .map_err(|e| DocshelfError::Server(e.to_string()))?;
    info!(%addr, "serving documentation");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| DocshelfError::Server(e.to_string()))?;

    info!("server stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /` — redirect to the first stored section.
async fn get_root(Extension(state): Extension<AppState>) -> Response {
    let names = match state.storage.list_document_names().await {
        Ok(names) => names,
        Err(e) => {
            error!(error = %e, "failed to list documents");
            return internal_error();
        }
    };

    match names.first() {
        Some(first) => Redirect::to(&format!("/sections/{first}")).into_response(),
        None => not_found("No documents have been imported yet."),
    }
}

/// `GET /sections/{name}` — render one stored document.
async fn get_section(
    Extension(state): Extension<AppState>,
    Path(name): Path<String>,
) -> Response {
    let doc = match state.storage.get_document(&name).await {
        Ok(doc) => doc,
        Err(e) => {
            error!(error = %e, name, "failed to load document");
            return internal_error();
        }
    };

    let Some(content) = doc else {
        return not_found(&format!("No document named '{name}'."));
    };

    let names = match state.storage.list_document_names().await {
        Ok(names) => names,
        Err(e) => {
            error!(error = %e, "failed to list documents");
            return internal_error();
        }
    };

    let rendered = docshelf_render::to_html(&String::from_utf8_lossy(&content));
    Html(layout(&names, Some(&name), &rendered).into_string()).into_response()
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
}

fn not_found(message: &str) -> Response {
    let page = layout(&[], None, &format!("<h1>Not found</h1><p>{message}</p>"));
    (StatusCode::NOT_FOUND, Html(page.into_string())).into_response()
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

const STYLE: &str = "\
body { margin: 0; display: flex; font-family: sans-serif; }\n\
nav { min-width: 14rem; min-height: 100vh; padding: 1rem; background: #f4f4f5; }\n\
nav ul { list-style: none; padding: 0; }\n\
nav a { display: block; padding: 0.25rem 0.5rem; color: #1f2937; text-decoration: none; }\n\
nav a.active { font-weight: bold; }\n\
main { padding: 1rem 2rem; max-width: 52rem; }\n\
pre { background: #f4f4f5; padding: 0.75rem; overflow-x: auto; }";

/// Page shell: navigation of all documents plus the rendered content.
fn layout(names: &[String], active: Option<&str>, content_html: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { "docshelf" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                nav {
                    ul {
                        @for name in names {
                            li {
                                a.active[active == Some(name.as_str())]
                                    href=(format!("/sections/{name}")) {
                                    (name)
                                }
                            }
                        }
                    }
                }
                main { (PreEscaped(content_html)) }
            }
        }
    }
}
