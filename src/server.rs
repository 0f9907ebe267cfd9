//! Live HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Home page |
//! | `GET`  | `/impressum` | Impressum |
//! | `GET`  | `/project/{id}` | Project page, 404 with the not-found variant when unknown |
//! | `GET`  | `/tool/{id}` | Tool page, 404 with the not-found variant when unknown |
//! | `GET`  | `/static/*` | Files below `site.static_dir` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Unknown routes render the error page with status 404. Store failures
//! (timeouts, undecodable records) render it with status 500.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::StoreError;
use crate::pages::{Page, PageAssembler, PageStatus};
use crate::render;

#[derive(Clone)]
struct AppState {
    pages: Arc<PageAssembler>,
}

/// Builds the router without binding, so tests can serve it on any listener.
pub fn router(config: &Config, pages: Arc<PageAssembler>) -> Router {
    tracing::info!(dir = %config.site.static_dir.display(), "serving static files");
    Router::new()
        .route("/", get(handle_home))
        .route("/impressum", get(handle_impressum))
        .route("/project/{id}", get(handle_project))
        .route("/tool/{id}", get(handle_tool))
        .route("/health", get(handle_health))
        .nest_service("/static", ServeDir::new(&config.site.static_dir))
        .fallback(handle_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { pages })
}

/// Binds to `server.bind` and serves until the process is terminated.
pub async fn run_server(config: &Config, pages: Arc<PageAssembler>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(config, pages);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

/// A store failure while assembling a page.
struct AppError(StoreError);

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "could not assemble page");
        let page = Page {
            title: "Internal Server Error".to_string(),
            ..Page::default()
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Html(render::error(&page))).into_response()
    }
}

fn status_code(status: PageStatus) -> StatusCode {
    match status {
        PageStatus::Found => StatusCode::OK,
        PageStatus::NotFound => StatusCode::NOT_FOUND,
    }
}

// ============ Pages ============

async fn handle_home(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let home = state.pages.home().await?;
    Ok(Html(render::home(&home)))
}

async fn handle_impressum(State(state): State<AppState>) -> Html<String> {
    Html(render::impressum(&state.pages.impressum()))
}

async fn handle_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Html<String>), AppError> {
    let (page, status) = state.pages.project_page(&id).await?;
    Ok((status_code(status), Html(render::product(&page))))
}

async fn handle_tool(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Html<String>), AppError> {
    let (page, status) = state.pages.tool_page(&id).await?;
    Ok((status_code(status), Html(render::product(&page))))
}

async fn handle_not_found(State(state): State<AppState>) -> (StatusCode, Html<String>) {
    (
        StatusCode::NOT_FOUND,
        Html(render::error(&state.pages.not_found())),
    )
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
