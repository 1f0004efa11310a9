//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The application's pages are served as static files from `STATIC_DIR`;
//! the request gate wraps the whole router and decides per path whether to
//! act. `/healthz` sits outside the gated paths.

use std::path::PathBuf;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::gate;
use crate::state::AppState;

/// Resolve the directory holding the application's pages.
#[must_use]
pub fn static_dir() -> PathBuf {
    std::env::var("STATIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("public"))
}

/// Gated app: health check plus static pages, all behind the gate middleware.
pub fn app(state: AppState, pages: PathBuf) -> Router {
    let pages = ServeDir::new(pages).append_index_html_on_directories(true);

    Router::new()
        .route("/healthz", get(healthz))
        .fallback_service(pages)
        .layer(axum::middleware::from_fn_with_state(state, gate::guard))
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
