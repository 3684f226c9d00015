use axum::extract::DefaultBodyLimit;
use axum::Router;
use http::HeaderName;
use tower_http::cors::CorsLayer;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::admin::ADMIN_TOKEN_HEADER;
use crate::ServiceState;

pub mod api;
pub mod health;

/// Path blobs are served under in embedded mode.
pub const UPLOADS_PATH: &str = "/uploads";

/// The full HTTP surface: JSON API, health probes and, in embedded mode, the
/// upload directory.
pub fn router(state: ServiceState, max_upload_bytes: usize) -> Router {
    let mut app = Router::new()
        .nest("/api", api::router(state.clone()))
        .nest("/_status", health::router(state.clone()))
        .with_state(state.clone());

    if let Some(uploads_dir) = state.mode().uploads_dir() {
        tracing::debug!("serving {} from {}", UPLOADS_PATH, uploads_dir.display());
        app = app.nest_service(UPLOADS_PATH, ServeDir::new(uploads_dir));
    }

    app.layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new([
            HeaderName::from_static(ADMIN_TOKEN_HEADER),
        ]))
        .layer(CorsLayer::permissive())
}
