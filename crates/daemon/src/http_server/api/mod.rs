use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use crate::ServiceState;

pub mod auth;
pub mod books;
pub mod client;
pub mod login;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/login", post(login::handler))
        .nest("/books", books::router(state.clone()))
        .with_state(state)
}

/// `{"message": ...}` error body used by every API endpoint.
pub(crate) fn message_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "message": message.into() });
    (status, Json(body)).into_response()
}
