use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::message_response;
use crate::admin::ADMIN_TOKEN_HEADER;
use crate::ServiceState;

/// Extractor that admits only requests carrying the admin token.
///
/// Put it before any body extractor so unauthorized uploads are rejected
/// before their body is read.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

#[async_trait]
impl FromRequestParts<ServiceState> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        if state.admin().authorize(token) {
            Ok(RequireAdmin)
        } else {
            tracing::debug!(present = token.is_some(), "admin token rejected");
            Err(AuthError::Forbidden)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("admin token missing or incorrect")]
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Forbidden => message_response(
                StatusCode::FORBIDDEN,
                "Unauthorized. Admin access required.",
            ),
        }
    }
}
