use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, LoginError> {
    let token = state
        .admin()
        .login(&req.password)
        .ok_or(LoginError::InvalidPassword)?;

    tracing::info!("admin login succeeded");

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            success: true,
            token: Some(token.to_string()),
            message: None,
        }),
    ))
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("invalid password")]
    InvalidPassword,
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        match self {
            LoginError::InvalidPassword => {
                tracing::warn!("admin login failed");
                (
                    StatusCode::UNAUTHORIZED,
                    Json(LoginResponse {
                        success: false,
                        token: None,
                        message: Some("Invalid password".to_string()),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl ApiRequest for LoginRequest {
    type Response = LoginResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let mut url = base_url.clone();
        url.set_path("/api/login");
        client.post(url).json(&self)
    }
}
