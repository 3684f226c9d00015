use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::record_store::RecordStore;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyzRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyzResponse {
    pub status: String,
    /// `embedded` or `managed`
    pub mode: String,
}

impl ApiRequest for ReadyzRequest {
    type Response = ReadyzResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let mut url = base_url.clone();
        url.set_path("/_status/readyz");
        client.get(url)
    }
}

/// Ready when the record store answers a ping; 503 otherwise.
#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> Response {
    let mode = state.mode().name().to_string();
    match state.catalog().records().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadyzResponse {
                status: "ok".to_string(),
                mode,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("record store not ready: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyzResponse {
                    status: "unavailable".to_string(),
                    mode,
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceConfig;

    #[tokio::test]
    async fn test_embedded_store_is_ready() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::embedded(temp_dir.path(), "127.0.0.1:0".parse().unwrap());
        let state = ServiceState::from_config(&config).await.unwrap();

        let response = handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ReadyzResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.status, "ok");
        assert_eq!(body.mode, "embedded");
    }
}
