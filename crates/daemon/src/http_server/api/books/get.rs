use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::{Book, CatalogError};

use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::message_response;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetBookRequest {
    pub id: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GetBookError> {
    let book = state.catalog().get(&id).await?;
    Ok((StatusCode::OK, Json(book)))
}

#[derive(Debug, thiserror::Error)]
pub enum GetBookError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl IntoResponse for GetBookError {
    fn into_response(self) -> Response {
        match self {
            GetBookError::Catalog(CatalogError::NotFound(_)) => {
                message_response(StatusCode::NOT_FOUND, "Book not found")
            }
            GetBookError::Catalog(CatalogError::Validation(msg)) => {
                message_response(StatusCode::BAD_REQUEST, msg)
            }
            GetBookError::Catalog(e) => {
                tracing::error!("failed to fetch book: {}", e);
                message_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error fetching book details",
                )
            }
        }
    }
}

impl ApiRequest for GetBookRequest {
    type Response = Book;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let mut url = base_url.clone();
        url.set_path("/api/books/");
        // pushed as a segment so the id is percent-encoded
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.id);
        }
        client.get(url)
    }
}
