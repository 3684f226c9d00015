use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::{Book, CatalogError, FilterParams};

use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::message_response;
use crate::ServiceState;

/// Listing query. Every field is optional; empty values are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListBooksRequest {
    pub filter: FilterParams,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Query(params): Query<FilterParams>,
) -> Result<impl IntoResponse, ListBooksError> {
    let books = state.catalog().list_params(params).await?;
    tracing::debug!(count = books.len(), "listed books");
    Ok((StatusCode::OK, Json(books)))
}

#[derive(Debug, thiserror::Error)]
pub enum ListBooksError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl IntoResponse for ListBooksError {
    fn into_response(self) -> Response {
        match self {
            ListBooksError::Catalog(e) => {
                tracing::error!("failed to list books: {}", e);
                message_response(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching books")
            }
        }
    }
}

impl ApiRequest for ListBooksRequest {
    type Response = Vec<Book>;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let mut url = base_url.clone();
        url.set_path("/api/books");
        client.get(url).query(&self.filter)
    }
}
