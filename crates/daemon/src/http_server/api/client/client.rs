use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use url::Url;

use common::{Book, FilterParams, Submission};

use super::error::ApiError;
use super::ApiRequest;
use crate::http_server::api::books::{CreateBookRequest, GetBookRequest, ListBooksRequest};
use crate::http_server::api::login::{LoginRequest, LoginResponse};

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("libris/", env!("CARGO_PKG_VERSION"))),
        );
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    /// Parse `remote` and build a client for it.
    pub fn parse(remote: &str) -> Result<Self, ApiError> {
        Self::new(&Url::parse(remote)?)
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client);
        let response = request_builder.send().await?;

        if response.status().is_success() {
            Ok(response.json::<T::Response>().await?)
        } else {
            Err(ApiError::HttpStatus(
                response.status(),
                response.text().await?,
            ))
        }
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    /// Get the underlying HTTP client for custom requests
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    /// Exchange the admin password for the admin token.
    pub async fn login(&self, password: &str) -> Result<String, ApiError> {
        let response: LoginResponse = self
            .call(LoginRequest {
                password: password.to_string(),
            })
            .await?;
        // a success response always carries the token
        Ok(response.token.unwrap_or_default())
    }

    pub async fn create_book(
        &self,
        admin_token: &str,
        submission: Submission,
    ) -> Result<Book, ApiError> {
        self.call(CreateBookRequest {
            admin_token: admin_token.to_string(),
            submission,
        })
        .await
    }

    pub async fn list_books(&self, filter: FilterParams) -> Result<Vec<Book>, ApiError> {
        self.call(ListBooksRequest { filter }).await
    }

    pub async fn get_book(&self, id: &str) -> Result<Book, ApiError> {
        self.call(GetBookRequest { id: id.to_string() }).await
    }
}
