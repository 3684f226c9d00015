//! Typed HTTP client for the daemon's API.
//!
//! Every endpoint's request type implements [`ApiRequest`], which knows how to
//! turn itself into a `reqwest` request; [`ApiClient::call`] sends it and
//! decodes the JSON response.

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

#[allow(clippy::module_inception)]
mod client;
mod error;

pub use client::ApiClient;
pub use error::ApiError;

pub trait ApiRequest {
    type Response: DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder;
}
