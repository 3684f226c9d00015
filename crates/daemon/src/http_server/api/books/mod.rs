//! Book catalog API endpoints
//!
//! - `POST /api/books`: upload a book (admin only, multipart)
//! - `GET /api/books`: list books, optionally filtered
//! - `GET /api/books/:id`: fetch one book

use axum::routing::get;
use axum::Router;

use crate::ServiceState;

mod create;
mod get;
mod list;

// Re-export request/response types for use by the CLI and other clients
pub use create::{CreateBookError, CreateBookRequest};
pub use get::{GetBookError, GetBookRequest};
pub use list::{ListBooksError, ListBooksRequest};

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", get(list::handler).post(create::handler))
        .route("/:id", get(get::handler))
        .with_state(state)
}
