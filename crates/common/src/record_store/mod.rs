//! Record storage for book metadata.
//!
//! Two interchangeable backends implement [`RecordStore`]:
//!
//! - [`JsonFileStore`]: the whole collection lives in one JSON file that is
//!   loaded per query and rewritten per insert.
//! - [`PgRecordStore`]: a `books` table in PostgreSQL, queried with native
//!   predicates.
//!
//! Both must return the same result set, in the same order, for the same filter
//! over the same data.

use async_trait::async_trait;

use crate::book::{Book, NewBook};
use crate::filter::BookFilter;

mod json_file;
mod postgres;

pub use json_file::JsonFileStore;
pub use postgres::PgRecordStore;

#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    /// The id cannot name any record in this backend (wrong shape).
    #[error("invalid record id: {0}")]
    InvalidId(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record file is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, RecordStoreError>;

/// Capability to persist and query book records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new record, assigning its id.
    async fn insert(&self, book: NewBook) -> Result<Book>;

    /// All records matching `filter`, newest upload first, ties in insertion order.
    async fn query(&self, filter: &BookFilter) -> Result<Vec<Book>>;

    /// Exact id lookup.
    async fn get(&self, id: &str) -> Result<Option<Book>>;

    /// Cheap reachability check.
    async fn ping(&self) -> Result<()>;

    /// Short backend name used in logs.
    fn kind(&self) -> &'static str;
}

/// Order records newest upload first. The sort is stable, so records that share
/// a timestamp stay in insertion order.
pub(crate) fn sort_newest_first(books: &mut [Book]) {
    books.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
}
