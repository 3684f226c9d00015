//! Catalog service: the backend-agnostic create/list/get surface.

use std::sync::Arc;

use blob_store::{BlobStore, BlobStoreError};
use tracing::debug;

use crate::book::Book;
use crate::filter::{BookFilter, FilterError, FilterParams};
use crate::record_store::{RecordStore, RecordStoreError};
use crate::upload::{Submission, UploadPipeline};

/// Backend failures, kept apart from caller errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("blob store: {0}")]
    Blob(#[from] BlobStoreError),
    #[error("record store: {0}")]
    Record(#[from] RecordStoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Missing or malformed caller input. Raised before any side effect.
    #[error("{0}")]
    Validation(String),
    /// No record with this id, including ids the backend cannot parse.
    #[error("book not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Create/list/get over one blob store and one record store.
///
/// Written against the capability traits only; which backends sit behind them
/// is decided once at startup by [`crate::mode::StorageMode`]. Nothing is cached
/// here: every read goes to the record store.
#[derive(Clone)]
pub struct Catalog {
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn RecordStore>,
}

impl Catalog {
    pub fn new(blobs: Arc<dyn BlobStore>, records: Arc<dyn RecordStore>) -> Self {
        Self { blobs, records }
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    /// Validate a submission, store its files and persist its record.
    pub async fn create(&self, submission: Submission) -> Result<Book, CatalogError> {
        UploadPipeline::new(self.blobs.as_ref(), self.records.as_ref())
            .run(submission)
            .await
    }

    /// Records matching `filter`, newest upload first.
    pub async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>, CatalogError> {
        debug!(?filter, "listing books");
        let books = self
            .records
            .query(filter)
            .await
            .map_err(StorageError::Record)?;
        Ok(books)
    }

    /// Same as [`Catalog::list`], from raw query parameters. A year that is
    /// not an integer can match no record, so it yields an empty listing.
    pub async fn list_params(&self, params: FilterParams) -> Result<Vec<Book>, CatalogError> {
        match BookFilter::from_params(params) {
            Ok(filter) => self.list(&filter).await,
            Err(FilterError::InvalidYear(year)) => {
                debug!(year = %year, "non-integer year filter matches nothing");
                Ok(Vec::new())
            }
        }
    }

    /// Exact id lookup. Backend-specific "bad id" errors become `NotFound`.
    pub async fn get(&self, id: &str) -> Result<Book, CatalogError> {
        match self.records.get(id).await {
            Ok(Some(book)) => Ok(book),
            Ok(None) => Err(CatalogError::NotFound(id.to_string())),
            Err(RecordStoreError::InvalidId(_)) => {
                debug!(id = id, "id rejected by record store, treating as not found");
                Err(CatalogError::NotFound(id.to_string()))
            }
            Err(e) => Err(StorageError::Record(e).into()),
        }
    }
}
