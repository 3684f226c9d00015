//! Core of the Libris book catalog.
//!
//! - [`book`]: the record type.
//! - [`filter`]: sparse listing filters.
//! - [`record_store`]: record persistence (JSON file or PostgreSQL).
//! - [`mode`]: picks the storage backends once at startup.
//! - [`catalog`]: create/list/get over whichever backends were picked.
//! - [`upload`]: the validate → store blobs → persist record pipeline.

pub mod book;
pub mod catalog;
pub mod filter;
pub mod mode;
pub mod record_store;
pub mod upload;

pub use book::{Book, NewBook};
pub use catalog::{Catalog, CatalogError, StorageError};
pub use filter::{BookFilter, FilterParams};
pub use mode::{select_mode, StorageMode, StorageSettings};
pub use upload::{SubjectsInput, Submission, UploadedFile};

pub mod prelude {
    pub use crate::book::{Book, NewBook};
    pub use crate::catalog::{Catalog, CatalogError, StorageError};
    pub use crate::filter::{BookFilter, FilterParams};
    pub use crate::mode::{StorageMode, StorageSettings};
    pub use crate::record_store::{RecordStore, RecordStoreError};
    pub use crate::upload::{SubjectsInput, Submission, UploadedFile};
    pub use blob_store::{BlobRef, BlobStore};
}
