//! Blob storage for uploaded book files and cover images.
//!
//! This crate provides the [`BlobStore`] capability and its two backends:
//!
//! - [`LocalBlobStore`] writes payloads into a directory on local disk and hands
//!   out root-relative references (`/uploads/<key>`) that the daemon serves.
//! - [`ObjectBlobStore`] writes payloads to an S3-compatible bucket (or an
//!   in-memory store for tests) and hands out absolute URLs.
//!
//! Keys are generated by [`BlobKey::generate`] from the current time, a random
//! suffix and the original file extension. Stores never overwrite an existing
//! key; a collision surfaces as [`BlobStoreError::KeyCollision`].
//!
//! # Example
//!
//! ```rust,no_run
//! use blob_store::{BlobStore, LocalBlobStore};
//! use bytes::Bytes;
//!
//! # async fn example() -> Result<(), blob_store::BlobStoreError> {
//! let store = LocalBlobStore::open("/tmp/uploads").await?;
//! let blob = store
//!     .put("moby-dick.epub", Bytes::from_static(b"..."), "application/epub+zip")
//!     .await?;
//! println!("stored at {}", blob.reference);
//! # Ok(())
//! # }
//! ```

mod error;
mod key;
mod local;
mod object;
mod store;

pub use error::{BlobStoreError, Result};
pub use key::BlobKey;
pub use local::LocalBlobStore;
pub use object::{ObjectBlobStore, ObjectStoreConfig};
pub use store::{BlobRef, BlobStore};
