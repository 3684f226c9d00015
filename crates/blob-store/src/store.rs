use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Where a stored blob landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    /// Generated storage key, `<millis>-<random><ext>`.
    pub key: String,
    /// Client-facing reference: a root-relative path or an absolute URL,
    /// dereferenceable without any knowledge of the backend.
    pub reference: String,
}

/// Capability to persist opaque byte payloads.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under a freshly generated key derived from `name`.
    ///
    /// Never overwrites an existing key.
    async fn put(&self, name: &str, data: Bytes, content_type: &str) -> Result<BlobRef>;

    /// Short backend name used in logs.
    fn kind(&self) -> &'static str;
}
