use thiserror::Error;

/// Errors raised by blob store backends.
#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("blob key already exists: {0}")]
    KeyCollision(String),

    #[error("invalid object store configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
}

pub type Result<T> = std::result::Result<T, BlobStoreError>;
