//! Storage mode selection.
//!
//! The process runs in exactly one of two modes, decided once at startup:
//!
//! - **Managed**: PostgreSQL records + S3-compatible object storage. Chosen only
//!   when the database URL and every object storage setting are present.
//! - **Embedded**: a JSON record file + a local upload directory. Chosen
//!   otherwise, including when managed settings are only partially present.

use std::path::PathBuf;
use std::sync::Arc;

use blob_store::{BlobStore, LocalBlobStore, ObjectBlobStore, ObjectStoreConfig};
use tracing::{info, warn};

use crate::catalog::{Catalog, StorageError};
use crate::record_store::{JsonFileStore, PgRecordStore, RecordStore};

pub const DATA_DIR_NAME: &str = "data";
pub const RECORD_FILE_NAME: &str = "books.json";
pub const UPLOADS_DIR_NAME: &str = "uploads";

/// Raw storage-related configuration values, as read from the environment.
#[derive(Debug, Clone, Default)]
pub struct StorageSettings {
    /// Root for embedded-mode files.
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Alternate S3-compatible endpoint.
    pub endpoint_url: Option<String>,
    /// Base URL for object references, overriding the derived one.
    pub public_url: Option<String>,
    /// Canned ACL for uploaded objects, e.g. `public-read`.
    pub object_acl: Option<String>,
}

/// The selected persistence mode, fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    Embedded {
        data_file: PathBuf,
        uploads_dir: PathBuf,
    },
    Managed {
        database_url: String,
        object_store: ObjectStoreConfig,
    },
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Pick the storage mode. Pure: reads nothing but `settings`.
pub fn select_mode(settings: &StorageSettings) -> StorageMode {
    let database_url = present(&settings.database_url);
    let bucket = present(&settings.bucket);
    let region = present(&settings.region);
    let access_key = present(&settings.access_key_id);
    let secret_key = present(&settings.secret_access_key);

    if let (Some(database_url), Some(bucket), Some(region), Some(access_key), Some(secret_key)) = (
        database_url.clone(),
        bucket.clone(),
        region.clone(),
        access_key.clone(),
        secret_key.clone(),
    ) {
        return StorageMode::Managed {
            database_url,
            object_store: ObjectStoreConfig::S3 {
                bucket,
                region,
                access_key,
                secret_key,
                endpoint: present(&settings.endpoint_url),
                public_url: present(&settings.public_url),
                object_acl: present(&settings.object_acl),
            },
        };
    }

    let missing: Vec<&str> = [
        ("DATABASE_URL", database_url.is_none()),
        ("AWS_BUCKET_NAME", bucket.is_none()),
        ("AWS_REGION", region.is_none()),
        ("AWS_ACCESS_KEY_ID", access_key.is_none()),
        ("AWS_SECRET_ACCESS_KEY", secret_key.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, is_missing)| is_missing.then_some(name))
    .collect();

    // some but not all managed settings: say why we are not using them
    if missing.len() < 5 {
        warn!(
            missing = ?missing,
            "managed storage is partially configured; falling back to embedded mode"
        );
    }

    StorageMode::Embedded {
        data_file: settings.data_dir.join(DATA_DIR_NAME).join(RECORD_FILE_NAME),
        uploads_dir: settings.data_dir.join(UPLOADS_DIR_NAME),
    }
}

impl StorageMode {
    pub fn name(&self) -> &'static str {
        match self {
            StorageMode::Embedded { .. } => "embedded",
            StorageMode::Managed { .. } => "managed",
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, StorageMode::Embedded { .. })
    }

    /// Local directory holding uploaded blobs, in embedded mode.
    pub fn uploads_dir(&self) -> Option<&PathBuf> {
        match self {
            StorageMode::Embedded { uploads_dir, .. } => Some(uploads_dir),
            StorageMode::Managed { .. } => None,
        }
    }

    /// Build the concrete stores for this mode. Embedded mode creates its
    /// directories and an empty record file if missing; managed mode ensures
    /// the database schema. Both are idempotent.
    pub async fn connect(
        &self,
    ) -> Result<(Arc<dyn BlobStore>, Arc<dyn RecordStore>), StorageError> {
        let stores: (Arc<dyn BlobStore>, Arc<dyn RecordStore>) = match self {
            StorageMode::Embedded {
                data_file,
                uploads_dir,
            } => {
                let blobs = LocalBlobStore::open(uploads_dir).await?;
                let records = JsonFileStore::open(data_file).await?;
                info!(
                    data_file = %data_file.display(),
                    uploads_dir = %uploads_dir.display(),
                    "embedded storage ready"
                );
                (Arc::new(blobs), Arc::new(records))
            }
            StorageMode::Managed {
                database_url,
                object_store,
            } => {
                let blobs = ObjectBlobStore::new(object_store.clone())?;
                let records = PgRecordStore::connect(database_url).await?;
                info!(
                    public_url = %object_store.public_base_url(),
                    "managed storage ready"
                );
                (Arc::new(blobs), Arc::new(records))
            }
        };
        Ok(stores)
    }

    /// [`StorageMode::connect`], wrapped in a [`Catalog`].
    pub async fn connect_catalog(&self) -> Result<Catalog, StorageError> {
        let (blobs, records) = self.connect().await?;
        Ok(Catalog::new(blobs, records))
    }
}
