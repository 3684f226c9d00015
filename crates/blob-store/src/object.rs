//! Object storage blob store (S3-compatible or in-memory).

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use object_store::aws::{AmazonS3Builder, S3ConditionalPut};
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, Attributes, ClientOptions, ObjectStore, PutMode, PutOptions, PutPayload,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BlobStoreError, Result};
use crate::key::BlobKey;
use crate::store::{BlobRef, BlobStore};

/// Key prefix for every uploaded object.
const KEY_PREFIX: &str = "uploads";

/// Canned ACL header sent with every request when `object_acl` is set.
const AMZ_ACL_HEADER: &str = "x-amz-acl";

/// Object storage backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectStoreConfig {
    /// AWS S3 or any S3-compatible service.
    S3 {
        bucket: String,
        region: String,
        access_key: String,
        secret_key: String,
        /// Alternate S3-compatible endpoint (MinIO, Supabase storage, ...).
        endpoint: Option<String>,
        /// Base URL clients use to download objects. Derived when unset.
        public_url: Option<String>,
        /// Canned ACL applied to uploads (e.g. `public-read`). References are
        /// only dereferenceable when the bucket or this ACL makes them public.
        /// Buckets with ACLs disabled reject the header, so it is opt-in.
        #[serde(default)]
        object_acl: Option<String>,
    },
    /// Process-local store, used by tests and ephemeral setups.
    Memory { public_url: String },
}

impl ObjectStoreConfig {
    /// Base URL that object keys are appended to when building references.
    pub fn public_base_url(&self) -> String {
        let base = match self {
            ObjectStoreConfig::S3 {
                public_url: Some(url),
                ..
            } => url.clone(),
            ObjectStoreConfig::S3 {
                endpoint: Some(endpoint),
                bucket,
                ..
            } => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            ObjectStoreConfig::S3 { bucket, region, .. } => {
                format!("https://{}.s3.{}.amazonaws.com", bucket, region)
            }
            ObjectStoreConfig::Memory { public_url } => public_url.clone(),
        };
        base.trim_end_matches('/').to_string()
    }
}

/// Stores blobs as objects under `uploads/<key>` and hands out absolute URLs.
#[derive(Debug, Clone)]
pub struct ObjectBlobStore {
    store: Arc<dyn ObjectStore>,
    public_base_url: String,
}

impl ObjectBlobStore {
    pub fn new(config: ObjectStoreConfig) -> Result<Self> {
        let public_base_url = config.public_base_url();
        let store: Arc<dyn ObjectStore> = match config {
            ObjectStoreConfig::S3 {
                bucket,
                region,
                access_key,
                secret_key,
                endpoint,
                object_acl,
                ..
            } => {
                if bucket.is_empty() || region.is_empty() {
                    return Err(BlobStoreError::InvalidConfig(
                        "bucket and region are required".to_string(),
                    ));
                }
                let mut builder = AmazonS3Builder::new()
                    .with_bucket_name(&bucket)
                    .with_region(&region)
                    .with_access_key_id(&access_key)
                    .with_secret_access_key(&secret_key)
                    // create-only puts rely on If-None-Match
                    .with_conditional_put(S3ConditionalPut::ETagMatch);
                if let Some(endpoint) = endpoint {
                    if endpoint.starts_with("http://") {
                        builder = builder.with_allow_http(true);
                    }
                    builder = builder.with_endpoint(endpoint);
                }
                if let Some(acl) = object_acl {
                    builder = builder.with_client_options(acl_client_options(&acl)?);
                }
                info!(bucket = %bucket, region = %region, "using S3 object storage");
                Arc::new(builder.build()?)
            }
            ObjectStoreConfig::Memory { .. } => {
                info!("using in-memory object storage");
                Arc::new(InMemory::new())
            }
        };

        Ok(Self {
            store,
            public_base_url,
        })
    }

    /// Ephemeral in-memory store. Data is lost when dropped.
    pub fn new_ephemeral() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            public_base_url: "memory://blobs".to_string(),
        }
    }

    /// Underlying object store client, for reads.
    pub fn object_store(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }

    /// Object path for a generated key.
    pub fn path_for(key: &str) -> ObjectPath {
        ObjectPath::from(format!("{}/{}", KEY_PREFIX, key))
    }

    pub(crate) async fn put_key(
        &self,
        key: &BlobKey,
        data: Bytes,
        content_type: &str,
    ) -> Result<BlobRef> {
        let path = Self::path_for(key.as_str());

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let opts = PutOptions {
            mode: PutMode::Create,
            attributes,
            ..Default::default()
        };

        match self
            .store
            .put_opts(&path, PutPayload::from(data), opts)
            .await
        {
            Ok(_) => {}
            Err(object_store::Error::AlreadyExists { .. }) => {
                return Err(BlobStoreError::KeyCollision(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(BlobRef {
            key: key.to_string(),
            reference: format!("{}/{}", self.public_base_url, path),
        })
    }
}

fn acl_client_options(acl: &str) -> Result<ClientOptions> {
    let value = HeaderValue::from_str(acl)
        .map_err(|_| BlobStoreError::InvalidConfig(format!("invalid object ACL {:?}", acl)))?;
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(AMZ_ACL_HEADER), value);
    Ok(ClientOptions::new().with_default_headers(headers))
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    async fn put(&self, name: &str, data: Bytes, content_type: &str) -> Result<BlobRef> {
        let key = BlobKey::generate(name);
        debug!(
            key = %key,
            size = data.len(),
            content_type = content_type,
            "uploading blob to object storage"
        );
        self.put_key(&key, data, content_type).await
    }

    fn kind(&self) -> &'static str {
        "object"
    }
}
