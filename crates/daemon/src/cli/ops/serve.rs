use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Args;

use common::StorageSettings;
use libris_daemon::admin::DEFAULT_ADMIN_PASSWORD;
use libris_daemon::service_config::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT};
use libris_daemon::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Serve {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Root for the embedded data file and upload directory
    #[arg(long, env = "LIBRIS_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// PostgreSQL connection string (managed mode)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Bucket for uploaded files (managed mode)
    #[arg(long, env = "AWS_BUCKET_NAME")]
    pub aws_bucket_name: Option<String>,

    #[arg(long, env = "AWS_REGION")]
    pub aws_region: Option<String>,

    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub aws_access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub aws_secret_access_key: Option<String>,

    /// Alternate S3-compatible endpoint (MinIO, ...)
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub aws_endpoint_url: Option<String>,

    /// Base URL for links to uploaded objects
    #[arg(long, env = "BLOB_PUBLIC_URL")]
    pub blob_public_url: Option<String>,

    /// Canned ACL for uploaded objects (e.g. public-read); needs a bucket with ACLs enabled
    #[arg(long, env = "AWS_OBJECT_ACL")]
    pub aws_object_acl: Option<String>,

    #[arg(long, env = "ADMIN_PASSWORD", default_value = DEFAULT_ADMIN_PASSWORD, hide_env_values = true)]
    pub admin_password: String,

    /// Fixed admin token; generated at startup when unset
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: Option<String>,

    /// Request body limit for uploads, in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl Serve {
    fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], self.port)),
            storage: StorageSettings {
                data_dir: self.data_dir.clone(),
                database_url: self.database_url.clone(),
                bucket: self.aws_bucket_name.clone(),
                region: self.aws_region.clone(),
                access_key_id: self.aws_access_key_id.clone(),
                secret_access_key: self.aws_secret_access_key.clone(),
                endpoint_url: self.aws_endpoint_url.clone(),
                public_url: self.blob_public_url.clone(),
                object_acl: self.aws_object_acl.clone(),
            },
            admin_password: self.admin_password.clone(),
            admin_token: self.admin_token.clone(),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("service failed: {0}")]
    Service(#[from] libris_daemon::process::ServiceError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Serve {
    type Error = ServeError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        spawn_service(&self.service_config()).await?;
        Ok("service stopped".to_string())
    }
}
