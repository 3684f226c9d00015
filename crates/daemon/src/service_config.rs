use std::net::SocketAddr;
use std::path::PathBuf;

use common::StorageSettings;

use crate::admin::DEFAULT_ADMIN_PASSWORD;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub listen_addr: SocketAddr,
    /// Raw storage settings; the storage mode is selected from these
    pub storage: StorageSettings,
    pub admin_password: String,
    /// Fixed admin token. A random one is generated when unset
    pub admin_token: Option<String>,
    /// Request body limit for uploads
    pub max_upload_bytes: usize,
}

impl Config {
    /// Embedded-mode config rooted at `data_dir`, listening on `listen_addr`.
    pub fn embedded(data_dir: impl Into<PathBuf>, listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            storage: StorageSettings {
                data_dir: data_dir.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            storage: StorageSettings {
                data_dir: PathBuf::from("."),
                ..Default::default()
            },
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            admin_token: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
