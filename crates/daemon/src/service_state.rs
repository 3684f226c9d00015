use std::sync::Arc;

use common::{select_mode, Catalog, StorageError, StorageMode};

use super::admin::AdminAuth;
use super::service_config::Config;

/// Main service state, shared by every request handler.
#[derive(Clone)]
pub struct State {
    catalog: Catalog,
    mode: Arc<StorageMode>,
    admin: AdminAuth,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Pick the storage mode, once
        let mode = select_mode(&config.storage);
        tracing::info!(mode = mode.name(), "storage mode selected");

        // 2. Open the stores for that mode
        let catalog = mode.connect_catalog().await?;

        // 3. Admin credentials
        let admin = AdminAuth::new(config.admin_password.clone(), config.admin_token.clone());
        if config.admin_token.is_none() {
            tracing::info!("no admin token configured; generated one for this process");
        }

        Ok(Self {
            catalog,
            mode: Arc::new(mode),
            admin,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn mode(&self) -> &StorageMode {
        &self.mode
    }

    pub fn admin(&self) -> &AdminAuth {
        &self.admin
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("storage setup failed: {0}")]
    Storage(#[from] StorageError),
}
