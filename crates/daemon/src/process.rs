use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::http_server;
use crate::service_config::Config;
use crate::service_state::{State, StateSetupError};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to set up service state: {0}")]
    Setup(#[from] StateSetupError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stops a running service and waits for in-flight requests to finish.
pub struct ShutdownHandle {
    tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ShutdownHandle {
    pub async fn shutdown(self) {
        // the server may already be gone
        let _ = self.tx.send(());
        if let Err(e) = self.task.await {
            tracing::error!("http server task failed: {}", e);
        }
    }
}

/// Build state, bind the listener and serve in the background.
///
/// Returns the bound address, which differs from the configured one when
/// binding to port 0.
pub async fn start_service(config: &Config) -> Result<(SocketAddr, ShutdownHandle), ServiceError> {
    let state = State::from_config(config).await?;

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .map_err(|source| ServiceError::Bind {
            addr: config.listen_addr,
            source,
        })?;
    let addr = listener.local_addr()?;

    let app = http_server::router(state, config.max_upload_bytes);
    let (tx, rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
                tracing::info!("http server shutting down");
            })
            .await;
        if let Err(e) = result {
            tracing::error!("http server error: {}", e);
        }
    });

    tracing::info!("http server listening on http://{}", addr);
    Ok((addr, ShutdownHandle { tx, task }))
}

/// Run the service until Ctrl-C.
pub async fn spawn_service(config: &Config) -> Result<(), ServiceError> {
    let (_addr, handle) = start_service(config).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("shutdown signal received");

    handle.shutdown().await;
    Ok(())
}
