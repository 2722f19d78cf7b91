//! Service lifecycle management.
//!
//! Runs the trigger API with signal handling and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::api;
use crate::config::PromoteConfig;
use crate::error::{PromoteError, PromoteResult};
use crate::pipeline::Pipeline;

/// The promotion trigger service.
///
/// Each accepted request runs one pipeline to completion before responding.
/// Concurrent requests for the same group race on the hosting service the
/// same way two overlapping CLI runs would.
pub struct PromoteService {
    config: PromoteConfig,
    pipeline: Arc<Pipeline>,
    cancel: CancellationToken,
}

impl PromoteService {
    /// Create a new service around a pipeline.
    #[must_use]
    pub fn new(config: PromoteConfig, pipeline: Arc<Pipeline>) -> Self {
        Self {
            config,
            pipeline,
            cancel: CancellationToken::new(),
        }
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(&self) -> PromoteResult<()> {
        let listener = TcpListener::bind(self.config.server.listen)
            .await
            .map_err(|e| PromoteError::config(format!("failed to bind TCP: {e}")))?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> PromoteResult<()> {
        let addr: Option<SocketAddr> = listener.local_addr().ok();
        let app = api::router(api::AppState {
            pipeline: Arc::clone(&self.pipeline),
            default_group: self.config.registry.group_name.clone(),
        });

        info!(
            listen = ?addr,
            default_group = %self.config.registry.group_name,
            "promotion service listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(self.cancel.clone()))
            .await
            .map_err(|e| PromoteError::internal(format!("server error: {e}")))?;

        info!("promotion service shutdown complete");
        Ok(())
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("received SIGTERM, initiating shutdown");
        }
        () = cancel.cancelled() => {
            info!("shutdown requested");
        }
    }
}
