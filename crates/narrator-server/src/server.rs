//! Server lifecycle: bind, sweep idle sessions, shut down gracefully.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use narrator_core::{NarratorConfig, NarratorError, NarratorResult, ServerConfig};
use narrator_runtime::metrics::WorkflowMetrics;
use narrator_runtime::{AudioWorkflow, SessionStore, runtime_from_config};

use crate::routes::{AppState, create_router};

/// The Narrator HTTP server.
pub struct NarratorServer {
    config: ServerConfig,
    workflow: Arc<AudioWorkflow>,
    sessions: Arc<SessionStore>,
}

impl NarratorServer {
    /// Build the workflow and session store described by `config`.
    pub fn new(config: &NarratorConfig) -> NarratorResult<Self> {
        let (workflow, sessions) = runtime_from_config(config)?;
        Ok(Self::with_runtime(config.server.clone(), workflow, sessions))
    }

    /// Create a server around an existing workflow.
    pub fn with_runtime(
        config: ServerConfig,
        workflow: Arc<AudioWorkflow>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            config,
            workflow,
            sessions,
        }
    }

    /// Router without a metrics recorder.
    pub fn router(&self) -> Router {
        create_router(self.state())
    }

    fn state(&self) -> AppState {
        AppState::new(
            Arc::clone(&self.workflow),
            Arc::clone(&self.sessions),
            self.config.clone(),
        )
    }

    /// Run the server until SIGINT/SIGTERM.
    pub async fn run(self) -> NarratorResult<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let state = match WorkflowMetrics::install() {
            Ok(handle) => self.state().with_metrics(handle),
            Err(e) => {
                warn!("Metrics disabled: {e}");
                self.state()
            }
        };
        let app = create_router(state);

        let addr = self.config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| NarratorError::config(format!("cannot bind {addr}: {e}")))?;

        let sweeper = spawn_sweeper(
            Arc::clone(&self.workflow),
            Arc::clone(&self.sessions),
            shutdown_rx.clone(),
        );

        let mut http_shutdown_rx = shutdown_rx.clone();
        let http_handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    http_shutdown_rx.changed().await.ok();
                })
                .await;
            if let Err(e) = result {
                warn!("HTTP server failed: {e}");
            }
        });

        info!(
            addr = %addr,
            ui = ?self.config.ui,
            synthesizer = self.workflow.synthesizer_name(),
            "Narrator server started"
        );

        shutdown_signal().await;

        info!("Shutdown signal received, stopping server...");

        let _ = shutdown_tx.send(true);

        let timeout = Duration::from_secs(self.config.shutdown_timeout_secs);
        tokio::select! {
            _ = tokio::time::sleep(timeout) => {
                warn!("Shutdown timeout, forcing exit");
            }
            _ = async {
                let _ = http_handle.await;
                let _ = sweeper.await;
            } => {
                info!("Server stopped gracefully");
            }
        }

        let workflow = Arc::clone(&self.workflow);
        let sessions = Arc::clone(&self.sessions);
        match tokio::task::spawn_blocking(move || sessions.drain(&workflow)).await {
            Ok(closed) => info!(sessions = closed, "Sessions closed"),
            Err(e) => warn!("Session drain failed: {e}"),
        }

        Ok(())
    }
}

/// Periodically drop idle sessions until shutdown.
///
/// Sweeps run on the blocking pool since closing a session may delete files.
fn spawn_sweeper(
    workflow: Arc<AudioWorkflow>,
    sessions: Arc<SessionStore>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    let period = sessions.sweep_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let sweep = {
                        let workflow = Arc::clone(&workflow);
                        let sessions = Arc::clone(&sessions);
                        tokio::task::spawn_blocking(move || sessions.sweep_expired(&workflow))
                    };
                    let removed = match sweep.await {
                        Ok(removed) => removed,
                        Err(e) => {
                            warn!("Session sweep failed: {e}");
                            continue;
                        }
                    };
                    if removed > 0 {
                        info!(removed, remaining = sessions.len(), "Expired sessions swept");
                    } else {
                        debug!(remaining = sessions.len(), "Session sweep");
                    }
                }
                _ = shutdown_rx.changed() => break,
            }
        }
    })
}

/// Wait for shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
