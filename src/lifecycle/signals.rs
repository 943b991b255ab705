//! OS signal handling.
//!
//! # Responsibilities
//! - SIGTERM/SIGINT (Ctrl+C) → graceful shutdown
//! - SIGHUP → forced configuration reload
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP triggers a reload, not a shutdown

use std::sync::Arc;

use crate::reload::{CheckOutcome, ReloadSupervisor};

/// Resolves once SIGINT or SIGTERM is received.
pub async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}

/// Spawn a task forcing a reload on every SIGHUP.
#[cfg(unix)]
pub fn spawn_reload_on_hangup(supervisor: Arc<ReloadSupervisor>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGHUP handler");
                return;
            }
        };

        while hangup.recv().await.is_some() {
            let supervisor = supervisor.clone();
            match tokio::task::spawn_blocking(move || supervisor.force_reload()).await {
                Ok(CheckOutcome::Reloaded { generation, rules }) => {
                    tracing::info!(generation, rules, "Reloaded on SIGHUP");
                }
                Ok(_) => tracing::warn!("Reload on SIGHUP failed, keeping current rules"),
                Err(e) => tracing::error!(error = %e, "Reload task failed"),
            }
        }
    });
}

#[cfg(not(unix))]
pub fn spawn_reload_on_hangup(_supervisor: Arc<ReloadSupervisor>) {}
