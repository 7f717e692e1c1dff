mod api;
mod middleware;

use std::sync::Arc;
use std::time::Duration;

use luxlab_jobs::{ConversionRunner, JobRegistry};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_conversion_limit, AppState},
    middleware::AuthState,
};

/// How often finished jobs are swept from the registry.
const JANITOR_INTERVAL: Duration = Duration::from_secs(600);
/// How long a finished job stays pollable.
const FINISHED_JOB_TTL_HOURS: i64 = 1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = luxlab_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let auth = AuthState::from_keys(config.api_keys.as_deref(), config.is_development())?;
    let runner = Arc::new(ConversionRunner::from_app_config(&config)?);
    let registry = JobRegistry::new();
    tokio::spawn(prune_finished_jobs(registry.clone()));

    let app = build_app(
        AppState {
            registry,
            runner,
            heartbeat: config.stream_heartbeat(),
        },
        auth,
        default_conversion_limit(),
    );

    tracing::info!(
        env = %config.env,
        bind_addr = %config.bind_addr,
        export_dir = %config.export_dir.display(),
        "luxlab server listening"
    );
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn prune_finished_jobs(registry: JobRegistry) {
    let mut ticker = tokio::time::interval(JANITOR_INTERVAL);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let removed = registry.prune_finished(chrono::Utc::now() - chrono::Duration::hours(FINISHED_JOB_TTL_HOURS));
        if removed > 0 {
            tracing::debug!(removed, remaining = registry.len(), "pruned finished jobs");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
