//! `deferred-jobs` server: `POST /jobs` enqueues `HelloJob` three ways.

use anyhow::Context;
use tokio::net::TcpListener;

use deferred_jobs::builders::{build_service, default_registry};
use deferred_jobs::config::ServiceConfig;
use deferred_jobs::core::AppResult;
use deferred_jobs::runtime::{build_router, AppState};
use deferred_jobs::util::init_tracing;

#[tokio::main]
async fn main() -> AppResult<()> {
    init_tracing();

    let cfg = ServiceConfig::from_env().context("failed to load configuration")?;
    let service = build_service(&cfg, default_registry(&cfg))?;
    let app = build_router(AppState::with_client(service.client()));

    let listener = TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;
    tracing::info!(address = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    service.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
