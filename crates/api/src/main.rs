use std::sync::Arc;

use anyhow::Context;
use logiflow_infra::LogiflowConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = LogiflowConfig::load()?;
    logiflow_observability::tracing::init_with(config.logging.format, &config.logging.level);

    let services = Arc::new(logiflow_api::app::services::build_services(&config)?);

    let monitoring = if config.monitoring.enabled {
        Some(services.monitoring_runner(config.monitoring.clone()).start())
    } else {
        tracing::warn!("autonomous monitoring disabled by configuration");
        None
    };

    let app = logiflow_api::app::build_app(services.clone());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = monitoring {
        handle.shutdown().await;
    }
    services.shutdown_workers();
    tracing::info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
}
