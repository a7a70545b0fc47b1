use anyhow::Context;
use deployment::Deployment;
use server::{DeploymentImpl, routes};
use services::services::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::log::init();

    let config = Config::from_env().context("invalid configuration")?;
    let address = config.bind_address();
    let deployment = DeploymentImpl::new(config)
        .await
        .context("failed to start deployment")?;

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, routes::router(deployment))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutting down");
}
