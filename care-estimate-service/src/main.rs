use anyhow::Context;
use care_estimate_service::{ServiceConfig, create_app, telemetry::init_tracing};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServiceConfig::from_env()?;
    let app = create_app(&config)?;

    let listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;
    let addr = listener.local_addr()?;

    info!("Care cost estimate service starting on {}", addr);
    info!("Health check endpoint: http://{}/health", addr);
    info!("Guided session endpoint: POST http://{}/api/wizard", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
