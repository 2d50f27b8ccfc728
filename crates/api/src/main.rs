use anyhow::Context;

use atelier_api::{ApiConfig, app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    atelier_observability::init();

    let config = ApiConfig::from_env()?;
    let router = app::build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router).await?;
    Ok(())
}
