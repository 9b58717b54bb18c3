//! Eco-routing server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eco_server::api;
use eco_server::config::Config;
use eco_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("eco_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting eco-routing server...");

    let config = Config::from_env();
    config.validate()?;
    tracing::info!(
        "Road provider {} ({} ms), AQI provider {} ({} ms)",
        config.road_provider_url,
        config.road_timeout_ms,
        config.aqi_provider_url,
        config.aqi_timeout_ms
    );

    let port = config.server_port;
    let state = Arc::new(AppState::from_config(config)?);
    let app = api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
