use std::net::SocketAddr;

use image_resizer_backend::{api, config::ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = ServiceConfig::from_env();
    let addr: SocketAddr = config.bind_address().parse()?;

    tracing::info!(
        "Cache capacity: {} entries, fetch limit: {} bytes, resize timeout: {:?}, key scheme: {:?}",
        config.cache_capacity,
        config.fetch_limit_bytes,
        config.resize_timeout(),
        config.key_scheme
    );

    // Build shared state and routes
    let state = api::AppState::from_config(config)?;
    let app = api::router(state);

    tracing::info!("🚀 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
