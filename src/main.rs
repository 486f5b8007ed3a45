use std::sync::Arc;

use artsy_interactions::{
    api::{create_router, AppState},
    config::Config,
    services::JsonLinesSink,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("artsy_interactions=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Initialize application state
    let sink = Arc::new(JsonLinesSink::new(config.sink_dir.clone()));
    let addr = config.bind_addr();
    let state = AppState::new(sink, config);

    // Create the router with all routes
    let app = create_router(state);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
