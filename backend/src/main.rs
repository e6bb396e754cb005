use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use backend::config::Config;
use backend::store::RedisCollection;
use backend::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let state = match RedisCollection::connect(&config) {
        Ok(store) => AppState::new(Arc::new(store)),
        Err(e) => {
            tracing::warn!(error = %e, "store client failed to initialize; serving degraded");
            AppState::unavailable()
        }
    };

    let app = router(state, &config.static_dir);
    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str()).await?;
    tracing::info!(addr = %config.bind_addr, store = %config.redis_url, "task service listening");
    axum::serve(listener, app).await?;
    Ok(())
}
