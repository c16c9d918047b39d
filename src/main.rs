use std::error::Error;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env when present; a deployed
    // instance may configure itself through the real environment instead.
    let _ = dotenvy::dotenv();

    let default_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(llm_gateway::telemetry::env_filter_with_level(
            &default_level,
            Level::DEBUG,
        ))
        .with(llm_gateway::telemetry::fmt_layer())
        .init();

    api::start().await?;

    Ok(())
}
