use persona_agent::{api::start_server, Orchestrator, Settings};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env()?;

    info!("Persona Agent - API Server");
    info!("Port: {}", settings.port);

    let orchestrator = Arc::new(Orchestrator::from_settings(&settings)?);

    info!("Starting API server...");

    start_server(orchestrator, settings.port).await?;

    Ok(())
}
