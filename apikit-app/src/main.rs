//! # Apikit Server
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Open the credential file
//! - Register the demo endpoints
//! - Start the HTTP server

mod config;
mod routes;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use apikit_hex::{CredentialService, inbound::ApiBuilder};
use apikit_store::open_store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,apikit_app=debug,apikit_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Using credential file: {}", config.credentials_file.display());

    let store = open_store(&config.credentials_file).await?;
    let service = CredentialService::new(store);

    let mut api = ApiBuilder::new(service);
    api.configure(config.api.clone());
    routes::register(&mut api)?;

    if !api.wants_server() {
        tracing::info!("No route asked for the server to start, exiting");
        return Ok(());
    }

    tracing::info!("Starting {} on {}", config.api.title, config.addr());
    api.run(&config.addr()).await?;

    Ok(())
}
