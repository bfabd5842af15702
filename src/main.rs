//! # Playtime Client
//!
//! Runs one pay-per-second play session against the game backend.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - HTTP adapters and the play session controller

use anyhow::Result;
use tracing::info;

use playtime_client::config::Settings;
use playtime_client::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // LOG_FORMAT=json switches to machine-readable logs
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => playtime_client::telemetry::init_json_tracing(),
        _ => playtime_client::telemetry::init_tracing(),
    }

    info!("Starting Playtime Client...");

    let settings = Settings::load()?;
    info!(
        base_url = %settings.api.base_url(),
        heartbeat_secs = settings.session.heartbeat_interval_secs,
        environment = %settings.environment,
        "Configuration loaded"
    );

    let application = Application::build(settings)?;
    application.run_until_stopped().await?;

    info!("Playtime Client exited");
    Ok(())
}
