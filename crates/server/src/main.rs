//! Triage Server - HTTP REST API for civic issue triage
//!
//! Binary entry point: loads configuration from `.env`, config files, and
//! environment variables, then runs the server until shutdown.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pull .env into the process environment before config loading
    dotenvy::dotenv().ok();

    // Load configuration
    let config = ServerConfig::load()?;

    // Start server
    server::start_server(config).await?;

    Ok(())
}
