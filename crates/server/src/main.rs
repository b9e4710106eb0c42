//! Knowledge-base gateway binary
//!
//! Serves the `search` and `fetch` tools behind bearer authentication and
//! per-client rate limiting.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A local .env is optional
    dotenvy::dotenv().ok();

    let config = ServerConfig::load()?;

    server::start_server(config).await?;

    Ok(())
}
