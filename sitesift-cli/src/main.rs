//! Entry point for the sitesift command-line interface.
#![forbid(unsafe_code)]

use env_logger::Env;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    sitesift_cli::run().await?;
    Ok(())
}
