mod error;
mod handlers;
mod setup;
mod state;

use cursus_core::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let (_state, router, _janitor) = setup::initialize_app(config.clone()).await?;

    setup::start_server(&config, router).await?;

    Ok(())
}
