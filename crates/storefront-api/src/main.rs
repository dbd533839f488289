use storefront_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    storefront_api::telemetry::init_telemetry(config.is_production())?;
    tracing::info!(environment = %config.server.environment, "Configuration loaded and validated");

    let (_state, router) = storefront_api::setup::initialize_app(config.clone()).await?;

    storefront_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
