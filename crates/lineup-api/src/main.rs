use lineup_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    lineup_api::telemetry::init_telemetry();

    let (_state, router) = lineup_api::setup::initialize_app(config.clone()).await?;

    lineup_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
