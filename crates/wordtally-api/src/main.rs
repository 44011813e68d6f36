use wordtally_api::setup;
use wordtally_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (metadata store, storage, worker, routes)
    let app = setup::initialize_app(config.clone()).await?;

    // Start the server; the worker pool is drained after the listener stops
    setup::server::start_server(&config, app.router, app.worker).await?;

    Ok(())
}
