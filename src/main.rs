// src/main.rs
use rack_planner::config::AppConfig;
use rack_planner::{api, logging};

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();
    logging::init();

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            tracing::warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let optimizer_config = app_config.optimizer.clone();

    tracing::info!("🚀 Rack planner starting...");
    api::start_api_server(api_config, optimizer_config).await;
}
