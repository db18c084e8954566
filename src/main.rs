// src/main.rs
use box_sizer::api::{self, ApiState};
use box_sizer::catalog::Catalog;
use box_sizer::config::AppConfig;
use box_sizer::inventory::BoxInventory;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            tracing::warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let selector_config = app_config.selector.selector_config();

    tracing::info!("🚀 Box sizing service starting...");

    let catalog = match app_config.data.catalog_path() {
        Some(path) => match Catalog::from_json_file(path) {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::error!("❌ {}", err);
                std::process::exit(1);
            }
        },
        None => Catalog::builtin().clone(),
    };

    let inventory = match BoxInventory::from_json_file(app_config.data.boxes_path()) {
        Ok(inventory) => inventory,
        Err(err) => {
            tracing::error!("❌ {}", err);
            std::process::exit(1);
        }
    };

    let skipped = inventory.skipped();
    tracing::info!(
        catalog_items = catalog.len(),
        boxes = inventory.len(),
        unavailable = skipped.unavailable,
        malformed = skipped.malformed,
        slack_factor = selector_config.slack_factor,
        parallel = selector_config.parallel_evaluation,
        "📋 Reference data loaded"
    );
    if inventory.is_empty() {
        tracing::warn!("⚠️ Box inventory is empty. Every request will report no feasible box.");
    }

    let state = ApiState::new(catalog, inventory, selector_config);
    if let Err(err) = api::start_api_server(api_config, state).await {
        tracing::error!("❌ Server error: {}", err);
        std::process::exit(1);
    }
}
