//! COVID-19 Dashboard Server
//!
//! Run with: cargo run --bin covid-dashboard
//!
//! # Configuration
//!
//! See `covid-dashboard-cli config` for the config file. Environment:
//! - `COVID_DASHBOARD_*`: override config values
//! - `APP_MODE_ENV=TEST`: prepare the data once, log the result and exit
//! - `RUST_LOG`: Log filter (default: covid_dashboard=info,tower_http=debug)

use covid_dashboard::api::{serve, ApiConfig, AppState};
use covid_dashboard::config::{app_test_mode, Config, LoggingConfig};
use covid_dashboard::service::DashboardService;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("covid_dashboard={},tower_http=debug", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();
    init_tracing(&config.logging);

    tracing::info!("Starting COVID-19 dashboard v{}", env!("CARGO_PKG_VERSION"));

    let service = Arc::new(DashboardService::from_config(&config).await?);

    if app_test_mode() {
        tracing::info!("Test App Preparation OK.");
        return Ok(());
    }

    Arc::clone(&service).start_background_refresh(config.data.refresh_interval_minutes);

    let api_config = ApiConfig::from(&config.server);
    let state = AppState::new(service);

    tracing::info!("Starting server on {}", api_config.addr());
    serve(state, &api_config).await?;

    tracing::info!("Dashboard server stopped");
    Ok(())
}
