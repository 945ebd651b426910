//! Storefront Server entry point.

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use storefront_server::config::Config;
use storefront_server::{AppState, ServiceState};

#[tokio::main]
async fn main() {
    let config = Config::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        body_limit = config.body_limit,
        request_timeout = config.request_timeout,
        "Storefront Server starting",
    );

    let http_config = match config.http_config() {
        Ok(http) => http,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(2);
        }
    };

    let service = match ServiceState::connect(&config.service_config()).await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    let state = AppState::new(service, http_config);
    let app = storefront_server::app(state);

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");

    tracing::info!(%addr, "Server running on port:{}", config.port);

    storefront_http::serve(listener, app, shutdown_signal()).await;

    tracing::info!("Storefront Server shut down");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install signal handler");
    tracing::info!("Shutdown signal received");
}
