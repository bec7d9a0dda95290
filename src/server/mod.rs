//! Stress Analytics HTTP server
//!
//! JSON API over the dataset, the training routine and the chart renderer.
//! Every endpoint recomputes from the data source; nothing is cached.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::{AppState, TrainedModel};

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use crate::data::{DataSource, SourceConfig};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Single allowed origin; `None` or `*` allows any
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            cors_origin: std::env::var("CORS_ORIGIN").ok().filter(|o| !o.is_empty()),
        }
    }
}

async fn shutdown_signal(started_at: chrono::DateTime<chrono::Utc>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install CTRL+C handler, running until killed");
        std::future::pending::<()>().await;
    }
    let stop_time = chrono::Utc::now();
    let uptime = stop_time.signed_duration_since(started_at);
    info!(
        stopped_at = %stop_time.to_rfc3339(),
        uptime_secs = uptime.num_seconds(),
        "Shutdown signal received, stopping server gracefully"
    );
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig, source: SourceConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    let data_source = DataSource::from_config(&source);
    info!(
        warehouse = %source.warehouse_path.display(),
        table = %source.table,
        fallback_csv = %source.fallback_csv.display(),
        "Data source configured"
    );

    let state = Arc::new(AppState::new(config.clone(), data_source, source.label_column.clone()));
    let app = create_router(Arc::clone(&state));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        address = %addr,
        label_column = %source.label_column,
        started_at = %start_time.to_rfc3339(),
        "Stress Analytics server starting"
    );
    info!(url = %format!("http://{}/api", addr), "REST API available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(start_time))
        .await?;

    state.shutdown();
    info!("Server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        if std::env::var("API_PORT").is_err() {
            assert_eq!(config.port, 5000);
        }
        assert!(!config.host.is_empty());
    }
}
