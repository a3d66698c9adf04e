//! Serve command implementation
//!
//! Wires configuration, persistence and cloud services into the HTTP
//! service and runs it until a shutdown signal arrives.

use crate::adapters::factory::{create_cloud_services, create_database};
use crate::api::{self, AppState};
use crate::config::load_config;
use crate::core::pipeline::PipelineCoordinator;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override server.bind_address
    #[arg(short, long)]
    pub bind: Option<String>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Starting NextMed service");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        if let Some(ref bind) = self.bind {
            tracing::info!(bind_address = %bind, "Overriding bind address from CLI");
            config.server.bind_address = bind.clone();
            if let Err(e) = config.validate() {
                eprintln!("Configuration validation failed: {e}");
                return Ok(2);
            }
        }

        let database = match create_database(&config).await {
            Ok(db) => db,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize database");
                eprintln!("Failed to initialize database: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let cloud = create_cloud_services(&config).await;
        let coordinator = match PipelineCoordinator::from_config(&config, &cloud, database) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build pipeline");
                eprintln!("Failed to build pipeline: {e}");
                return Ok(2);
            }
        };

        let state = AppState::new(
            coordinator,
            Duration::from_secs(config.server.request_wait_seconds),
        );

        println!("🚀 NextMed listening on {}", config.server.bind_address);
        match api::serve(state, &config.server, shutdown_signal).await {
            Ok(()) => {
                println!("✅ NextMed stopped");
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, "HTTP server failed");
                eprintln!("HTTP server failed: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }
}
