//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the NextMed configuration file.

use crate::config::load_config;
use crate::config::schema::DatabaseTarget;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// Loading already runs substitution, overrides and validation, so a
    /// successful load means the file is valid.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2); // Configuration error exit code
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Bind Address: {}", config.server.bind_address);
        println!("  Max Upload: {} MB", config.server.max_upload_mb);
        println!("  AWS Region: {}", config.aws.region);
        println!("  Audio Bucket: {}", config.aws.bucket);
        println!("  Output Bucket: {}", config.output_bucket());
        println!(
            "  Transcription: {} / {} (poll {}s, timeout {}s)",
            config.transcription.language_code,
            config.transcription.media_format,
            config.transcription.poll_interval_seconds,
            config.transcription.job_timeout_seconds
        );
        println!("  Entities Region: {}", config.entities_region());
        println!("  Mapping Strategy: {}", config.mapping.strategy);

        match config.database_target {
            DatabaseTarget::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    println!("  Database Target: PostgreSQL");
                    println!(
                        "  PostgreSQL Connection: {}",
                        pg_config.connection_string.expose_secret().redacted_authority()
                    );
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
            }
            DatabaseTarget::Memory => {
                println!("  Database Target: in-memory (data is lost on restart)");
            }
        }
        println!();
        Ok(0)
    }
}
