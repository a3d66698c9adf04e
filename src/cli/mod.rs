//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for NextMed using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// NextMed - Audio to Patient Record Extraction Service
#[derive(Parser, Debug)]
#[command(name = "nextmed")]
#[command(version, about, long_about = None)]
#[command(author = "NextMed Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "nextmed.toml", env = "NEXTMED_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "NEXTMED_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service
    Serve(commands::serve::ServeArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Create a doctor account
    AddDoctor(commands::add_doctor::AddDoctorArgs),

    /// Apply the database schema and seed default templates
    Migrate(commands::migrate::MigrateArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_serve() {
        let cli = Cli::parse_from(["nextmed", "serve"]);
        assert_eq!(cli.config, "nextmed.toml");
        assert!(matches!(cli.command, Commands::Serve(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["nextmed", "--config", "custom.toml", "serve"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["nextmed", "--log-level", "debug", "serve"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["nextmed", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_add_doctor() {
        let cli = Cli::parse_from([
            "nextmed",
            "add-doctor",
            "--name",
            "Dr. Jane Smith",
            "--email",
            "jane@example.org",
            "--hospital",
            "St. Mary",
            "--password",
            "correct horse",
        ]);
        match cli.command {
            Commands::AddDoctor(args) => {
                assert_eq!(args.email, "jane@example.org");
                assert_eq!(args.role, "doctor");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_migrate() {
        let cli = Cli::parse_from(["nextmed", "migrate", "--no-seed"]);
        assert!(matches!(cli.command, Commands::Migrate(ref a) if a.no_seed));
    }
}
