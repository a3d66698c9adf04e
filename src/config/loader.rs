//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{DatabaseTarget, MappingStrategy, NextMedConfig};
use super::secret::secret_string;
use crate::domain::errors::NextMedError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into NextMedConfig
/// 4. Applies environment variable overrides (NEXTMED_* prefix)
/// 5. Validates the configuration
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use nextmed::config::loader::load_config;
///
/// let config = load_config("nextmed.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<NextMedConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(NextMedError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        NextMedError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config = parse_config(&contents)?;

    tracing::debug!(
        path = %path.display(),
        database_target = ?config.database_target,
        mapping_strategy = %config.mapping.strategy,
        "Configuration loaded"
    );

    Ok(config)
}

/// Parses configuration from TOML text
///
/// Performs the same substitution, override and validation steps as
/// [`load_config`].
///
/// # Errors
///
/// Returns an error if substitution, parsing or validation fails
pub fn parse_config(contents: &str) -> Result<NextMedConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: NextMedConfig = toml::from_str(&contents)
        .map_err(|e| NextMedError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        NextMedError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. All missing variables are reported
/// together.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| NextMedError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(NextMedError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.parse().map(Some).map_err(|_| {
            NextMedError::Configuration(format!("Invalid value '{val}' for {name}"))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using NEXTMED_* prefix
///
/// Environment variables follow the pattern: NEXTMED_<SECTION>_<KEY>,
/// for example NEXTMED_AWS_BUCKET or NEXTMED_TRANSCRIPTION_JOB_TIMEOUT_SECONDS.
fn apply_env_overrides(config: &mut NextMedConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("NEXTMED_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Server overrides
    if let Ok(val) = std::env::var("NEXTMED_SERVER_BIND_ADDRESS") {
        config.server.bind_address = val;
    }
    if let Some(secs) = env_parse("NEXTMED_SERVER_REQUEST_WAIT_SECONDS")? {
        config.server.request_wait_seconds = secs;
    }
    if let Some(mb) = env_parse("NEXTMED_SERVER_MAX_UPLOAD_MB")? {
        config.server.max_upload_mb = mb;
    }
    if let Ok(val) = std::env::var("NEXTMED_SERVER_CORS_ALLOWED_ORIGINS") {
        config.server.cors_allowed_origins = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    // AWS overrides
    if let Ok(val) = std::env::var("NEXTMED_AWS_REGION") {
        config.aws.region = val;
    }
    if let Ok(val) = std::env::var("NEXTMED_AWS_BUCKET") {
        config.aws.bucket = val;
    }
    if let Ok(val) = std::env::var("NEXTMED_AWS_ENDPOINT_URL") {
        config.aws.endpoint_url = Some(val);
    }

    // Transcription overrides
    if let Ok(val) = std::env::var("NEXTMED_TRANSCRIPTION_LANGUAGE_CODE") {
        config.transcription.language_code = val;
    }
    if let Ok(val) = std::env::var("NEXTMED_TRANSCRIPTION_MEDIA_FORMAT") {
        config.transcription.media_format = val;
    }
    if let Some(secs) = env_parse("NEXTMED_TRANSCRIPTION_POLL_INTERVAL_SECONDS")? {
        config.transcription.poll_interval_seconds = secs;
    }
    if let Some(secs) = env_parse("NEXTMED_TRANSCRIPTION_JOB_TIMEOUT_SECONDS")? {
        config.transcription.job_timeout_seconds = secs;
    }
    if let Ok(val) = std::env::var("NEXTMED_TRANSCRIPTION_OUTPUT_BUCKET") {
        config.transcription.output_bucket = Some(val);
    }

    // Entity extraction and mapping overrides
    if let Ok(val) = std::env::var("NEXTMED_ENTITIES_REGION") {
        config.entities.region = Some(val);
    }
    if let Ok(val) = std::env::var("NEXTMED_MAPPING_STRATEGY") {
        config.mapping.strategy = match val.to_lowercase().as_str() {
            "entity" => MappingStrategy::Entity,
            "regex" => MappingStrategy::Regex,
            other => {
                return Err(NextMedError::Configuration(format!(
                    "Invalid NEXTMED_MAPPING_STRATEGY '{other}'. Must be one of: entity, regex"
                )))
            }
        };
    }

    // Database overrides
    if let Ok(val) = std::env::var("NEXTMED_DATABASE_TARGET") {
        config.database_target = match val.to_lowercase().as_str() {
            "postgresql" => DatabaseTarget::PostgreSQL,
            "memory" => DatabaseTarget::Memory,
            other => {
                return Err(NextMedError::Configuration(format!(
                    "Invalid NEXTMED_DATABASE_TARGET '{other}'. Must be one of: postgresql, memory"
                )))
            }
        };
    }
    if let Some(ref mut pg_config) = config.postgresql {
        if let Ok(val) = std::env::var("NEXTMED_POSTGRESQL_CONNECTION_STRING") {
            pg_config.connection_string = secret_string(val);
        }
        if let Some(max) = env_parse("NEXTMED_POSTGRESQL_MAX_CONNECTIONS")? {
            pg_config.max_connections = max;
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("NEXTMED_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("NEXTMED_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
