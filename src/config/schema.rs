//! Configuration schema types
//!
//! This module defines the configuration structure for NextMed.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Database target selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseTarget {
    /// PostgreSQL database
    PostgreSQL,
    /// In-process store, data is lost on restart
    Memory,
}

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Field mapping strategy
///
/// Exactly one strategy is active per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MappingStrategy {
    /// Entity-type slots plus field-name containment matching
    #[default]
    Entity,
    /// Per-field regular expressions over the normalized transcript
    Regex,
}

impl fmt::Display for MappingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingStrategy::Entity => f.write_str("entity"),
            MappingStrategy::Regex => f.write_str("regex"),
        }
    }
}

/// Main NextMed configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextMedConfig {
    /// Application-level settings
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// AWS account settings shared by storage, transcription and entity extraction
    pub aws: AwsConfig,

    /// Transcription job settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Entity extraction settings
    #[serde(default)]
    pub entities: EntitiesConfig,

    /// Field mapping settings
    #[serde(default)]
    pub mapping: MappingConfig,

    /// Database target (postgresql or memory)
    pub database_target: DatabaseTarget,

    /// PostgreSQL configuration (required if database_target = postgresql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgresql: Option<PostgreSQLConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NextMedConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.server.validate(&self.environment)?;
        self.aws.validate(&self.environment)?;
        self.transcription.validate()?;
        self.entities.validate()?;

        match self.database_target {
            DatabaseTarget::PostgreSQL => {
                if let Some(ref config) = self.postgresql {
                    config.validate()?;
                } else {
                    return Err(
                        "postgresql configuration is required when database_target = 'postgresql'"
                            .to_string(),
                    );
                }
            }
            DatabaseTarget::Memory => {
                if self.environment == Environment::Production {
                    return Err(
                        "database_target = 'memory' is not allowed in production environments"
                            .to_string(),
                    );
                }
            }
        }

        self.logging.validate()?;
        Ok(())
    }

    /// Bucket that receives transcription result artifacts
    pub fn output_bucket(&self) -> &str {
        self.transcription
            .output_bucket
            .as_deref()
            .unwrap_or(&self.aws.bucket)
    }

    /// Region used for the entity recognition service
    pub fn entities_region(&self) -> &str {
        self.entities.region.as_deref().unwrap_or(&self.aws.region)
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// How long an upload request waits for its pipeline job before
    /// answering 202 with the job id
    #[serde(default = "default_request_wait_seconds")]
    pub request_wait_seconds: u64,

    /// Maximum accepted audio upload size
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,

    /// Finished jobs older than this are dropped from the job registry
    #[serde(default = "default_job_retention_minutes")]
    pub job_retention_minutes: u64,
}

impl ServerConfig {
    fn validate(&self, environment: &Environment) -> Result<(), String> {
        self.bind_address
            .parse::<std::net::SocketAddr>()
            .map_err(|e| format!("Invalid server.bind_address '{}': {}", self.bind_address, e))?;

        if self.max_upload_mb == 0 || self.max_upload_mb > 500 {
            return Err(format!(
                "server.max_upload_mb must be between 1 and 500, got {}",
                self.max_upload_mb
            ));
        }

        if self.job_retention_minutes == 0 {
            return Err("server.job_retention_minutes must be > 0".to_string());
        }

        if *environment == Environment::Production && self.cors_allowed_origins.is_empty() {
            return Err(
                "server.cors_allowed_origins must list explicit origins in production environments"
                    .to_string(),
            );
        }

        Ok(())
    }

    /// Upload limit in bytes
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            request_wait_seconds: default_request_wait_seconds(),
            max_upload_mb: default_max_upload_mb(),
            cors_allowed_origins: Vec::new(),
            job_retention_minutes: default_job_retention_minutes(),
        }
    }
}

/// AWS configuration
///
/// Credentials are resolved by the AWS default provider chain
/// (`AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`, profile, instance role).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// AWS region
    #[serde(default = "default_aws_region")]
    pub region: String,

    /// Bucket for uploaded audio
    pub bucket: String,

    /// Custom endpoint (e.g. LocalStack); `None` uses the AWS endpoints
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Path-style bucket addressing, needed by most S3-compatible stores
    #[serde(default)]
    pub force_path_style: bool,
}

impl AwsConfig {
    fn validate(&self, environment: &Environment) -> Result<(), String> {
        if self.region.trim().is_empty() {
            return Err("aws.region cannot be empty".to_string());
        }

        validate_bucket_name("aws.bucket", &self.bucket)?;

        if let Some(ref endpoint) = self.endpoint_url {
            let parsed = url::Url::parse(endpoint)
                .map_err(|e| format!("Invalid aws.endpoint_url '{endpoint}': {e}"))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err("aws.endpoint_url must start with http:// or https://".to_string());
            }
            if *environment == Environment::Production && parsed.scheme() != "https" {
                return Err(
                    "aws.endpoint_url must use https:// in production environments".to_string(),
                );
            }
        }

        Ok(())
    }
}

/// Transcription job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Language code passed with every job
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Expected media encoding of uploaded audio
    #[serde(default = "default_media_format")]
    pub media_format: String,

    /// Delay between job status polls
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,

    /// Upper bound on the wait for a job to finish
    #[serde(default = "default_job_timeout_seconds")]
    pub job_timeout_seconds: u64,

    /// Bucket for result artifacts; defaults to `aws.bucket`
    #[serde(default)]
    pub output_bucket: Option<String>,
}

impl TranscriptionConfig {
    fn validate(&self) -> Result<(), String> {
        let language = regex::Regex::new(r"^[a-z]{2}-[A-Z]{2}$")
            .map_err(|e| format!("Invalid language code pattern: {e}"))?;
        if !language.is_match(&self.language_code) {
            return Err(format!(
                "Invalid transcription.language_code '{}'. Expected a code like en-US",
                self.language_code
            ));
        }

        let valid_formats = ["mp3", "mp4", "wav", "flac", "ogg", "amr", "webm", "m4a"];
        if !valid_formats.contains(&self.media_format.as_str()) {
            return Err(format!(
                "Invalid transcription.media_format '{}'. Must be one of: {}",
                self.media_format,
                valid_formats.join(", ")
            ));
        }

        if self.poll_interval_seconds == 0 {
            return Err("transcription.poll_interval_seconds must be > 0".to_string());
        }

        if self.job_timeout_seconds < self.poll_interval_seconds {
            return Err(format!(
                "transcription.job_timeout_seconds ({}) must be >= poll_interval_seconds ({})",
                self.job_timeout_seconds, self.poll_interval_seconds
            ));
        }

        if let Some(ref bucket) = self.output_bucket {
            validate_bucket_name("transcription.output_bucket", bucket)?;
        }

        Ok(())
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            language_code: default_language_code(),
            media_format: default_media_format(),
            poll_interval_seconds: default_poll_interval_seconds(),
            job_timeout_seconds: default_job_timeout_seconds(),
            output_bucket: None,
        }
    }
}

/// Entity extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EntitiesConfig {
    /// Region override; the medical entity service is only offered in some regions
    #[serde(default)]
    pub region: Option<String>,

    /// Entities scoring below this are discarded
    #[serde(default)]
    pub min_score: f32,
}

impl EntitiesConfig {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref region) = self.region {
            if region.trim().is_empty() {
                return Err("entities.region cannot be empty when set".to_string());
            }
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(format!(
                "entities.min_score must be between 0.0 and 1.0, got {}",
                self.min_score
            ));
        }
        Ok(())
    }
}

/// Field mapping configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MappingConfig {
    /// Active mapping strategy
    #[serde(default)]
    pub strategy: MappingStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgreSQLConfig {
    pub connection_string: SecretString,

    #[serde(default = "default_pg_max_connections")]
    pub max_connections: usize,

    #[serde(default = "default_pg_connection_timeout_seconds")]
    pub connection_timeout_seconds: u64,

    #[serde(default = "default_pg_statement_timeout_seconds")]
    pub statement_timeout_seconds: u64,

    /// Apply the bundled schema on startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl PostgreSQLConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        let conn_str: &str = self.connection_string.expose_secret().as_ref();

        if conn_str.is_empty() {
            return Err("postgresql.connection_string cannot be empty".to_string());
        }

        if !conn_str.starts_with("postgresql://") && !conn_str.starts_with("postgres://") {
            return Err(
                "postgresql.connection_string must start with postgresql:// or postgres://"
                    .to_string(),
            );
        }

        if self.max_connections == 0 || self.max_connections > 100 {
            return Err(format!(
                "postgresql.max_connections must be between 1 and 100, got {}",
                self.max_connections
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    #[serde(default = "default_local_path")]
    pub local_path: String,

    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    /// Emit JSON on the console instead of human-readable lines
    #[serde(default)]
    pub console_json: bool,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled = true".to_string());
        }

        Ok(())
    }

    /// Console-only logging, used by CLI commands before a config is loaded
    pub fn console_only() -> Self {
        Self {
            local_enabled: false,
            local_path: String::new(),
            local_rotation: default_local_rotation(),
            console_json: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            console_json: false,
        }
    }
}

fn validate_bucket_name(key: &str, bucket: &str) -> Result<(), String> {
    if bucket.len() < 3 || bucket.len() > 63 {
        return Err(format!(
            "{key} must be between 3 and 63 characters, got '{bucket}'"
        ));
    }
    if !bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(format!(
            "{key} may only contain lowercase letters, digits, '-' and '.', got '{bucket}'"
        ));
    }
    Ok(())
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_request_wait_seconds() -> u64 {
    30
}

fn default_max_upload_mb() -> usize {
    50
}

fn default_job_retention_minutes() -> u64 {
    60
}

fn default_aws_region() -> String {
    "us-east-1".to_string()
}

fn default_language_code() -> String {
    "en-US".to_string()
}

fn default_media_format() -> String {
    "mp3".to_string()
}

fn default_poll_interval_seconds() -> u64 {
    5
}

fn default_job_timeout_seconds() -> u64 {
    600
}

fn default_pg_max_connections() -> usize {
    10
}

fn default_pg_connection_timeout_seconds() -> u64 {
    30
}

fn default_pg_statement_timeout_seconds() -> u64 {
    60
}

fn default_local_path() -> String {
    "/var/log/nextmed".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret::secret_string;

    fn aws() -> AwsConfig {
        AwsConfig {
            region: "us-east-1".to_string(),
            bucket: "nextmed-audio".to_string(),
            endpoint_url: None,
            force_path_style: false,
        }
    }

    fn base_config() -> NextMedConfig {
        NextMedConfig {
            application: ApplicationConfig::default(),
            environment: Environment::Development,
            server: ServerConfig::default(),
            aws: aws(),
            transcription: TranscriptionConfig::default(),
            entities: EntitiesConfig::default(),
            mapping: MappingConfig::default(),
            database_target: DatabaseTarget::Memory,
            postgresql: None,
            logging: LoggingConfig::console_only(),
        }
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_config_is_valid() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_postgresql_required_for_postgresql_target() {
        let mut config = base_config();
        config.database_target = DatabaseTarget::PostgreSQL;
        let err = config.validate().unwrap_err();
        assert!(err.contains("postgresql configuration is required"));

        config.postgresql = Some(PostgreSQLConfig {
            connection_string: secret_string("postgresql://u:p@localhost/nextmed".to_string()),
            max_connections: 10,
            connection_timeout_seconds: 30,
            statement_timeout_seconds: 60,
            run_migrations: true,
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_memory_target_rejected_in_production() {
        let mut config = base_config();
        config.environment = Environment::Production;
        config.server.cors_allowed_origins = vec!["https://app.example.com".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.contains("not allowed in production"));
    }

    #[test]
    fn test_transcription_validation() {
        let mut config = TranscriptionConfig::default();
        assert!(config.validate().is_ok());

        config.language_code = "english".to_string();
        assert!(config.validate().is_err());

        config.language_code = "en-US".to_string();
        config.media_format = "aiff".to_string();
        assert!(config.validate().is_err());

        config.media_format = "wav".to_string();
        config.poll_interval_seconds = 0;
        assert!(config.validate().is_err());

        config.poll_interval_seconds = 10;
        config.job_timeout_seconds = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bucket_name_validation() {
        let mut aws = aws();
        aws.bucket = "Invalid_Bucket".to_string();
        assert!(aws.validate(&Environment::Development).is_err());

        aws.bucket = "ab".to_string();
        assert!(aws.validate(&Environment::Development).is_err());
    }

    #[test]
    fn test_endpoint_url_must_be_https_in_production() {
        let mut aws = aws();
        aws.endpoint_url = Some("http://localhost:4566".to_string());
        assert!(aws.validate(&Environment::Development).is_ok());
        assert!(aws.validate(&Environment::Production).is_err());

        aws.endpoint_url = Some("not a url".to_string());
        assert!(aws.validate(&Environment::Development).is_err());
    }

    #[test]
    fn test_output_bucket_falls_back_to_audio_bucket() {
        let mut config = base_config();
        assert_eq!(config.output_bucket(), "nextmed-audio");

        config.transcription.output_bucket = Some("nextmed-transcripts".to_string());
        assert_eq!(config.output_bucket(), "nextmed-transcripts");
    }

    #[test]
    fn test_entities_region_override() {
        let mut config = base_config();
        config.aws.region = "eu-west-1".to_string();
        assert_eq!(config.entities_region(), "eu-west-1");

        config.entities.region = Some("us-east-1".to_string());
        assert_eq!(config.entities_region(), "us-east-1");
    }

    #[test]
    fn test_server_validation() {
        let mut server = ServerConfig::default();
        assert!(server.validate(&Environment::Development).is_ok());
        assert!(server.validate(&Environment::Production).is_err());

        server.bind_address = "localhost".to_string();
        assert!(server.validate(&Environment::Development).is_err());

        server.bind_address = "127.0.0.1:8080".to_string();
        server.max_upload_mb = 0;
        assert!(server.validate(&Environment::Development).is_err());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(config.local_enabled);
        assert_eq!(config.local_path, "/var/log/nextmed");
        assert_eq!(config.local_rotation, "daily");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mapping_strategy_default() {
        assert_eq!(MappingConfig::default().strategy, MappingStrategy::Entity);
        let parsed: MappingConfig = toml::from_str("strategy = \"regex\"").unwrap();
        assert_eq!(parsed.strategy, MappingStrategy::Regex);
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_language_code(), "en-US");
        assert_eq!(default_media_format(), "mp3");
        assert_eq!(default_poll_interval_seconds(), 5);
        assert_eq!(default_job_timeout_seconds(), 600);
        assert_eq!(default_bind_address(), "0.0.0.0:3000");
    }
}
