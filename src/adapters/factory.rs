//! Adapter factory
//!
//! This module provides factory functions that build the persistence backend
//! and cloud collaborators from configuration.

use crate::adapters::aws::{self, ComprehendMedicalExtractor, S3ObjectStore, TranscribeBackend};
use crate::adapters::cloud::CloudServices;
use crate::adapters::database::traits::Database;
use crate::adapters::memory::MemoryDatabase;
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::{DatabaseTarget, NextMedConfig};
use crate::domain::{NextMedError, Result};
use std::sync::Arc;

/// Create a database backend based on the configuration
///
/// This factory function examines the `database_target` in the configuration
/// and creates the appropriate implementation. The schema is applied when
/// `postgresql.run_migrations` is set.
///
/// # Arguments
///
/// * `config` - The NextMed configuration
///
/// # Errors
///
/// Returns an error if the backend cannot be created or the schema cannot be applied
pub async fn create_database(config: &NextMedConfig) -> Result<Arc<dyn Database>> {
    match config.database_target {
        DatabaseTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                NextMedError::Configuration(
                    "postgresql configuration is required when database_target = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL client");
            let client = PostgreSQLClient::new(pg_config.clone())?;
            let adapter = PostgreSQLAdapter::new(client);

            if pg_config.run_migrations {
                adapter.ensure_schema().await?;
            }

            Ok(Arc::new(adapter) as Arc<dyn Database>)
        }
        DatabaseTarget::Memory => {
            tracing::warn!("Using in-memory database; records are lost on restart");
            Ok(Arc::new(MemoryDatabase::new()) as Arc<dyn Database>)
        }
    }
}

/// Create the AWS-backed cloud collaborators
///
/// All three clients share one SDK configuration; the entity extractor may
/// use a different region (`entities.region`).
///
/// # Arguments
///
/// * `config` - The NextMed configuration
pub async fn create_cloud_services(config: &NextMedConfig) -> CloudServices {
    let sdk_config = aws::load_sdk_config(&config.aws).await;

    CloudServices {
        object_store: Arc::new(S3ObjectStore::new(&sdk_config, &config.aws)),
        transcription: Arc::new(TranscribeBackend::new(&sdk_config, &config.aws)),
        entities: Arc::new(ComprehendMedicalExtractor::new(
            &sdk_config,
            &config.aws,
            &config.entities,
            config.entities_region(),
        )),
    }
}
