//! External system integrations for NextMed.
//!
//! This module provides adapters for integrating with external systems:
//!
//! - [`cloud`] - Object store, transcription and entity extraction traits
//! - [`aws`] - S3, Transcribe and Comprehend Medical implementations
//! - [`database`] - Persistence abstraction layer (trait-based)
//! - [`postgresql`] - PostgreSQL implementation
//! - [`memory`] - In-process implementation for development and tests
//! - [`factory`] - Builds adapters from configuration
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with fake implementations. SDK and driver error types are
//! converted to [`NextMedError`](crate::domain::NextMedError) at this boundary.
//!
//! # Example
//!
//! ```rust,no_run
//! use nextmed::adapters::factory::{create_cloud_services, create_database};
//! use nextmed::config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("nextmed.toml")?;
//! let database = create_database(&config).await?;
//! let cloud = create_cloud_services(&config).await;
//!
//! database.test_connection().await?;
//! println!("Audio bucket: {}", cloud.object_store.bucket());
//! # Ok(())
//! # }
//! ```

pub mod aws;
pub mod cloud;
pub mod database;
pub mod factory;
pub mod memory;
pub mod postgresql;
