// NextMed - Audio to Patient Record Extraction Service
// Copyright (c) 2025 NextMed Contributors
// Licensed under the MIT License

//! # NextMed - Audio to Patient Record Extraction
//!
//! NextMed turns a recorded doctor-patient consultation into a structured
//! patient record shaped by a doctor-chosen template.
//!
//! ## Overview
//!
//! An uploaded recording flows through:
//! - **Ingestion**: the audio is validated and stored in an object store
//! - **Transcription**: an asynchronous speech-to-text job is started and polled
//! - **Extraction**: medical entities are detected in the transcript
//! - **Mapping**: entities (or per-field patterns) fill the template's fields
//! - **Persistence**: the patient and its transcription record are saved together
//!
//! ## Architecture
//!
//! - [`api`] - HTTP routes, request parsing and error responses
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Pipeline, job registry, mapping and template management
//! - [`adapters`] - Object storage, transcription, entity extraction and databases
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`], whose error type
//! [`domain::NextMedError`] is mapped to HTTP statuses by [`api::ApiError`]:
//!
//! ```rust,no_run
//! use nextmed::domain::NextMedError;
//!
//! fn example() -> Result<(), NextMedError> {
//!     let config = nextmed::config::load_config("nextmed.toml")?;
//!     println!("Listening on {}", config.server.bind_address);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
