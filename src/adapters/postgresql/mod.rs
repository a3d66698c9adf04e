//! PostgreSQL database integration
//!
//! This module provides integration with PostgreSQL for storing
//! doctors, templates, patients and transcription records.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
pub use models::{PostgreSQLDoctor, PostgreSQLPatient, PostgreSQLTemplate, PostgreSQLTranscription};
