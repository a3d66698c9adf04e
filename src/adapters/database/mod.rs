//! Database abstraction layer
//!
//! This module provides a trait-based abstraction for persistence,
//! allowing NextMed to work with different backends (PostgreSQL, in-memory).

pub mod traits;

pub use traits::{
    Database, DoctorRepository, PatientRepository, TemplateRepository, TranscriptionRepository,
};
