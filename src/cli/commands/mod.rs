//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod add_doctor;
pub mod init;
pub mod migrate;
pub mod serve;
pub mod validate;
