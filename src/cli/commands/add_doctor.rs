//! Add-doctor command implementation
//!
//! Doctor accounts have no HTTP registration route; operators create them
//! here. The password is hashed with bcrypt before it reaches the store.

use crate::adapters::database::{Database, DoctorRepository};
use crate::adapters::factory::create_database;
use crate::config::load_config;
use crate::domain::{Doctor, DoctorRole, NextMedError};
use clap::Args;
use std::sync::Arc;

/// bcrypt work factor for stored passwords
pub const PASSWORD_HASH_COST: u32 = 10;

/// Arguments for the add-doctor command
#[derive(Args, Debug)]
pub struct AddDoctorArgs {
    /// Full name
    #[arg(long)]
    pub name: String,

    /// Login email
    #[arg(long)]
    pub email: String,

    /// Hospital affiliation
    #[arg(long)]
    pub hospital: String,

    /// Account role (doctor or admin)
    #[arg(long, default_value = "doctor")]
    pub role: String,

    /// Account password
    #[arg(long, env = "NEXTMED_DOCTOR_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl AddDoctorArgs {
    /// Execute the add-doctor command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(email = %self.email, "Adding doctor account");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let database = match create_database(&config).await {
            Ok(db) => db,
            Err(e) => {
                eprintln!("Failed to connect to database: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        self.create(database).await
    }

    /// Build, validate and store the account
    pub(crate) async fn create(&self, database: Arc<dyn Database>) -> anyhow::Result<i32> {
        let role: DoctorRole = match self.role.parse() {
            Ok(r) => r,
            Err(e) => {
                println!("❌ {e}");
                return Ok(2);
            }
        };

        if self.password.len() < 8 {
            println!("❌ Password must be at least 8 characters");
            return Ok(2);
        }

        let hash = bcrypt::hash(&self.password, PASSWORD_HASH_COST)?;
        let doctor = Doctor::new(&self.name, &self.email, hash, &self.hospital, role);
        if let Err(e) = doctor.validate() {
            println!("❌ {e}");
            return Ok(2);
        }

        match database.insert_doctor(&doctor).await {
            Ok(()) => {
                tracing::info!(doctor_id = %doctor.id, role = %doctor.role, "Doctor account created");
                println!("✅ Doctor created");
                println!("   ID: {}", doctor.id);
                println!("   Email: {}", doctor.email);
                println!("   Role: {}", doctor.role);
                Ok(0)
            }
            Err(NextMedError::Conflict(msg)) => {
                println!("❌ {msg}");
                Ok(1)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to store doctor account");
                println!("❌ Failed to store doctor account: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryDatabase;

    fn args(email: &str, password: &str) -> AddDoctorArgs {
        AddDoctorArgs {
            name: "Dr. Ana Pop".to_string(),
            email: email.to_string(),
            hospital: "Test Hospital".to_string(),
            role: "doctor".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_creates_doctor_with_hashed_password() {
        let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
        let code = args("Ana@Example.org", "correct horse")
            .create(db.clone())
            .await
            .unwrap();
        assert_eq!(code, 0);

        let stored = db
            .find_doctor_by_email("ana@example.org")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.password_hash, "correct horse");
        assert!(bcrypt::verify("correct horse", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
        assert_eq!(args("ana@example.org", "correct horse").create(db.clone()).await.unwrap(), 0);
        assert_eq!(args("ana@example.org", "another pass").create(db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
        assert_eq!(args("ana@example.org", "short").create(db).await.unwrap(), 2);
    }
}
