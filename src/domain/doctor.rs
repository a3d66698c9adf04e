//! Doctor domain model
//!
//! Doctors are created out of band (see the `add-doctor` command) and are
//! referenced by templates and patients through their id.

use super::ids::DoctorId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a doctor account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoctorRole {
    /// Regular practitioner
    #[default]
    Doctor,
    /// Administrator
    Admin,
}

impl DoctorRole {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            DoctorRole::Doctor => "doctor",
            DoctorRole::Admin => "admin",
        }
    }
}

impl fmt::Display for DoctorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DoctorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "doctor" => Ok(DoctorRole::Doctor),
            "admin" => Ok(DoctorRole::Admin),
            other => Err(format!("Invalid role '{other}'. Must be one of: doctor, admin")),
        }
    }
}

/// A doctor account
///
/// The password hash is never serialized; API responses built from this
/// type cannot leak it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    /// Unique identifier
    pub id: DoctorId,

    /// Full name
    pub name: String,

    /// Login email, unique across doctors
    pub email: String,

    /// bcrypt hash of the password
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Hospital affiliation
    pub hospital: String,

    /// Account role
    #[serde(default)]
    pub role: DoctorRole,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Doctor {
    /// Creates a doctor with a fresh id; the email is lowercased
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        hospital: impl Into<String>,
        role: DoctorRole,
    ) -> Self {
        Self {
            id: DoctorId::new(),
            name: name.into(),
            email: email.into().trim().to_lowercase(),
            password_hash: password_hash.into(),
            hospital: hospital.into(),
            role,
            created_at: Utc::now(),
        }
    }

    /// Validates the account fields
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is blank or the email is malformed
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Doctor name is required".to_string());
        }
        if self.hospital.trim().is_empty() {
            return Err("Hospital is required".to_string());
        }
        let email_ok = self
            .email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !email_ok {
            return Err(format!("Invalid email address: {}", self.email));
        }
        if self.password_hash.is_empty() {
            return Err("Password hash is required".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_not_serialized() {
        let doctor = Doctor::new(
            "Dr. Ana Pop",
            "doctor1@testhospital.com",
            "$2b$10$abcdefghijklmnopqrstuv",
            "Test Hospital",
            DoctorRole::Doctor,
        );
        let json = serde_json::to_string(&doctor).unwrap();
        assert!(!json.contains("passwordHash"));
        assert!(!json.contains("$2b$10$"));
    }

    #[test]
    fn test_email_normalized() {
        let doctor = Doctor::new("A", " Doctor1@TestHospital.com ", "h", "H", DoctorRole::Admin);
        assert_eq!(doctor.email, "doctor1@testhospital.com");
        assert!(doctor.validate().is_ok());
    }

    #[test]
    fn test_invalid_email_rejected() {
        let doctor = Doctor::new("A", "not-an-email", "h", "H", DoctorRole::Doctor);
        assert!(doctor.validate().is_err());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("ADMIN".parse::<DoctorRole>().unwrap(), DoctorRole::Admin);
        assert!("nurse".parse::<DoctorRole>().is_err());
    }
}
