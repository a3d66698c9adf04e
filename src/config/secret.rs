//! Credential wrapper for configuration values
//!
//! The PostgreSQL connection string carries a password, so it is held in a
//! `secrecy::Secret` that zeroizes on drop and prints as `[REDACTED]`.
//! Reading it requires an explicit `expose_secret()`.
//!
//! ```rust
//! use nextmed::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let dsn = secret_string("postgresql://nextmed:pw@db:5432/nextmed".to_string());
//! assert!(!format!("{dsn:?}").contains("pw@"));
//! assert_eq!(
//!     dsn.expose_secret().redacted_authority(),
//!     "postgresql://***@db:5432/nextmed"
//! );
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String payload of a [`SecretString`]
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl std::fmt::Display for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// Connection string with the `user:password@` part masked
    ///
    /// Used when echoing database settings back to the operator.
    pub fn redacted_authority(&self) -> String {
        match self.0.rsplit_once('@') {
            Some((scheme_and_credentials, host)) => {
                let scheme = scheme_and_credentials
                    .split_once("://")
                    .map(|(scheme, _)| scheme)
                    .unwrap_or("postgresql");
                format!("{scheme}://***@{host}")
            }
            None => self.0.clone(),
        }
    }
}

impl Serialize for SecretValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// A zeroizing, debug-redacted string
pub type SecretString = Secret<SecretValue>;

#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}
