//! Credential handling for remote storage backends
//!
//! API keys and access tokens are wrapped in `secrecy::Secret`, which zeroes
//! the memory on drop and redacts the value from `Debug` output. Code that
//! needs the raw value must call `expose_secret()` explicitly, which keeps
//! header construction the only place a credential is read.
//!
//! # Example
//!
//! ```rust
//! use radicacion::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let key = secret_string("service-role-key");
//! assert_eq!(key.expose_secret().as_ref(), "service-role-key");
//! assert!(!format!("{key:?}").contains("service-role-key"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String credential that implements the traits `Secret` requires
#[derive(Clone, Zeroize)]
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

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// Blank credentials are rejected by config validation
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Zeroizing, debug-redacted credential string
pub type SecretString = Secret<SecretValue>;

/// Wraps a plain string as a `SecretString`
#[inline]
pub fn secret_string(value: impl Into<String>) -> SecretString {
    Secret::new(SecretValue::from(value.into()))
}
