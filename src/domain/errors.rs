//! Domain error types
//!
//! This module defines the error hierarchy for the invoice inventory.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main inventory error type
///
/// Every fallible store, backend, and lifecycle operation returns this type.
/// Each variant is an explicit outcome the caller must handle; nothing in the
/// persistence path swallows an error that could hide an unpersisted change.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Malformed natural key or unparseable field, rejected before any store call
    #[error("Validation error in {field}: {message}")]
    Validation { field: String, message: String },

    /// Another local writer held the lock past the wait bound
    #[error("Timed out after {waited_ms}ms waiting for lock {path} (held by {holder})")]
    LockTimeout {
        path: String,
        waited_ms: u64,
        holder: String,
    },

    /// The backend reported success but the expected key is absent on reload
    #[error("Verification failed: invoice {invoice_number} not found in {backend} after save")]
    VerificationFailure {
        invoice_number: String,
        backend: String,
    },

    /// The backend is misconfigured or unreachable
    #[error("Backend {backend} unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },

    /// The remote revision token kept changing under us
    #[error("Backend {backend} still conflicting after {attempts} attempts")]
    ConflictRetryExhausted { backend: String, attempts: u32 },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl InventoryError {
    /// Shorthand for a validation error on a named field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an unavailable backend
    pub fn unavailable(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend: backend.into(),
            reason: reason.into(),
        }
    }

    /// Whether the record store may fall through to the next backend
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }
}

/// Remote service errors
///
/// Errors that occur when talking to the hosted table store or the hosted
/// spreadsheet service. These errors don't expose HTTP client types.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Failed to connect to the service
    #[error("Failed to connect: {0}")]
    ConnectionFailed(String),

    /// Credentials rejected (401/403)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Concurrency token no longer matches (409/412)
    #[error("Revision conflict: {0}")]
    RevisionConflict(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Body could not be decoded
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl RemoteError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::AuthenticationFailed(message),
            409 | 412 => Self::RevisionConflict(message),
            500..=599 => Self::ServerError { status, message },
            _ => Self::ClientError { status, message },
        }
    }

    /// Classify a transport failure
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::ConnectionFailed(err.to_string())
        }
    }

    /// Whether this is a stale-token conflict worth retrying
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::RevisionConflict(_))
    }

    /// Degrade into the inventory taxonomy for the named backend
    ///
    /// Every remote failure except a conflict becomes `BackendUnavailable`.
    /// Conflicts are resolved by the caller's retry loop and never reach here
    /// unless the budget is gone.
    pub fn into_inventory(self, backend: &str) -> InventoryError {
        InventoryError::unavailable(backend, self.to_string())
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for InventoryError {
    fn from(err: std::io::Error) -> Self {
        InventoryError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        InventoryError::Serialization(err.to_string())
    }
}

// Conversion from csv::Error
impl From<csv::Error> for InventoryError {
    fn from(err: csv::Error) -> Self {
        InventoryError::Serialization(format!("CSV error: {err}"))
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for InventoryError {
    fn from(err: toml::de::Error) -> Self {
        InventoryError::Configuration(format!("TOML parse error: {err}"))
    }
}
