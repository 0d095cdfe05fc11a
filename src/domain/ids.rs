//! Domain identifier types with validation
//!
//! Newtype wrappers for the two identifiers every invoice carries: the
//! clinic-assigned `InvoiceId` (`<PREFIX>-NNNN`) and the natural key
//! `InvoiceNumber`.

use super::errors::InventoryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Clinic-assigned invoice identifier
///
/// Immutable once assigned. Well-formed ids look like `CHIA-0042`, but rows
/// loaded from storage may carry anything; malformed ids are kept verbatim
/// and simply ignored by the allocator.
///
/// # Examples
///
/// ```
/// use radicacion::domain::ids::InvoiceId;
///
/// let id = InvoiceId::from_parts("CHIA", 7);
/// assert_eq!(id.as_str(), "CHIA-0007");
/// assert_eq!(id.numeric_suffix("CHIA"), Some(7));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InvoiceId(String);

impl InvoiceId {
    /// Wraps a stored id without validating its shape
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds `<prefix>-NNNN`, zero-padded to at least 4 digits
    pub fn from_parts(prefix: &str, suffix: u64) -> Self {
        Self(format!("{prefix}-{suffix:04}"))
    }

    /// Numeric suffix if this id parses as `<prefix>-<digits>`
    pub fn numeric_suffix(&self, prefix: &str) -> Option<u64> {
        let digits = self.0.strip_prefix(prefix)?.strip_prefix('-')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Splits `<prefix>-<digits>` at the last dash
    pub fn prefix_and_suffix(&self) -> Option<(&str, u64)> {
        let (prefix, digits) = self.0.rsplit_once('-')?;
        if prefix.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some((prefix, digits.parse().ok()?))
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the stored id is blank
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for InvoiceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Invoice number, the natural key of the dataset
///
/// Unique within a snapshot and used as the upsert key by every backend.
/// Surrounding whitespace is trimmed; a blank number is rejected.
///
/// # Examples
///
/// ```
/// use radicacion::domain::ids::InvoiceNumber;
///
/// let number = InvoiceNumber::new("  FAC-1 ").unwrap();
/// assert_eq!(number.as_str(), "FAC-1");
/// assert!(InvoiceNumber::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    /// Creates a new InvoiceNumber, trimming whitespace
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Validation` on `invoiceNumber` if blank
    pub fn new(number: impl AsRef<str>) -> Result<Self, InventoryError> {
        let trimmed = number.as_ref().trim();
        if trimmed.is_empty() {
            return Err(InventoryError::validation(
                "invoiceNumber",
                "invoice number cannot be empty",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the invoice number as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InvoiceNumber {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for InvoiceNumber {
    type Error = InventoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InvoiceNumber> for String {
    fn from(number: InvoiceNumber) -> Self {
        number.0
    }
}

impl AsRef<str> for InvoiceNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
