//! Invoice workflow status
//!
//! The four states of the filing workflow and the single parse table that
//! maps every accepted spelling onto them.

use super::errors::InventoryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workflow status of an invoice
///
/// There is no required ordering: any state may move to any other through an
/// explicit user action. New records start as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InvoiceStatus {
    /// Recorded, not yet reviewed
    #[default]
    Pending,
    /// Reviewed by the audit team
    Audited,
    /// Corrections applied after an audit
    Remediated,
    /// Formally submitted to the insurer
    Filed,
}

/// Accepted spellings, compared after trimming and lowercasing
const PARSE_TABLE: &[(&str, InvoiceStatus)] = &[
    ("pending", InvoiceStatus::Pending),
    ("pendiente", InvoiceStatus::Pending),
    ("pendientes", InvoiceStatus::Pending),
    ("audited", InvoiceStatus::Audited),
    ("auditada", InvoiceStatus::Audited),
    ("auditadas", InvoiceStatus::Audited),
    ("remediated", InvoiceStatus::Remediated),
    ("subsanada", InvoiceStatus::Remediated),
    ("subsanadas", InvoiceStatus::Remediated),
    ("filed", InvoiceStatus::Filed),
    ("radicada", InvoiceStatus::Filed),
    ("radicadas", InvoiceStatus::Filed),
];

impl InvoiceStatus {
    /// All states in workflow display order
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::Pending,
        InvoiceStatus::Audited,
        InvoiceStatus::Remediated,
        InvoiceStatus::Filed,
    ];

    /// Canonical storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Audited => "Audited",
            InvoiceStatus::Remediated => "Remediated",
            InvoiceStatus::Filed => "Filed",
        }
    }

    /// Parses any accepted spelling
    ///
    /// Unrecognised input is rejected; it is never defaulted to `Pending`.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Validation` on field `status`
    pub fn parse(input: &str) -> Result<Self, InventoryError> {
        let normalized = input.trim().to_lowercase();
        PARSE_TABLE
            .iter()
            .find(|(spelling, _)| *spelling == normalized)
            .map(|(_, status)| *status)
            .ok_or_else(|| {
                InventoryError::validation("status", format!("unrecognized status '{input}'"))
            })
    }

    /// Whether this status requires a filed date
    pub fn is_filed(&self) -> bool {
        *self == InvoiceStatus::Filed
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InvoiceStatus {
    type Error = InventoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InvoiceStatus> for String {
    fn from(status: InvoiceStatus) -> Self {
        status.as_str().to_string()
    }
}
