//! Table-store row model
//!
//! Maps to the `inventario` table. Every column name is spelled out
//! explicitly; nothing relies on automatic case conversion.

use crate::domain::{InvoiceId, InvoiceNumber, InvoiceRecord, InvoiceStatus, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the hosted table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(rename = "id")]
    pub id: String,

    /// Primary key / upsert conflict target
    #[serde(rename = "invoice_number")]
    pub invoice_number: String,

    #[serde(rename = "amount", default)]
    pub amount: Option<Decimal>,

    #[serde(rename = "insurer_code", default)]
    pub insurer_code: Option<String>,

    #[serde(rename = "coverage_year", default)]
    pub coverage_year: Option<i32>,

    #[serde(rename = "status")]
    pub status: String,

    #[serde(rename = "filed_date", default)]
    pub filed_date: Option<NaiveDate>,

    #[serde(rename = "last_transition_at", default)]
    pub last_transition_at: Option<DateTime<Utc>>,

    #[serde(rename = "derived_month", default)]
    pub derived_month: Option<String>,

    #[serde(rename = "notes", default)]
    pub notes: Option<String>,
}

impl TableRow {
    /// Converts a domain record into a table row
    pub fn from_record(record: &InvoiceRecord) -> Self {
        Self {
            id: record.id.as_str().to_string(),
            invoice_number: record.invoice_number.as_str().to_string(),
            amount: record.amount,
            insurer_code: Some(record.insurer_code.clone()),
            coverage_year: record.coverage_year,
            status: record.status.as_str().to_string(),
            filed_date: record.filed_date,
            last_transition_at: record.last_transition_at,
            derived_month: Some(record.derived_month.clone()),
            notes: Some(record.notes.clone()),
        }
    }

    /// Converts a table row back into a domain record
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the key is blank or the status is unknown.
    pub fn into_record(self) -> Result<InvoiceRecord> {
        Ok(InvoiceRecord {
            id: InvoiceId::new(self.id),
            invoice_number: InvoiceNumber::new(self.invoice_number)?,
            amount: self.amount,
            insurer_code: self.insurer_code.unwrap_or_default(),
            coverage_year: self.coverage_year,
            status: InvoiceStatus::parse(&self.status)?,
            filed_date: self.filed_date,
            last_transition_at: self.last_transition_at,
            derived_month: self.derived_month.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
        })
    }
}
