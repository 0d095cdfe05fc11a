//! Tabular row codec
//!
//! The local CSV file and the spreadsheet worksheet both store one header
//! row plus one row of text cells per record. This module owns that cell
//! format so both backends read and write identical text:
//!
//! - dates as `YYYY-MM-DD`
//! - timestamps as RFC 3339 UTC, second precision
//! - decimals in their canonical string form
//! - an empty cell for every null
//!
//! Decoding is keyed by header name, so column order in a hand-edited file
//! does not matter and unknown columns are ignored.

use crate::core::normalize::{parse_currency, parse_date, parse_timestamp, parse_year};
use crate::domain::{
    InventoryError, InvoiceId, InvoiceNumber, InvoiceRecord, InvoiceStatus, Result, Snapshot,
};
use chrono::SecondsFormat;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::str::FromStr;

/// Header row, in the order records are written
pub const RECORD_COLUMNS: [&str; 10] = [
    "id",
    "invoiceNumber",
    "amount",
    "insurerCode",
    "coverageYear",
    "status",
    "filedDate",
    "lastTransitionAt",
    "derivedMonth",
    "notes",
];

/// Encodes one record as cells in [`RECORD_COLUMNS`] order
pub fn record_to_cells(record: &InvoiceRecord) -> Vec<String> {
    vec![
        record.id.as_str().to_string(),
        record.invoice_number.as_str().to_string(),
        record.amount.map(|a| a.to_string()).unwrap_or_default(),
        record.insurer_code.clone(),
        record
            .coverage_year
            .map(|y| y.to_string())
            .unwrap_or_default(),
        record.status.as_str().to_string(),
        record
            .filed_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        record
            .last_transition_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default(),
        record.derived_month.clone(),
        record.notes.clone(),
    ]
}

/// Maps column names to positions for one header row
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new<S: AsRef<str>>(header: &[S]) -> Self {
        let positions = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_ref().trim().to_string(), i))
            .collect();
        Self { positions }
    }

    /// Structured cell (key, number, date, status) with padding removed
    fn cell<'a, S: AsRef<str>>(&self, row: &'a [S], column: &str) -> &'a str {
        self.text(row, column).trim()
    }

    /// Free-text cell exactly as stored
    fn text<'a, S: AsRef<str>>(&self, row: &'a [S], column: &str) -> &'a str {
        self.positions
            .get(column)
            .and_then(|&i| row.get(i))
            .map(|c| c.as_ref())
            .unwrap_or("")
    }
}

/// Decodes one row; `Ok(None)` for rows without an invoice number
///
/// # Errors
///
/// Returns `Validation` naming the column whose cell cannot be parsed.
pub fn record_from_cells<S: AsRef<str>>(
    header: &HeaderIndex,
    row: &[S],
) -> Result<Option<InvoiceRecord>> {
    let key = header.cell(row, "invoiceNumber");
    if key.is_empty() {
        return Ok(None);
    }

    let amount = optional(header.cell(row, "amount"), "amount", parse_amount)?;
    let coverage_year = optional(header.cell(row, "coverageYear"), "coverageYear", parse_year)?;
    let stored_filed_date = optional(header.cell(row, "filedDate"), "filedDate", parse_date)?;
    let last_transition_at = optional(
        header.cell(row, "lastTransitionAt"),
        "lastTransitionAt",
        parse_timestamp,
    )?;

    let status_text = header.cell(row, "status");
    let status = if status_text.is_empty() {
        InvoiceStatus::default()
    } else {
        InvoiceStatus::parse(status_text)?
    };

    // Older sheets kept the filing date after a record left Filed
    let filed_date = stored_filed_date.filter(|_| status.is_filed());
    if stored_filed_date.is_some() && filed_date.is_none() {
        tracing::debug!(
            invoice_number = key,
            status = %status,
            "Dropping filed date from unfiled record"
        );
    }

    Ok(Some(InvoiceRecord {
        id: InvoiceId::new(header.cell(row, "id")),
        invoice_number: InvoiceNumber::new(key)?,
        amount,
        insurer_code: header.text(row, "insurerCode").to_string(),
        coverage_year,
        status,
        filed_date,
        last_transition_at,
        derived_month: header.text(row, "derivedMonth").to_string(),
        notes: header.text(row, "notes").to_string(),
    }))
}

/// Canonical decimal first, then the locale format staff type by hand
fn parse_amount(text: &str) -> Option<Decimal> {
    Decimal::from_str(text).ok().or_else(|| parse_currency(text))
}

fn optional<T>(text: &str, field: &str, parse: impl Fn(&str) -> Option<T>) -> Result<Option<T>> {
    if text.is_empty() {
        return Ok(None);
    }
    parse(text)
        .map(Some)
        .ok_or_else(|| InventoryError::validation(field, format!("cannot parse '{text}'")))
}

/// Renders a snapshot as CSV bytes in the persisted format
///
/// Equal snapshots always render to identical bytes.
pub fn render_csv(snapshot: &Snapshot) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(RECORD_COLUMNS)?;
    for record in snapshot.records() {
        writer.write_record(record_to_cells(record))?;
    }

    writer
        .into_inner()
        .map_err(|e| InventoryError::Serialization(format!("CSV flush failed: {e}")))
}

/// Parses CSV bytes in the persisted format
///
/// # Errors
///
/// Returns `Serialization` naming the 1-based data row that failed.
pub fn parse_csv(bytes: &[u8]) -> Result<Snapshot> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let header = HeaderIndex::new(&reader.headers()?.iter().collect::<Vec<_>>());

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row?;
        let cells: Vec<&str> = row.iter().collect();
        match record_from_cells(&header, &cells) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {
                tracing::warn!(row = i + 1, "Skipping row without invoice number");
            }
            Err(e) => {
                return Err(InventoryError::Serialization(format!("row {}: {e}", i + 1)));
            }
        }
    }

    Ok(Snapshot::from_records(records))
}

/// SHA-256 of the canonical CSV rendering, hex-encoded
pub fn snapshot_checksum(snapshot: &Snapshot) -> Result<String> {
    let bytes = render_csv(snapshot)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
