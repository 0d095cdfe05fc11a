//! Invoice records and snapshots
//!
//! An `InvoiceRecord` is one row of the dataset; a `Snapshot` is the full
//! ordered collection. Stores always read and write whole snapshots, never
//! deltas.

use super::ids::{InvoiceId, InvoiceNumber};
use super::status::InvoiceStatus;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One invoice as persisted
///
/// Invariant: `filed_date` is `Some` only when `status == Filed`. The
/// lifecycle engine is the only producer of new record states and upholds
/// this on every save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    /// Clinic-assigned id, immutable once set
    pub id: InvoiceId,

    /// Natural key
    pub invoice_number: InvoiceNumber,

    /// Invoice amount
    pub amount: Option<Decimal>,

    /// Insurer (EPS) code
    pub insurer_code: String,

    /// Coverage year (vigencia)
    pub coverage_year: Option<i32>,

    /// Workflow status
    pub status: InvoiceStatus,

    /// Date the invoice was filed with the insurer
    pub filed_date: Option<NaiveDate>,

    /// When the status last changed
    pub last_transition_at: Option<DateTime<Utc>>,

    /// Month label derived from `filed_date`, may be overridden by hand
    pub derived_month: String,

    /// Free text
    pub notes: String,
}

/// Caller-supplied attributes for one save
///
/// Everything the user may edit. The lifecycle engine copies these verbatim
/// and derives the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub invoice_number: InvoiceNumber,
    pub amount: Option<Decimal>,
    pub insurer_code: String,
    pub coverage_year: Option<i32>,
    pub status: InvoiceStatus,
    pub notes: String,
}

impl InvoiceDraft {
    /// Draft with only the key set and everything else empty
    pub fn new(invoice_number: InvoiceNumber) -> Self {
        Self {
            invoice_number,
            amount: None,
            insurer_code: String::new(),
            coverage_year: None,
            status: InvoiceStatus::Pending,
            notes: String::new(),
        }
    }

    /// Draft carrying a stored record's editable attributes with a new status
    pub fn from_record(record: &InvoiceRecord, status: InvoiceStatus) -> Self {
        Self {
            invoice_number: record.invoice_number.clone(),
            amount: record.amount,
            insurer_code: record.insurer_code.clone(),
            coverage_year: record.coverage_year,
            status,
            notes: record.notes.clone(),
        }
    }

    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_insurer(mut self, insurer_code: impl Into<String>) -> Self {
        self.insurer_code = insurer_code.into();
        self
    }

    pub fn with_coverage_year(mut self, year: i32) -> Self {
        self.coverage_year = Some(year);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// A merged-in record that had to give up an id already in use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdReassignment {
    pub invoice_number: InvoiceNumber,
    pub from: InvoiceId,
    pub to: InvoiceId,
}

/// The complete ordered set of invoice records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    records: Vec<InvoiceRecord>,
}

impl Snapshot {
    /// Creates an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps records in their stored order
    pub fn from_records(records: Vec<InvoiceRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[InvoiceRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<InvoiceRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Finds a record by natural key
    pub fn find(&self, key: &str) -> Option<&InvoiceRecord> {
        self.records
            .iter()
            .find(|r| r.invoice_number.as_str() == key.trim())
    }

    /// Whether a record with this natural key exists
    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Replaces the record with the same natural key, or appends it
    ///
    /// Returns `true` if an existing record was replaced.
    pub fn upsert(&mut self, record: InvoiceRecord) -> bool {
        match self
            .records
            .iter_mut()
            .find(|r| r.invoice_number == record.invoice_number)
        {
            Some(existing) => {
                *existing = record;
                true
            }
            None => {
                self.records.push(record);
                false
            }
        }
    }

    /// All ids currently present, including malformed ones
    pub fn ids(&self) -> impl Iterator<Item = &InvoiceId> {
        self.records.iter().map(|r| &r.id)
    }

    /// Merges records we don't hold from another snapshot
    ///
    /// Our records keep their order and win on key collisions; foreign
    /// records are appended in their own order. A foreign record whose id
    /// is already one of ours gets the next free id under the same prefix.
    pub fn merge_missing_from(&mut self, other: &Snapshot) -> Vec<IdReassignment> {
        let mut reassigned = Vec::new();
        for record in other.records() {
            if self.contains(record.invoice_number.as_str()) {
                continue;
            }
            let mut record = record.clone();
            if !record.id.is_empty() && self.records.iter().any(|r| r.id == record.id) {
                let prefix = record.id.prefix_and_suffix().map(|(p, _)| p.to_string());
                if let Some(prefix) = prefix {
                    let highest = self
                        .ids()
                        .chain(other.ids())
                        .filter_map(|id| id.numeric_suffix(&prefix))
                        .max()
                        .unwrap_or(0);
                    let to = InvoiceId::from_parts(&prefix, highest + 1);
                    let from = std::mem::replace(&mut record.id, to.clone());
                    reassigned.push(IdReassignment {
                        invoice_number: record.invoice_number.clone(),
                        from,
                        to,
                    });
                }
            }
            self.records.push(record);
        }
        reassigned
    }
}

impl FromIterator<InvoiceRecord> for Snapshot {
    fn from_iter<T: IntoIterator<Item = InvoiceRecord>>(iter: T) -> Self {
        Self::from_records(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, key: &str) -> InvoiceRecord {
        InvoiceRecord {
            id: InvoiceId::new(id),
            invoice_number: InvoiceNumber::new(key).unwrap(),
            amount: None,
            insurer_code: String::new(),
            coverage_year: None,
            status: InvoiceStatus::Pending,
            filed_date: None,
            last_transition_at: None,
            derived_month: String::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut snapshot = Snapshot::from_records(vec![record("CHIA-0001", "A"), record("CHIA-0002", "B")]);
        let mut changed = record("CHIA-0001", "A");
        changed.notes = "edited".to_string();

        assert!(snapshot.upsert(changed));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.records()[0].notes, "edited");
    }

    #[test]
    fn test_upsert_appends_unseen_key() {
        let mut snapshot = Snapshot::from_records(vec![record("CHIA-0001", "A")]);
        assert!(!snapshot.upsert(record("CHIA-0002", "B")));
        assert_eq!(snapshot.records()[1].invoice_number.as_str(), "B");
    }

    #[test]
    fn test_find_trims_key() {
        let snapshot = Snapshot::from_records(vec![record("CHIA-0001", "FAC-1")]);
        assert!(snapshot.find(" FAC-1 ").is_some());
        assert!(snapshot.find("FAC-2").is_none());
    }

    #[test]
    fn test_merge_missing_keeps_ours() {
        let mut ours = Snapshot::from_records(vec![record("CHIA-0001", "A")]);
        let mut theirs_a = record("CHIA-0001", "A");
        theirs_a.notes = "theirs".to_string();
        let theirs = Snapshot::from_records(vec![theirs_a, record("CHIA-0002", "B")]);

        ours.merge_missing_from(&theirs);

        assert_eq!(ours.len(), 2);
        assert_eq!(ours.find("A").unwrap().notes, "");
        assert!(ours.contains("B"));
    }

    #[test]
    fn test_merge_renumbers_foreign_record_with_our_id() {
        let mut ours = Snapshot::from_records(vec![
            record("CHIA-0001", "FAC-1"),
            record("CHIA-0002", "FAC-2"),
        ]);
        let theirs = Snapshot::from_records(vec![
            record("CHIA-0001", "FAC-1"),
            record("CHIA-0002", "FAC-7"),
            record("CHIA-0003", "FAC-8"),
        ]);

        let reassigned = ours.merge_missing_from(&theirs);

        assert_eq!(
            reassigned,
            vec![IdReassignment {
                invoice_number: InvoiceNumber::new("FAC-7").unwrap(),
                from: InvoiceId::new("CHIA-0002"),
                to: InvoiceId::new("CHIA-0004"),
            }]
        );
        let ids: Vec<&str> = ours.ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["CHIA-0001", "CHIA-0002", "CHIA-0004", "CHIA-0003"]);
    }
}
