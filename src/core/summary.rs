//! Inventory aggregates
//!
//! Totals the dashboard charts are drawn from. Computed from a loaded
//! snapshot; never writes.

use crate::domain::{InvoiceStatus, Snapshot};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Count and amount of one group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTotals {
    pub count: usize,
    /// Null amounts count as zero
    pub amount: Decimal,
    /// Amount of the group's filed records only
    pub filed_amount: Decimal,
}

impl GroupTotals {
    fn add(&mut self, amount: Decimal, filed: bool) {
        self.count += 1;
        self.amount += amount;
        if filed {
            self.filed_amount += amount;
        }
    }
}

/// Aggregates over one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySummary {
    pub total_records: usize,
    pub total_amount: Decimal,
    /// One entry per status in workflow order, zero counts included
    pub by_status: Vec<(InvoiceStatus, usize)>,
    /// Share of records that are filed, in percent, 2 decimals
    pub filed_percentage: Decimal,
    /// Keyed by insurer code; blank codes grouped under `""`
    pub by_insurer: BTreeMap<String, GroupTotals>,
    /// Keyed by coverage year; records without one under `None`
    pub by_coverage_year: BTreeMap<Option<i32>, GroupTotals>,
    /// Keyed by the stored month name; records without one under `""`
    pub by_month: BTreeMap<String, GroupTotals>,
}

impl InventorySummary {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut total_amount = Decimal::ZERO;
        let mut status_counts = [0usize; 4];
        let mut by_insurer: BTreeMap<String, GroupTotals> = BTreeMap::new();
        let mut by_coverage_year: BTreeMap<Option<i32>, GroupTotals> = BTreeMap::new();
        let mut by_month: BTreeMap<String, GroupTotals> = BTreeMap::new();

        for record in snapshot.records() {
            let amount = record.amount.unwrap_or(Decimal::ZERO);
            total_amount += amount;

            if let Some(i) = InvoiceStatus::ALL.iter().position(|s| *s == record.status) {
                status_counts[i] += 1;
            }

            let filed = record.status.is_filed();
            by_insurer
                .entry(record.insurer_code.trim().to_string())
                .or_default()
                .add(amount, filed);
            by_coverage_year
                .entry(record.coverage_year)
                .or_default()
                .add(amount, filed);
            by_month
                .entry(record.derived_month.trim().to_string())
                .or_default()
                .add(amount, filed);
        }

        let total_records = snapshot.len();
        let by_status: Vec<(InvoiceStatus, usize)> = InvoiceStatus::ALL
            .iter()
            .copied()
            .zip(status_counts)
            .collect();

        let filed = by_status
            .iter()
            .find(|(s, _)| s.is_filed())
            .map(|(_, n)| *n)
            .unwrap_or(0);
        let filed_percentage = if total_records == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(filed) * Decimal::ONE_HUNDRED / Decimal::from(total_records)).round_dp(2)
        };

        Self {
            total_records,
            total_amount,
            by_status,
            filed_percentage,
            by_insurer,
            by_coverage_year,
            by_month,
        }
    }

    /// Count for one status
    pub fn count(&self, status: InvoiceStatus) -> usize {
        self.by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InvoiceId, InvoiceNumber, InvoiceRecord};
    use std::str::FromStr;

    fn record(key: &str, status: InvoiceStatus, amount: Option<i64>, insurer: &str) -> InvoiceRecord {
        InvoiceRecord {
            id: InvoiceId::new(""),
            invoice_number: InvoiceNumber::new(key).unwrap(),
            amount: amount.map(Decimal::from),
            insurer_code: insurer.to_string(),
            coverage_year: if insurer == "EPS001" { Some(2024) } else { None },
            status,
            filed_date: None,
            last_transition_at: None,
            derived_month: String::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_summary_totals() {
        let snapshot = Snapshot::from_records(vec![
            record("FAC-1", InvoiceStatus::Filed, Some(1000), "EPS001"),
            record("FAC-2", InvoiceStatus::Pending, None, "EPS001"),
            record("FAC-3", InvoiceStatus::Audited, Some(500), "EPS002"),
        ]);

        let summary = InventorySummary::from_snapshot(&snapshot);

        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.total_amount, Decimal::from(1500));
        assert_eq!(summary.count(InvoiceStatus::Filed), 1);
        assert_eq!(summary.count(InvoiceStatus::Remediated), 0);
        assert_eq!(summary.by_status.len(), 4);
        assert_eq!(summary.filed_percentage, Decimal::from_str("33.33").unwrap());

        let eps1 = &summary.by_insurer["EPS001"];
        assert_eq!(eps1.count, 2);
        assert_eq!(eps1.amount, Decimal::from(1000));
        assert_eq!(summary.by_coverage_year[&None].count, 1);
        assert_eq!(summary.by_coverage_year[&Some(2024)].count, 2);
    }

    #[test]
    fn test_filed_amount_per_insurer_counts_filed_records_only() {
        let snapshot = Snapshot::from_records(vec![
            record("FAC-1", InvoiceStatus::Filed, Some(1000), "EPS001"),
            record("FAC-2", InvoiceStatus::Pending, Some(700), "EPS001"),
            record("FAC-3", InvoiceStatus::Filed, None, "EPS002"),
            record("FAC-4", InvoiceStatus::Audited, Some(300), "EPS002"),
        ]);

        let summary = InventorySummary::from_snapshot(&snapshot);

        assert_eq!(summary.by_insurer["EPS001"].amount, Decimal::from(1700));
        assert_eq!(summary.by_insurer["EPS001"].filed_amount, Decimal::from(1000));
        assert_eq!(summary.by_insurer["EPS002"].filed_amount, Decimal::ZERO);
    }

    #[test]
    fn test_records_grouped_by_month() {
        let month = |key: &str, name: &str| InvoiceRecord {
            derived_month: name.to_string(),
            ..record(key, InvoiceStatus::Filed, Some(100), "EPS001")
        };
        let snapshot = Snapshot::from_records(vec![
            month("FAC-1", "Julio"),
            month("FAC-2", "Agosto"),
            month("FAC-3", "Agosto"),
            record("FAC-4", InvoiceStatus::Pending, Some(50), "EPS001"),
        ]);

        let summary = InventorySummary::from_snapshot(&snapshot);

        assert_eq!(summary.by_month.len(), 3);
        assert_eq!(summary.by_month["Agosto"].count, 2);
        assert_eq!(summary.by_month["Agosto"].filed_amount, Decimal::from(200));
        assert_eq!(summary.by_month["Julio"].count, 1);
        assert_eq!(summary.by_month[""].count, 1);
        assert_eq!(summary.by_month[""].filed_amount, Decimal::ZERO);
    }

    #[test]
    fn test_empty_snapshot() {
        let summary = InventorySummary::from_snapshot(&Snapshot::new());
        assert_eq!(summary.total_records, 0);
        assert_eq!(summary.filed_percentage, Decimal::ZERO);
        assert!(summary.by_insurer.is_empty());
    }
}
