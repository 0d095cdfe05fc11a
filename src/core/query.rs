//! Status bucket queries
//!
//! Read-only view used by the dashboard: one status bucket, optionally
//! narrowed by insurer, coverage year and free-text search, newest
//! transition first, one page at a time.

use crate::domain::{InvoiceRecord, InvoiceStatus, Snapshot};
use std::cmp::Ordering;

/// Filter, sort and page over one status bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketQuery {
    pub status: InvoiceStatus,
    /// Exact insurer code
    pub insurer: Option<String>,
    pub coverage_year: Option<i32>,
    /// Case-insensitive substring of invoice number, insurer or notes
    pub search: Option<String>,
    /// 1-based; clamped into range
    pub page: usize,
    pub per_page: usize,
}

impl BucketQuery {
    pub fn new(status: InvoiceStatus) -> Self {
        Self {
            status,
            insurer: None,
            coverage_year: None,
            search: None,
            page: 1,
            per_page: 25,
        }
    }

    pub fn with_insurer(mut self, insurer: impl Into<String>) -> Self {
        self.insurer = Some(insurer.into());
        self
    }

    pub fn with_coverage_year(mut self, year: i32) -> Self {
        self.coverage_year = Some(year);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_page(mut self, page: usize, per_page: usize) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    fn matches(&self, record: &InvoiceRecord, needle: Option<&str>) -> bool {
        if record.status != self.status {
            return false;
        }
        if let Some(insurer) = self.insurer.as_deref() {
            if record.insurer_code.trim() != insurer.trim() {
                return false;
            }
        }
        if self.coverage_year.is_some() && record.coverage_year != self.coverage_year {
            return false;
        }
        match needle {
            Some(needle) => [
                record.invoice_number.as_str(),
                record.insurer_code.as_str(),
                record.notes.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(needle)),
            None => true,
        }
    }

    /// Runs the query against a snapshot
    pub fn run(&self, snapshot: &Snapshot) -> BucketPage {
        let needle = self
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut matching: Vec<&InvoiceRecord> = snapshot
            .records()
            .iter()
            .filter(|r| self.matches(r, needle.as_deref()))
            .collect();
        matching.sort_by(|a, b| newest_first(a, b));

        let per_page = self.per_page.max(1);
        let total_records = matching.len();
        let total_pages = total_records.div_ceil(per_page).max(1);
        let page = self.page.clamp(1, total_pages);

        let records = matching
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .cloned()
            .collect();

        BucketPage {
            records,
            page,
            per_page,
            total_records,
            total_pages,
        }
    }
}

/// Most recent transition first, records without one last, then by number
fn newest_first(a: &InvoiceRecord, b: &InvoiceRecord) -> Ordering {
    b.last_transition_at
        .cmp(&a.last_transition_at)
        .then_with(|| a.invoice_number.as_str().cmp(b.invoice_number.as_str()))
}

/// One page of a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketPage {
    pub records: Vec<InvoiceRecord>,
    /// Page actually served, after clamping
    pub page: usize,
    pub per_page: usize,
    pub total_records: usize,
    /// Never less than 1
    pub total_pages: usize,
}
