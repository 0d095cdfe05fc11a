//! Lifecycle transition engine
//!
//! Computes the next stored state of an invoice from its previous state (if
//! any), the caller's draft, an optional requested filed date, and the
//! current time. The engine is pure: it never touches storage and never
//! reads the clock itself.
//!
//! Rules applied on every save:
//! - `lastTransitionAt` moves to `now` only when the record is new or its
//!   status changed.
//! - `filedDate` is set only while `Filed`: a requested date wins, then the
//!   previous date, then `now`'s date. Any other status clears it.
//! - `derivedMonth` is recomputed only when `filedDate` is newly set or
//!   changed; otherwise the stored value is kept verbatim, including manual
//!   overrides and empty strings.
//! - `id` is allocated once, for new records, and never changes afterwards.
//! - Every editable attribute is copied from the draft unchanged.

use super::id_allocator::IdAllocator;
use crate::domain::ids::InvoiceId;
use crate::domain::invoice::{InvoiceDraft, InvoiceRecord};
use chrono::{DateTime, Datelike, NaiveDate, Utc};

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Month label stored in `derivedMonth`
pub fn month_name(date: NaiveDate) -> &'static str {
    MONTH_NAMES[date.month0() as usize]
}

/// Applies the lifecycle rules on every save
#[derive(Debug, Clone)]
pub struct TransitionEngine {
    allocator: IdAllocator,
}

impl TransitionEngine {
    pub fn new(id_prefix: impl Into<String>) -> Self {
        Self {
            allocator: IdAllocator::new(id_prefix),
        }
    }

    pub fn allocator(&self) -> &IdAllocator {
        &self.allocator
    }

    /// Computes the record to persist
    ///
    /// `existing_ids` must cover every id in the snapshot the result will be
    /// written into; it is only consulted for new records.
    ///
    /// # Examples
    ///
    /// ```
    /// use radicacion::core::lifecycle::TransitionEngine;
    /// use radicacion::domain::{InvoiceDraft, InvoiceNumber, InvoiceStatus};
    /// use chrono::{TimeZone, Utc};
    ///
    /// let engine = TransitionEngine::new("CHIA");
    /// let now = Utc.with_ymd_and_hms(2025, 8, 9, 10, 0, 0).unwrap();
    /// let draft = InvoiceDraft::new(InvoiceNumber::new("FAC-1").unwrap());
    ///
    /// let record = engine.transition(None, draft, None, std::iter::empty(), now);
    /// assert_eq!(record.id.as_str(), "CHIA-0001");
    /// assert_eq!(record.status, InvoiceStatus::Pending);
    /// assert_eq!(record.last_transition_at, Some(now));
    /// ```
    pub fn transition<'a>(
        &self,
        previous: Option<&InvoiceRecord>,
        draft: InvoiceDraft,
        requested_filed_date: Option<NaiveDate>,
        existing_ids: impl IntoIterator<Item = &'a InvoiceId>,
        now: DateTime<Utc>,
    ) -> InvoiceRecord {
        let status_changed = previous.map_or(true, |p| p.status != draft.status);

        // A date is only carried over while the record stays filed
        let previous_filed_date = previous
            .filter(|p| p.status.is_filed())
            .and_then(|p| p.filed_date);
        let filed_date = if draft.status.is_filed() {
            Some(
                requested_filed_date
                    .or(previous_filed_date)
                    .unwrap_or_else(|| now.date_naive()),
            )
        } else {
            None
        };

        let derived_month = match filed_date {
            Some(date) if filed_date != previous_filed_date => month_name(date).to_string(),
            _ => previous.map(|p| p.derived_month.clone()).unwrap_or_default(),
        };

        let last_transition_at = if status_changed {
            Some(now)
        } else {
            previous.and_then(|p| p.last_transition_at)
        };

        let id = match previous {
            Some(p) => p.id.clone(),
            None => self.allocator.next_id(existing_ids),
        };

        tracing::debug!(
            invoice_number = %draft.invoice_number,
            id = %id,
            status = %draft.status,
            is_new = previous.is_none(),
            status_changed,
            "Computed invoice transition"
        );

        InvoiceRecord {
            id,
            invoice_number: draft.invoice_number,
            amount: draft.amount,
            insurer_code: draft.insurer_code,
            coverage_year: draft.coverage_year,
            status: draft.status,
            filed_date,
            last_transition_at,
            derived_month,
            notes: draft.notes,
        }
    }
}
