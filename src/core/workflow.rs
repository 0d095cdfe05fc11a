//! Single-invoice save flow
//!
//! Form text is normalized into a typed draft, then load, find the previous
//! state by natural key, transition, place it in the snapshot and save with
//! verification on that key.

use crate::core::lifecycle::TransitionEngine;
use crate::core::normalize::{parse_currency, parse_date, parse_year};
use crate::core::retry::Clock;
use crate::core::store::{RecordStore, SaveOutcome};
use crate::domain::{
    InventoryError, InvoiceDraft, InvoiceNumber, InvoiceRecord, InvoiceStatus, Result,
};
use chrono::NaiveDate;
use std::sync::Arc;

/// Raw text as entered on the invoice form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceForm {
    pub invoice_number: String,
    /// Locale formatted, e.g. `$ 1.500.000,50`
    pub amount: String,
    pub insurer_code: String,
    pub coverage_year: String,
    /// Any accepted spelling; blank means `Pending`
    pub status: String,
    pub notes: String,
}

impl InvoiceForm {
    /// Normalizes the form into a draft
    ///
    /// Blank optional fields become null. Free text is taken verbatim.
    ///
    /// # Errors
    ///
    /// Returns `Validation` naming `invoiceNumber`, `amount`, `coverageYear`
    /// or `status`.
    pub fn to_draft(&self) -> Result<InvoiceDraft> {
        let invoice_number = InvoiceNumber::new(self.invoice_number.as_str())?;

        let amount = match self.amount.trim() {
            "" => None,
            text => Some(parse_currency(text).ok_or_else(|| {
                InventoryError::validation("amount", format!("cannot parse '{text}' as an amount"))
            })?),
        };

        let coverage_year = match self.coverage_year.trim() {
            "" => None,
            text => Some(parse_year(text).ok_or_else(|| {
                InventoryError::validation("coverageYear", format!("'{text}' is not a year"))
            })?),
        };

        let status = match self.status.trim() {
            "" => InvoiceStatus::default(),
            text => InvoiceStatus::parse(text)?,
        };

        Ok(InvoiceDraft {
            invoice_number,
            amount,
            insurer_code: self.insurer_code.trim().to_string(),
            coverage_year,
            status,
            notes: self.notes.clone(),
        })
    }
}

/// Parses an optional filed date typed on the form
///
/// # Errors
///
/// Returns `Validation` on field `filedDate` for non-blank unparseable text.
pub fn parse_filed_date(text: &str) -> Result<Option<NaiveDate>> {
    match text.trim() {
        "" => Ok(None),
        text => parse_date(text).map(Some).ok_or_else(|| {
            InventoryError::validation("filedDate", format!("cannot parse '{text}' as a date"))
        }),
    }
}

/// What a single save produced
#[derive(Debug, Clone)]
pub struct SavedInvoice {
    pub record: InvoiceRecord,
    pub created: bool,
    pub outcome: SaveOutcome,
}

/// Saves one invoice at a time
pub struct InvoiceWorkflow {
    store: Arc<RecordStore>,
    engine: TransitionEngine,
    clock: Arc<dyn Clock>,
}

impl InvoiceWorkflow {
    pub fn new(store: Arc<RecordStore>, engine: TransitionEngine, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            engine,
            clock,
        }
    }

    /// Validates the form, then saves it as [`save_draft`](Self::save_draft)
    ///
    /// # Errors
    ///
    /// Returns `Validation` before touching the store, or any store error.
    pub async fn save_invoice(
        &self,
        form: &InvoiceForm,
        requested_filed_date: Option<NaiveDate>,
    ) -> Result<SavedInvoice> {
        let draft = form.to_draft()?;
        self.save_draft(draft, requested_filed_date).await
    }

    /// Creates or updates the invoice keyed by the draft's number
    ///
    /// # Errors
    ///
    /// Returns any error of [`RecordStore::load`] or [`RecordStore::save`].
    pub async fn save_draft(
        &self,
        draft: InvoiceDraft,
        requested_filed_date: Option<NaiveDate>,
    ) -> Result<SavedInvoice> {
        let mut snapshot = self.store.load().await?;
        let previous = snapshot.find(draft.invoice_number.as_str()).cloned();
        let created = previous.is_none();

        let record = self.engine.transition(
            previous.as_ref(),
            draft,
            requested_filed_date,
            snapshot.ids(),
            self.clock.now(),
        );

        snapshot.upsert(record.clone());
        let outcome = self
            .store
            .save(&snapshot, Some(record.invoice_number.as_str()))
            .await?;

        tracing::info!(
            invoice_number = %record.invoice_number,
            id = %record.id,
            status = %record.status,
            created,
            save_status = %outcome.status,
            "Invoice saved"
        );

        Ok(SavedInvoice {
            record,
            created,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendKind;
    use crate::core::retry::ManualClock;
    use crate::core::store::testing::MemoryBackend;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn form(key: &str, status: &str) -> InvoiceForm {
        InvoiceForm {
            invoice_number: key.to_string(),
            status: status.to_string(),
            ..InvoiceForm::default()
        }
    }

    fn workflow() -> (InvoiceWorkflow, MemoryBackend, ManualClock) {
        let backend = MemoryBackend::new(BackendKind::Local);
        let store = Arc::new(RecordStore::new(vec![backend.boxed()]).unwrap());
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 8, 9, 10, 0, 0).unwrap());
        let workflow = InvoiceWorkflow::new(
            store,
            TransitionEngine::new("CHIA"),
            Arc::new(clock.clone()),
        );
        (workflow, backend, clock)
    }

    #[test]
    fn test_form_normalizes_fields() {
        let draft = InvoiceForm {
            invoice_number: " FAC-1 ".to_string(),
            amount: "$ 1.500.000,50".to_string(),
            insurer_code: " EPS001 ".to_string(),
            coverage_year: "2024".to_string(),
            status: "radicadas".to_string(),
            notes: " nota ".to_string(),
        }
        .to_draft()
        .unwrap();

        assert_eq!(draft.invoice_number.as_str(), "FAC-1");
        assert_eq!(draft.amount, Some(Decimal::new(150000050, 2)));
        assert_eq!(draft.insurer_code, "EPS001");
        assert_eq!(draft.coverage_year, Some(2024));
        assert_eq!(draft.status, InvoiceStatus::Filed);
        assert_eq!(draft.notes, " nota ");
    }

    #[test]
    fn test_form_errors_name_the_field() {
        let field_of = |form: InvoiceForm| match form.to_draft() {
            Err(InventoryError::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        };

        assert_eq!(field_of(form("  ", "")), "invoiceNumber");
        assert_eq!(
            field_of(InvoiceForm {
                amount: "mil pesos".to_string(),
                ..form("FAC-1", "")
            }),
            "amount"
        );
        assert_eq!(
            field_of(InvoiceForm {
                coverage_year: "20x4".to_string(),
                ..form("FAC-1", "")
            }),
            "coverageYear"
        );
        assert_eq!(field_of(form("FAC-1", "archivada")), "status");
    }

    #[test]
    fn test_parse_filed_date() {
        assert_eq!(parse_filed_date("").unwrap(), None);
        assert_eq!(
            parse_filed_date("30/07/2025").unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 30)
        );
        assert!(parse_filed_date("ayer").is_err());
    }

    #[tokio::test]
    async fn test_first_save_creates_record() {
        let (workflow, backend, _) = workflow();

        let saved = workflow
            .save_invoice(&form("FAC-1", "Pending"), None)
            .await
            .unwrap();

        assert!(saved.created);
        assert_eq!(saved.record.id.as_str(), "CHIA-0001");
        assert_eq!(saved.record.filed_date, None);
        assert_eq!(
            saved.record.last_transition_at,
            Some(Utc.with_ymd_and_hms(2025, 8, 9, 10, 0, 0).unwrap())
        );
        assert!(backend.snapshot().contains("FAC-1"));
    }

    #[tokio::test]
    async fn test_second_save_updates_same_record() {
        let (workflow, backend, clock) = workflow();
        workflow
            .save_invoice(&form("FAC-1", "Filed"), None)
            .await
            .unwrap();
        workflow
            .save_invoice(&form("FAC-2", "Pending"), None)
            .await
            .unwrap();
        let first = backend.snapshot().find("FAC-1").cloned().unwrap();

        clock.advance(Duration::from_secs(3600));
        let saved = workflow
            .save_invoice(
                &InvoiceForm {
                    notes: "entregada".to_string(),
                    ..form("FAC-1", "Radicada")
                },
                None,
            )
            .await
            .unwrap();

        assert!(!saved.created);
        assert_eq!(saved.record.id, first.id);
        assert_eq!(saved.record.filed_date, first.filed_date);
        assert_eq!(saved.record.last_transition_at, first.last_transition_at);
        assert_eq!(backend.snapshot().len(), 2);
        assert_eq!(backend.snapshot().find("FAC-2").unwrap().id.as_str(), "CHIA-0002");
    }

    #[tokio::test]
    async fn test_validation_failure_never_reaches_store() {
        let (workflow, backend, _) = workflow();

        let err = workflow
            .save_invoice(
                &InvoiceForm {
                    amount: "??".to_string(),
                    ..form("FAC-1", "")
                },
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, InventoryError::Validation { .. }));
        assert_eq!(backend.writes(), 0);
        assert_eq!(backend.loads(), 0);
    }
}
