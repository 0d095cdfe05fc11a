//! Batch mover
//!
//! Moves a selection of invoices to one target status. Every selected record
//! goes through the transition engine on a private copy of the snapshot, and
//! the result is persisted with a single store save. Atomicity of the batch
//! is the store's atomic write; there is no per-record round trip.

use crate::core::lifecycle::TransitionEngine;
use crate::core::retry::Clock;
use crate::core::store::{RecordStore, SaveOutcome};
use crate::domain::{InvoiceDraft, InvoiceNumber, InvoiceStatus, Result, Snapshot};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Result of applying a move in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// Snapshot with the selected records transitioned
    pub snapshot: Snapshot,
    /// Keys that were found and transitioned, in selection order
    pub moved: Vec<InvoiceNumber>,
    /// Selected keys not present in the snapshot
    pub missing: Vec<String>,
}

/// Summary of a persisted batch move
#[derive(Debug, Clone)]
pub struct MoveSummary {
    pub target: InvoiceStatus,
    pub moved: Vec<InvoiceNumber>,
    pub missing: Vec<String>,
    /// `None` when nothing was selected, in which case nothing was saved
    pub outcome: Option<SaveOutcome>,
}

impl MoveSummary {
    pub fn moved_count(&self) -> usize {
        self.moved.len()
    }
}

/// Transitions `keys` to `target` on a copy of `snapshot`
///
/// Entering `Filed` this way gets today's date; the caller picks a date
/// only through the single-invoice workflow. Duplicate keys are applied once.
pub fn plan_move(
    engine: &TransitionEngine,
    snapshot: &Snapshot,
    keys: &[&str],
    target: InvoiceStatus,
    now: DateTime<Utc>,
) -> MovePlan {
    let mut working = snapshot.clone();
    let mut moved = Vec::new();
    let mut missing = Vec::new();
    let mut seen = HashSet::new();

    for key in keys {
        let key = key.trim();
        if !seen.insert(key) {
            continue;
        }

        let Some(previous) = working.find(key).cloned() else {
            missing.push(key.to_string());
            continue;
        };

        let draft = InvoiceDraft::from_record(&previous, target);
        let next = engine.transition(Some(&previous), draft, None, std::iter::empty(), now);
        moved.push(next.invoice_number.clone());
        working.upsert(next);
    }

    MovePlan {
        snapshot: working,
        moved,
        missing,
    }
}

/// Applies batch moves and persists them through the record store
pub struct BatchMover {
    store: Arc<RecordStore>,
    engine: TransitionEngine,
    clock: Arc<dyn Clock>,
}

impl BatchMover {
    pub fn new(store: Arc<RecordStore>, engine: TransitionEngine, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            engine,
            clock,
        }
    }

    /// Moves `keys` of `snapshot` to `target` with exactly one save
    ///
    /// `snapshot` is normally the one the selection was made from. The save
    /// is verified with the first moved key.
    ///
    /// # Errors
    ///
    /// Returns any error of [`RecordStore::save`].
    pub async fn move_to(
        &self,
        snapshot: &Snapshot,
        keys: &[&str],
        target: InvoiceStatus,
    ) -> Result<MoveSummary> {
        let plan = plan_move(&self.engine, snapshot, keys, target, self.clock.now());

        if !plan.missing.is_empty() {
            tracing::warn!(
                missing = ?plan.missing,
                "Selected invoices not found in snapshot"
            );
        }

        let outcome = match plan.moved.first() {
            Some(first) => Some(self.store.save(&plan.snapshot, Some(first.as_str())).await?),
            None => None,
        };

        tracing::info!(
            target_status = %target,
            moved = plan.moved.len(),
            missing = plan.missing.len(),
            "Batch move complete"
        );

        Ok(MoveSummary {
            target,
            moved: plan.moved,
            missing: plan.missing,
            outcome,
        })
    }
}
