//! Hosted spreadsheet backend
//!
//! The service has no partial upsert, so every write clears the worksheet
//! and appends the full snapshot in one atomic batch request guarded by the
//! sheet's revision id. A `409`/`412` means someone else wrote since our
//! revision was fetched: refetch the revision and the current rows, merge
//! the rows we don't hold (ours win on key collisions) and try again, up to
//! the retry budget.

use super::models::{BatchUpdateRequest, RevisionResponse, ValuesResponse};
use crate::adapters::storage::row::{record_from_cells, record_to_cells, HeaderIndex, RECORD_COLUMNS};
use crate::adapters::storage::traits::StorageBackend;
use crate::config::{BackendKind, SecretString, SpreadsheetConfig};
use crate::core::retry::{Clock, RetryPolicy, SystemClock};
use crate::domain::{InventoryError, InvoiceRecord, RemoteError, Result, Snapshot};
use crate::log_retry_attempt;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use secrecy::ExposeSecret;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

const BACKEND: &str = "spreadsheet";

/// Hosted spreadsheet backend
pub struct SpreadsheetBackend {
    client: Client,
    document_url: Url,
    worksheet: String,
    access_token: SecretString,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    /// Revision seen by the last read, used for the next write
    revision: Mutex<Option<String>>,
}

impl SpreadsheetBackend {
    /// Creates a backend that backs off on the real clock
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the base URL or HTTP client is invalid.
    pub fn new(config: &SpreadsheetConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a backend that backs off on `clock`
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the base URL or HTTP client is invalid.
    pub fn with_clock(config: &SpreadsheetConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(10)))
            .build()
            .map_err(|e| InventoryError::Configuration(format!("HTTP client: {e}")))?;

        let document_url = document_url(&config.base_url, &config.spreadsheet_id)?;

        Ok(Self {
            client,
            document_url,
            worksheet: config.worksheet.clone(),
            access_token: config.access_token.clone(),
            policy: RetryPolicy::from(&config.retry),
            clock,
            revision: Mutex::new(None),
        })
    }

    /// Revision remembered from the last read, if any
    pub fn remembered_revision(&self) -> Option<String> {
        self.revision_slot().clone()
    }

    fn revision_slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.revision.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn values_url(&self) -> Url {
        let mut url = self.document_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("values").push(&self.worksheet);
        }
        url
    }

    fn batch_update_url(&self) -> Url {
        let mut url = self.document_url.clone();
        let document = url
            .path_segments()
            .and_then(|mut s| s.next_back())
            .unwrap_or_default()
            .to_string();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop().push(&format!("{document}:batchUpdate"));
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> std::result::Result<Response, RemoteError> {
        let response = request
            .bearer_auth(self.access_token.expose_secret().as_ref())
            .send()
            .await
            .map_err(|e| RemoteError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::from_status(status.as_u16(), body));
        }
        Ok(response)
    }

    async fn fetch_revision(&self) -> std::result::Result<String, RemoteError> {
        let request = self
            .client
            .get(self.document_url.clone())
            .query(&[("fields", "revisionId")]);

        self.send(request)
            .await?
            .json::<RevisionResponse>()
            .await
            .map(|r| r.revision_id)
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }

    async fn fetch_rows(&self) -> std::result::Result<Vec<Vec<String>>, RemoteError> {
        self.send(self.client.get(self.values_url()))
            .await?
            .json::<ValuesResponse>()
            .await
            .map(ValuesResponse::into_text_rows)
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }

    /// Current revision and content, revision fetched first
    ///
    /// If a write lands between the two requests our revision is older than
    /// the rows; the next write then conflicts and merges again, which is
    /// safe.
    async fn fetch_state(&self) -> Result<(String, Snapshot)> {
        let revision = self
            .fetch_revision()
            .await
            .map_err(|e| e.into_inventory(BACKEND))?;
        let rows = self
            .fetch_rows()
            .await
            .map_err(|e| e.into_inventory(BACKEND))?;
        Ok((revision, decode_rows(rows)?))
    }

    async fn post_rewrite(
        &self,
        revision: &str,
        snapshot: &Snapshot,
    ) -> std::result::Result<(), RemoteError> {
        let body = BatchUpdateRequest::rewrite(revision, &self.worksheet, encode_rows(snapshot));
        let request = self.client.post(self.batch_update_url()).json(&body);
        self.send(request).await.map(|_| ())
    }

    /// Rewrites the sheet with `snapshot`, retrying on revision conflicts
    ///
    /// Without a remembered revision the current rows are fetched and merged
    /// first, so rows written by others are never dropped.
    async fn write_with_retry(&self, mut snapshot: Snapshot) -> Result<()> {
        let remembered = self.revision_slot().take();
        let mut revision = match remembered {
            Some(revision) => revision,
            None => {
                let (revision, current) = self.fetch_state().await?;
                merge_concurrent(&mut snapshot, &current);
                revision
            }
        };

        let mut attempt: u32 = 1;
        loop {
            match self.post_rewrite(&revision, &snapshot).await {
                Ok(()) => {
                    tracing::debug!(
                        backend = BACKEND,
                        records = snapshot.len(),
                        attempt,
                        "Rewrote worksheet"
                    );
                    return Ok(());
                }
                Err(e) if e.is_conflict() => {
                    if !self.policy.allows_another(attempt) {
                        tracing::error!(
                            backend = BACKEND,
                            attempts = attempt,
                            "Revision conflict persisted past retry budget"
                        );
                        return Err(InventoryError::ConflictRetryExhausted {
                            backend: BACKEND.to_string(),
                            attempts: attempt,
                        });
                    }

                    log_retry_attempt!(BACKEND, attempt, self.policy.max_attempts, e);
                    self.clock.sleep(self.policy.delay_for(attempt)).await;

                    let (fresh, current) = self.fetch_state().await?;
                    merge_concurrent(&mut snapshot, &current);
                    revision = fresh;
                    attempt += 1;
                }
                Err(e) => return Err(e.into_inventory(BACKEND)),
            }
        }
    }
}

#[async_trait]
impl StorageBackend for SpreadsheetBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Spreadsheet
    }

    async fn load(&self) -> Result<Snapshot> {
        let (revision, snapshot) = self.fetch_state().await?;
        tracing::debug!(
            backend = BACKEND,
            revision = %revision,
            records = snapshot.len(),
            "Loaded worksheet"
        );
        *self.revision_slot() = Some(revision);
        Ok(snapshot)
    }

    async fn upsert(&self, records: &[InvoiceRecord]) -> Result<()> {
        let (revision, mut snapshot) = self.fetch_state().await?;
        for record in records {
            snapshot.upsert(record.clone());
        }
        *self.revision_slot() = Some(revision);
        self.write_with_retry(snapshot).await
    }

    async fn replace_all(&self, snapshot: &Snapshot) -> Result<()> {
        self.write_with_retry(snapshot.clone()).await
    }
}

fn document_url(base_url: &str, spreadsheet_id: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| InventoryError::Configuration(format!("spreadsheet base_url: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| {
            InventoryError::Configuration(format!("spreadsheet base_url cannot be a base: {base_url}"))
        })?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", spreadsheet_id]);
    Ok(url)
}

/// Folds in rows another writer added since our copy was taken
fn merge_concurrent(snapshot: &mut Snapshot, current: &Snapshot) {
    for moved in snapshot.merge_missing_from(current) {
        tracing::warn!(
            backend = BACKEND,
            invoice_number = %moved.invoice_number,
            from = %moved.from,
            to = %moved.to,
            "Concurrent writer used the same id, renumbered their record"
        );
    }
}

fn encode_rows(snapshot: &Snapshot) -> Vec<Vec<String>> {
    let header = RECORD_COLUMNS.iter().map(|c| c.to_string()).collect();
    std::iter::once(header)
        .chain(snapshot.records().iter().map(record_to_cells))
        .collect()
}

fn decode_rows(rows: Vec<Vec<String>>) -> Result<Snapshot> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Ok(Snapshot::new());
    };
    let header = HeaderIndex::new(&header);

    let mut records = Vec::new();
    for (i, row) in rows.enumerate() {
        match record_from_cells(&header, &row) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {
                tracing::warn!(backend = BACKEND, row = i + 1, "Skipping row without invoice number");
            }
            Err(e) => {
                return Err(InventoryError::Serialization(format!(
                    "worksheet row {}: {e}",
                    i + 1
                )))
            }
        }
    }
    Ok(Snapshot::from_records(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_built_from_segments() {
        let url = document_url("https://sheets.example.com/", "abc123").unwrap();
        assert_eq!(url.as_str(), "https://sheets.example.com/v4/spreadsheets/abc123");
    }

    #[test]
    fn test_worksheet_name_is_escaped() {
        let config = SpreadsheetConfig {
            base_url: "https://sheets.example.com".to_string(),
            spreadsheet_id: "abc123".to_string(),
            worksheet: "inventario 2025".to_string(),
            access_token: crate::config::secret_string("token"),
            timeout_seconds: 5,
            retry: Default::default(),
        };
        let backend = SpreadsheetBackend::new(&config).unwrap();

        assert_eq!(
            backend.values_url().as_str(),
            "https://sheets.example.com/v4/spreadsheets/abc123/values/inventario%202025"
        );
        assert_eq!(
            backend.batch_update_url().as_str(),
            "https://sheets.example.com/v4/spreadsheets/abc123:batchUpdate"
        );
    }

    #[test]
    fn test_rows_round_through_header() {
        let rows = vec![
            vec!["invoiceNumber".to_string(), "status".to_string()],
            vec!["FAC-1".to_string(), "Pendiente".to_string()],
            vec![String::new(), "Filed".to_string()],
        ];
        let snapshot = decode_rows(rows).unwrap();
        assert_eq!(snapshot.len(), 1);

        let encoded = encode_rows(&snapshot);
        assert_eq!(encoded[0].len(), RECORD_COLUMNS.len());
        assert_eq!(encoded[1][5], "Pending");
    }
}
