//! Hosted table-store backend
//!
//! Talks to a PostgREST-compatible REST endpoint. Upserts use the store's
//! native on-conflict merge keyed by `invoice_number`, and a whole batch
//! travels as one JSON array in one request, so the store applies it in a
//! single transaction.

use super::models::TableRow;
use crate::adapters::storage::traits::StorageBackend;
use crate::config::{BackendKind, SecretString, TableStoreConfig};
use crate::domain::{InventoryError, InvoiceRecord, RemoteError, Result, Snapshot};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use secrecy::ExposeSecret;
use std::time::Duration;

const BACKEND: &str = "table";

/// Hosted table backend
///
/// # Example
///
/// ```no_run
/// use radicacion::adapters::table::TableStoreBackend;
/// use radicacion::adapters::StorageBackend;
/// use radicacion::config::{secret_string, TableStoreConfig};
///
/// # async fn example() -> radicacion::domain::Result<()> {
/// let config = TableStoreConfig {
///     base_url: "https://project.supabase.co".to_string(),
///     api_key: secret_string("service-role-key"),
///     table: "inventario".to_string(),
///     timeout_seconds: 30,
/// };
///
/// let backend = TableStoreBackend::new(&config)?;
/// let snapshot = backend.load().await?;
/// println!("{} invoices", snapshot.len());
/// # Ok(())
/// # }
/// ```
pub struct TableStoreBackend {
    client: Client,
    endpoint: String,
    api_key: SecretString,
}

impl TableStoreBackend {
    /// Creates a backend from configuration
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the HTTP client cannot be built.
    pub fn new(config: &TableStoreConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(10)))
            .build()
            .map_err(|e| InventoryError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/rest/v1/{}",
                config.base_url.trim_end_matches('/'),
                config.table
            ),
            api_key: config.api_key.clone(),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.api_key.expose_secret().as_ref();
        request.header("apikey", key).bearer_auth(key)
    }

    async fn send(&self, request: RequestBuilder) -> std::result::Result<Response, RemoteError> {
        let response = self
            .authorize(request)
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

    async fn fetch_rows(&self) -> std::result::Result<Vec<TableRow>, RemoteError> {
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("select", "*"), ("order", "id.asc")]);

        self.send(request)
            .await?
            .json::<Vec<TableRow>>()
            .await
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }

    async fn post_rows(&self, rows: &[TableRow]) -> std::result::Result<(), RemoteError> {
        let request = self
            .client
            .post(&self.endpoint)
            .query(&[("on_conflict", "invoice_number")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);

        self.send(request).await.map(|_| ())
    }
}

#[async_trait]
impl StorageBackend for TableStoreBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Table
    }

    async fn load(&self) -> Result<Snapshot> {
        let rows = self
            .fetch_rows()
            .await
            .map_err(|e| e.into_inventory(BACKEND))?;

        tracing::debug!(backend = BACKEND, rows = rows.len(), "Fetched table rows");

        rows.into_iter()
            .map(TableRow::into_record)
            .collect::<Result<Vec<_>>>()
            .map(Snapshot::from_records)
            .map_err(|e| InventoryError::Serialization(format!("table row: {e}")))
    }

    async fn upsert(&self, records: &[InvoiceRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let rows: Vec<TableRow> = records.iter().map(TableRow::from_record).collect();
        self.post_rows(&rows)
            .await
            .map_err(|e| e.into_inventory(BACKEND))?;

        tracing::debug!(backend = BACKEND, rows = rows.len(), "Upserted table rows");
        Ok(())
    }

    /// Upserts every record of the snapshot in one request
    ///
    /// Records are never deleted by the save flow, so upserting the whole
    /// snapshot leaves the table equal to it.
    async fn replace_all(&self, snapshot: &Snapshot) -> Result<()> {
        self.upsert(snapshot.records()).await
    }
}
