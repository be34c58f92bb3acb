use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{Collection, Product, RawRow, Record, RecordId};
use crate::error::{PosSearchError, Result};
use crate::ports::CollectionStore;
use crate::services::reconciler::HeaderReconciler;
use crate::services::sheet::{self, SheetFormat};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub ids: Vec<RecordId>,
}

/// Turns spreadsheet files into product records, committed in one batch.
pub struct ImportService<S: CollectionStore> {
    store: Arc<S>,
    reconciler: HeaderReconciler,
}

impl<S: CollectionStore> ImportService<S> {
    pub const fn new(store: Arc<S>, reconciler: HeaderReconciler) -> Self {
        Self { store, reconciler }
    }

    pub async fn import_file(&self, path: &Path) -> Result<ImportReport> {
        let bytes = tokio::fs::read(path).await?;
        let format = SheetFormat::from_path(path);
        tracing::info!(path = %path.display(), ?format, bytes = bytes.len(), "Reading spreadsheet");
        self.import_bytes(&bytes, format).await
    }

    pub async fn import_bytes(&self, bytes: &[u8], format: SheetFormat) -> Result<ImportReport> {
        let rows = sheet::read_rows_from_bytes(bytes, format)?;
        self.import_rows(&rows).await
    }

    pub fn reconcile_rows(&self, rows: &[RawRow]) -> Vec<Product> {
        rows.iter().map(|row| self.reconciler.reconcile(row)).collect()
    }

    /// Reconciles every row and inserts the products in a single bulk write.
    /// Nothing is written when the sheet has no data rows.
    pub async fn import_rows(&self, rows: &[RawRow]) -> Result<ImportReport> {
        if rows.is_empty() {
            return Err(PosSearchError::EmptyImport);
        }

        let records: Vec<Record> = self
            .reconcile_rows(rows)
            .into_iter()
            .map(Record::from)
            .collect();

        let ids = self.store.bulk_add(Collection::Products, records).await?;
        tracing::info!(inserted = ids.len(), "Imported products");

        Ok(ImportReport {
            inserted: ids.len(),
            ids,
        })
    }
}
