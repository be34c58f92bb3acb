use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::watch;

use crate::domain::{Collection, Record, RecordId, Value};
use crate::error::Result;

/// The full contents of one collection as last emitted by the store.
pub type Snapshot = Arc<Vec<Record>>;

/// Record persistence, one keyspace per [`Collection`].
///
/// Every mutation is atomic on its own (per record, or per batch for
/// `bulk_add`) and causes `observe` receivers to see a fresh snapshot.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn get(&self, collection: Collection, id: RecordId) -> Result<Option<Record>>;
    async fn add(&self, collection: Collection, record: Record) -> Result<RecordId>;
    async fn update(
        &self,
        collection: Collection,
        id: RecordId,
        partial: IndexMap<String, Value>,
    ) -> Result<()>;
    async fn put(&self, collection: Collection, record: Record) -> Result<RecordId>;
    async fn delete(&self, collection: Collection, id: RecordId) -> Result<()>;
    async fn bulk_add(&self, collection: Collection, records: Vec<Record>)
    -> Result<Vec<RecordId>>;
    fn observe(&self, collection: Collection) -> watch::Receiver<Snapshot>;
}
