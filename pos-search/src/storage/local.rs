//! Collection store kept in memory, optionally mirrored to a JSON file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};

use crate::domain::{Collection, Record, RecordId, Value};
use crate::error::{PosSearchError, Result};
use crate::ports::{CollectionStore, Snapshot};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CollectionData {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    records: Vec<Record>,
}

impl CollectionData {
    fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id == Some(id))
    }

    fn allocate_id(&mut self) -> RecordId {
        self.next_id = self.next_id.max(1);
        let id = RecordId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Assigns an id if the record has none, rejecting ids already in use.
    fn insert(&mut self, collection: Collection, mut record: Record) -> Result<RecordId> {
        let id = match record.id {
            Some(id) if self.position(id).is_some() => {
                return Err(PosSearchError::Store(format!(
                    "key {id} already exists in {collection}"
                )));
            }
            Some(id) => {
                self.next_id = self.next_id.max(id.get() + 1);
                id
            }
            None => self.allocate_id(),
        };
        record.id = Some(id);
        self.records.push(record);
        Ok(id)
    }

    fn repair_next_id(&mut self) {
        let max = self
            .records
            .iter()
            .filter_map(|r| r.id.map(RecordId::get))
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(max + 1);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    products: CollectionData,
    #[serde(default)]
    parties: CollectionData,
}

impl StoreData {
    const fn collection(&self, collection: Collection) -> &CollectionData {
        match collection {
            Collection::Products => &self.products,
            Collection::Parties => &self.parties,
        }
    }

    const fn collection_mut(&mut self, collection: Collection) -> &mut CollectionData {
        match collection {
            Collection::Products => &mut self.products,
            Collection::Parties => &mut self.parties,
        }
    }
}

pub struct LocalStore {
    path: Option<PathBuf>,
    data: Mutex<StoreData>,
    products_tx: watch::Sender<Snapshot>,
    parties_tx: watch::Sender<Snapshot>,
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self::with_data(None, StoreData::default())
    }

    /// Opens (or starts) a store persisted at `path`. A missing file is an
    /// empty store; it is created on the first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut data: StoreData = if path.is_file() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            StoreData::default()
        };
        for collection in Collection::ALL {
            data.collection_mut(collection).repair_next_id();
        }

        tracing::debug!(
            path = %path.display(),
            products = data.products.records.len(),
            parties = data.parties.records.len(),
            "Opened local store"
        );
        Ok(Self::with_data(Some(path.to_path_buf()), data))
    }

    fn with_data(path: Option<PathBuf>, data: StoreData) -> Self {
        let (products_tx, _) = watch::channel(Arc::new(data.products.records.clone()));
        let (parties_tx, _) = watch::channel(Arc::new(data.parties.records.clone()));
        Self {
            path,
            data: Mutex::new(data),
            products_tx,
            parties_tx,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn count(&self, collection: Collection) -> usize {
        self.data.lock().await.collection(collection).records.len()
    }

    const fn sender(&self, collection: Collection) -> &watch::Sender<Snapshot> {
        match collection {
            Collection::Products => &self.products_tx,
            Collection::Parties => &self.parties_tx,
        }
    }

    /// Applies `op` to one collection, persists, then publishes a snapshot.
    /// A failing `op` or write leaves the collection as it was.
    async fn mutate<T: Send>(
        &self,
        collection: Collection,
        op: impl FnOnce(&mut CollectionData) -> Result<T> + Send,
    ) -> Result<T> {
        let mut data = self.data.lock().await;
        let backup = data.collection(collection).clone();

        let out = match op(data.collection_mut(collection)) {
            Ok(out) => out,
            Err(e) => {
                *data.collection_mut(collection) = backup;
                return Err(e);
            }
        };

        if let Err(e) = self.persist(&data).await {
            tracing::warn!(%collection, error = %e, "Store write failed, rolling back");
            *data.collection_mut(collection) = backup;
            return Err(e);
        }

        let snapshot = Arc::new(data.collection(collection).records.clone());
        self.sender(collection).send_replace(snapshot);
        Ok(out)
    }

    async fn persist(&self, data: &StoreData) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(data)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for LocalStore {
    async fn get(&self, collection: Collection, id: RecordId) -> Result<Option<Record>> {
        let data = self.data.lock().await;
        let records = &data.collection(collection).records;
        Ok(records.iter().find(|r| r.id == Some(id)).cloned())
    }

    async fn add(&self, collection: Collection, record: Record) -> Result<RecordId> {
        self.mutate(collection, |c| c.insert(collection, record))
            .await
    }

    async fn update(
        &self,
        collection: Collection,
        id: RecordId,
        partial: IndexMap<String, Value>,
    ) -> Result<()> {
        self.mutate(collection, |c| {
            let pos = c
                .position(id)
                .ok_or(PosSearchError::RecordNotFound { collection, id })?;
            c.records[pos].merge(partial);
            Ok(())
        })
        .await
    }

    async fn put(&self, collection: Collection, record: Record) -> Result<RecordId> {
        self.mutate(collection, |c| {
            if let Some(id) = record.id
                && let Some(pos) = c.position(id)
            {
                c.records[pos] = record;
                return Ok(id);
            }
            c.insert(collection, record)
        })
        .await
    }

    async fn delete(&self, collection: Collection, id: RecordId) -> Result<()> {
        self.mutate(collection, |c| {
            let pos = c
                .position(id)
                .ok_or(PosSearchError::RecordNotFound { collection, id })?;
            c.records.remove(pos);
            Ok(())
        })
        .await
    }

    async fn bulk_add(
        &self,
        collection: Collection,
        records: Vec<Record>,
    ) -> Result<Vec<RecordId>> {
        let count = records.len();
        let ids = self
            .mutate(collection, |c| {
                records
                    .into_iter()
                    .map(|record| c.insert(collection, record))
                    .collect::<Result<Vec<_>>>()
            })
            .await?;
        tracing::debug!(%collection, count, "Bulk insert committed");
        Ok(ids)
    }

    fn observe(&self, collection: Collection) -> watch::Receiver<Snapshot> {
        self.sender(collection).subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn named(name: &str) -> Record {
        Record::new().with_field("name", name)
    }

    #[tokio::test]
    async fn test_add_assigns_sequential_ids() {
        let store = LocalStore::in_memory();
        let a = store.add(Collection::Products, named("A")).await.unwrap();
        let b = store.add(Collection::Products, named("B")).await.unwrap();
        let p = store.add(Collection::Parties, named("P")).await.unwrap();

        assert_eq!(a, RecordId::new(1));
        assert_eq!(b, RecordId::new(2));
        assert_eq!(p, RecordId::new(1));

        let stored = store.get(Collection::Products, b).await.unwrap().unwrap();
        assert_eq!(stored, named("B").with_id(b));
    }

    #[tokio::test]
    async fn test_observe_emits_after_each_mutation() {
        let store = LocalStore::in_memory();
        let mut rx = store.observe(Collection::Products);
        assert!(rx.borrow_and_update().is_empty());

        let id = store.add(Collection::Products, named("A")).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        store.delete(Collection::Products, id).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_empty());

        // other collections do not notify
        store.add(Collection::Parties, named("P")).await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_bulk_add_is_all_or_nothing() {
        let store = LocalStore::in_memory();
        let ids = store
            .bulk_add(Collection::Products, vec![named("A"), named("B"), named("C")])
            .await
            .unwrap();
        assert_eq!(ids, vec![RecordId::new(1), RecordId::new(2), RecordId::new(3)]);

        let clash = vec![named("D"), named("E").with_id(RecordId::new(2))];
        let err = store.bulk_add(Collection::Products, clash).await.unwrap_err();
        assert!(matches!(err, PosSearchError::Store(_)));
        assert_eq!(store.count(Collection::Products).await, 3);

        // the failed batch did not consume ids
        let next = store.add(Collection::Products, named("F")).await.unwrap();
        assert_eq!(next, RecordId::new(4));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = LocalStore::in_memory();
        let id = store
            .add(Collection::Products, named("Crocin").with_field("stock", 10.0))
            .await
            .unwrap();

        let mut partial = IndexMap::new();
        partial.insert("stock".to_string(), Value::Number(4.0));
        store.update(Collection::Products, id, partial).await.unwrap();

        let record = store.get(Collection::Products, id).await.unwrap().unwrap();
        assert_eq!(record.get("name"), Some(&Value::from("Crocin")));
        assert_eq!(record.get("stock"), Some(&Value::Number(4.0)));
    }

    #[tokio::test]
    async fn test_missing_ids_are_reported() {
        let store = LocalStore::in_memory();
        let missing = RecordId::new(99);

        let err = store
            .update(Collection::Parties, missing, IndexMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PosSearchError::RecordNotFound { id, .. } if id == missing));

        let err = store.delete(Collection::Parties, missing).await.unwrap_err();
        assert!(matches!(err, PosSearchError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn test_put_upserts() {
        let store = LocalStore::in_memory();
        let id = store.put(Collection::Products, named("A")).await.unwrap();
        store
            .put(Collection::Products, named("A2").with_id(id))
            .await
            .unwrap();
        let explicit = store
            .put(Collection::Products, named("Z").with_id(RecordId::new(10)))
            .await
            .unwrap();

        assert_eq!(store.count(Collection::Products).await, 2);
        let record = store.get(Collection::Products, id).await.unwrap().unwrap();
        assert_eq!(record.get("name"), Some(&Value::from("A2")));
        assert_eq!(explicit, RecordId::new(10));
        assert_eq!(
            store.add(Collection::Products, named("B")).await.unwrap(),
            RecordId::new(11)
        );
    }

    #[tokio::test]
    async fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = LocalStore::open(&path).unwrap();
            store
                .bulk_add(Collection::Products, vec![named("A"), named("B")])
                .await
                .unwrap();
            store.add(Collection::Parties, named("P")).await.unwrap();
        }

        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(reopened.count(Collection::Products).await, 2);
        assert_eq!(reopened.observe(Collection::Parties).borrow().len(), 1);
        let next = reopened.add(Collection::Products, named("C")).await.unwrap();
        assert_eq!(next, RecordId::new(3));
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("store.json");
        let store = LocalStore::open(&path).unwrap();
        let rx = store.observe(Collection::Products);

        assert!(store.add(Collection::Products, named("A")).await.is_err());
        assert_eq!(store.count(Collection::Products).await, 0);
        assert!(!rx.has_changed().unwrap());
    }
}
