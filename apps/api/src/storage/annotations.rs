//! Durable annotation records.
//!
//! All records share one flat collection in a single slot; there is no per-image
//! partitioning at the storage layer, so `list` filters by image id at read time.
//! Every mutating call is one read-modify-write under the store lock followed by
//! a single atomic slot replace.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::models::annotation::Annotation;
use crate::storage::slots::SlotStore;
use crate::storage::StorageError;

pub const ANNOTATIONS_SLOT: &str = "proofsnap_annotations";

pub struct AnnotationStore {
    slots: Arc<dyn SlotStore>,
    write_lock: Mutex<()>,
    closed: AtomicBool,
}

impl AnnotationStore {
    /// Opens the store over a slot medium. An unreadable medium is logged, not fatal:
    /// reads will come back empty until it recovers.
    pub async fn open(slots: Arc<dyn SlotStore>) -> Self {
        let store = Self {
            slots,
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        };
        match store.read_all().await {
            Ok(records) => info!(records = records.len(), "Annotation store opened"),
            Err(e) => warn!("Annotation store opened but storage is unavailable: {e}"),
        }
        store
    }

    /// Closes the store. Subsequent reads return nothing and writes fail with `Closed`.
    pub async fn close(&self) {
        let _guard = self.write_lock.lock().await;
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Annotation store closed");
        }
    }

    /// Returns the annotations for one image in insertion (chronological) order.
    pub async fn list(&self, image_id: &str) -> Vec<Annotation> {
        self.load_or_empty()
            .await
            .into_iter()
            .filter(|a| a.image_id == image_id)
            .collect()
    }

    pub async fn get(&self, id: &str) -> Option<Annotation> {
        self.load_or_empty().await.into_iter().find(|a| a.id == id)
    }

    /// Whether a record with this id has been persisted.
    pub async fn contains(&self, id: &str) -> bool {
        self.get(id).await.is_some()
    }

    /// Appends a new record. Does not check for an existing record with the same id.
    pub async fn save(&self, annotation: &Annotation) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut all = self.load_for_write().await?;
        all.push(annotation.clone());
        self.write_all(&all).await
    }

    /// Replaces the record with the same id in place, or appends it when absent.
    pub async fn upsert(&self, annotation: &Annotation) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut all = self.load_for_write().await?;
        match all.iter_mut().find(|a| a.id == annotation.id) {
            Some(existing) => *existing = annotation.clone(),
            None => all.push(annotation.clone()),
        }
        self.write_all(&all).await
    }

    /// Removes a record by id. Absent ids are a no-op.
    pub async fn delete(&self, id: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut all = self.load_for_write().await?;
        let before = all.len();
        all.retain(|a| a.id != id);
        if all.len() == before {
            return Ok(());
        }
        self.write_all(&all).await
    }

    // ────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ────────────────────────────────────────────────────────────────────────

    async fn read_all(&self) -> Result<Vec<Annotation>, StorageError> {
        match self.slots.read(ANNOTATIONS_SLOT).await? {
            Some(data) => Ok(serde_json::from_str(&data)?),
            None => Ok(Vec::new()),
        }
    }

    async fn load_or_empty(&self) -> Vec<Annotation> {
        if self.closed.load(Ordering::SeqCst) {
            return Vec::new();
        }
        self.read_all().await.unwrap_or_else(|e| {
            warn!("Annotation storage unavailable, returning no records: {e}");
            Vec::new()
        })
    }

    /// Writes must not clobber a collection that could not be read back.
    async fn load_for_write(&self) -> Result<Vec<Annotation>, StorageError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StorageError::Closed);
        }
        self.read_all().await
    }

    async fn write_all(&self, all: &[Annotation]) -> Result<(), StorageError> {
        let data = serde_json::to_string(all)?;
        self.slots.write(ANNOTATIONS_SLOT, &data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{AnnotationEdits, ProofSnapRef};
    use crate::storage::slots::FileSlotStore;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> AnnotationStore {
        AnnotationStore::open(Arc::new(FileSlotStore::new(dir.path()))).await
    }

    #[tokio::test]
    async fn test_save_then_list_contains_exactly_one_equal_record() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let mut a = Annotation::new("img-1", 12.5, 40.0);
        a.apply(AnnotationEdits {
            comment: Some("blurry edge".to_string()),
            ..Default::default()
        });

        store.save(&a).await.unwrap();
        let listed = store.list("img-1").await;
        assert_eq!(listed, vec![a.clone()]);

        store.delete(&a.id).await.unwrap();
        assert!(store.list("img-1").await.is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_by_image_and_keeps_insertion_order() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let first = Annotation::new("a", 1.0, 1.0);
        let other = Annotation::new("b", 2.0, 2.0);
        let second = Annotation::new("a", 3.0, 3.0);
        for rec in [&first, &other, &second] {
            store.save(rec).await.unwrap();
        }
        let ids: Vec<String> = store.list("a").await.into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let first = Annotation::new("a", 1.0, 1.0);
        let second = Annotation::new("a", 2.0, 2.0);
        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        let mut updated = first.clone();
        updated.proof_snap = Some(ProofSnapRef {
            asset_id: "p1".to_string(),
            url: "https://files.example/p1.jpg".to_string(),
        });
        store.upsert(&updated).await.unwrap();

        let listed = store.list("a").await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], updated);
        assert_eq!(listed[1], second);
    }

    #[tokio::test]
    async fn test_upsert_appends_when_absent() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let a = Annotation::new("a", 1.0, 1.0);
        store.upsert(&a).await.unwrap();
        assert!(store.contains(&a.id).await);
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store.delete("missing").await.unwrap();
        assert!(store.list("a").await.is_empty());
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let a = Annotation::new("a", 1.0, 1.0);
        {
            let store = open_store(&dir).await;
            store.save(&a).await.unwrap();
            store.close().await;
        }
        let reopened = open_store(&dir).await;
        assert_eq!(reopened.list("a").await, vec![a]);
    }

    #[tokio::test]
    async fn test_unavailable_medium_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        // A directory where the slot file should be makes every read fail.
        std::fs::create_dir_all(dir.path().join(format!("{ANNOTATIONS_SLOT}.json"))).unwrap();
        let store = open_store(&dir).await;
        assert!(store.list("a").await.is_empty());
        assert!(store.save(&Annotation::new("a", 0.0, 0.0)).await.is_err());
    }

    #[tokio::test]
    async fn test_closed_store_rejects_writes() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store.close().await;
        assert!(matches!(
            store.save(&Annotation::new("a", 0.0, 0.0)).await,
            Err(StorageError::Closed)
        ));
        assert!(store.list("a").await.is_empty());
    }
}
