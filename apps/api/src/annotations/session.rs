//! Working copy of annotations per image.
//!
//! Committed annotations live in the `AnnotationStore`; drafts (points placed
//! but never saved from the editor) live only here. The working copy for an
//! image is the committed list in store order followed by its drafts in
//! placement order, which is also the order they take once committed.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::annotation::{Annotation, AnnotationEdits};
use crate::storage::annotations::AnnotationStore;
use crate::storage::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistState {
    Draft,
    Committed,
}

#[derive(Debug, Clone)]
pub struct WorkingAnnotation {
    pub annotation: Annotation,
    pub state: PersistState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseOutcome {
    /// The annotation was still a draft and has been dropped.
    Discarded,
    /// The annotation was already committed and stays as it is.
    Kept,
}

/// Unsaved drafts keyed by image id.
#[derive(Default)]
pub struct SessionRegistry {
    drafts: Mutex<HashMap<String, Vec<Annotation>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn working_copy(&self, store: &AnnotationStore, image_id: &str) -> Vec<WorkingAnnotation> {
        let committed = store.list(image_id).await;
        let drafts = self.drafts.lock().await;

        let mut copy: Vec<WorkingAnnotation> = committed
            .into_iter()
            .map(|annotation| WorkingAnnotation {
                annotation,
                state: PersistState::Committed,
            })
            .collect();
        if let Some(pending) = drafts.get(image_id) {
            copy.extend(pending.iter().cloned().map(|annotation| WorkingAnnotation {
                annotation,
                state: PersistState::Draft,
            }));
        }
        copy
    }

    /// Places a new point. Nothing is persisted until `commit`.
    pub async fn place_draft(&self, image_id: &str, x: f64, y: f64) -> Annotation {
        let draft = Annotation::new(image_id, x, y);
        self.drafts
            .lock()
            .await
            .entry(image_id.to_string())
            .or_default()
            .push(draft.clone());
        debug!(annotation = %draft.id, image = image_id, "Draft placed");
        draft
    }

    /// Applies edits and upserts the annotation, turning a draft into a committed
    /// record. Returns `None` when the id is neither a draft nor committed.
    pub async fn commit(
        &self,
        store: &AnnotationStore,
        id: &str,
        edits: AnnotationEdits,
    ) -> Result<Option<Annotation>, StorageError> {
        let mut drafts = self.drafts.lock().await;

        let draft = take_draft(&mut drafts, id);
        let mut annotation = match draft.clone() {
            Some(a) => a,
            None => match store.get(id).await {
                Some(a) => a,
                None => return Ok(None),
            },
        };
        annotation.apply(edits);

        if let Err(e) = store.upsert(&annotation).await {
            if let Some(d) = draft {
                drafts.entry(d.image_id.clone()).or_default().push(d);
            }
            return Err(e);
        }

        info!(annotation = %annotation.id, image = %annotation.image_id, "Annotation committed");
        Ok(Some(annotation))
    }

    /// Closing the editor discards a draft and leaves a committed record alone.
    pub async fn close(&self, store: &AnnotationStore, id: &str) -> Option<CloseOutcome> {
        if take_draft(&mut *self.drafts.lock().await, id).is_some() {
            debug!(annotation = id, "Draft discarded");
            return Some(CloseOutcome::Discarded);
        }
        store.contains(id).await.then_some(CloseOutcome::Kept)
    }

    /// Removes the annotation whether it is a draft or committed.
    pub async fn remove(&self, store: &AnnotationStore, id: &str) -> Result<(), StorageError> {
        take_draft(&mut *self.drafts.lock().await, id);
        store.delete(id).await
    }

    /// Drops every draft for an image.
    pub async fn discard_image(&self, image_id: &str) {
        self.drafts.lock().await.remove(image_id);
    }
}

fn take_draft(drafts: &mut HashMap<String, Vec<Annotation>>, id: &str) -> Option<Annotation> {
    for pending in drafts.values_mut() {
        if let Some(pos) = pending.iter().position(|a| a.id == id) {
            return Some(pending.remove(pos));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::slots::FileSlotStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn setup(dir: &TempDir) -> (AnnotationStore, SessionRegistry) {
        let store = AnnotationStore::open(Arc::new(FileSlotStore::new(dir.path()))).await;
        (store, SessionRegistry::new())
    }

    fn comment(text: &str) -> AnnotationEdits {
        AnnotationEdits {
            comment: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_draft_is_not_persisted_until_commit() {
        let dir = TempDir::new().unwrap();
        let (store, sessions) = setup(&dir).await;

        let draft = sessions.place_draft("img", 4.0, 8.0).await;
        assert!(!store.contains(&draft.id).await);

        let copy = sessions.working_copy(&store, "img").await;
        assert_eq!(copy.len(), 1);
        assert_eq!(copy[0].state, PersistState::Draft);

        let committed = sessions
            .commit(&store, &draft.id, comment("odd shadow"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(committed.comment.as_deref(), Some("odd shadow"));
        assert!(store.contains(&draft.id).await);

        let copy = sessions.working_copy(&store, "img").await;
        assert_eq!(copy.len(), 1);
        assert_eq!(copy[0].state, PersistState::Committed);
    }

    #[tokio::test]
    async fn test_close_discards_draft_but_keeps_committed() {
        let dir = TempDir::new().unwrap();
        let (store, sessions) = setup(&dir).await;

        let draft = sessions.place_draft("img", 1.0, 1.0).await;
        assert_eq!(sessions.close(&store, &draft.id).await, Some(CloseOutcome::Discarded));
        assert!(sessions.working_copy(&store, "img").await.is_empty());

        let kept = sessions.place_draft("img", 2.0, 2.0).await;
        sessions.commit(&store, &kept.id, comment("x")).await.unwrap();
        assert_eq!(sessions.close(&store, &kept.id).await, Some(CloseOutcome::Kept));
        assert_eq!(store.list("img").await.len(), 1);

        assert_eq!(sessions.close(&store, "unknown").await, None);
    }

    #[tokio::test]
    async fn test_recommit_updates_in_place() {
        let dir = TempDir::new().unwrap();
        let (store, sessions) = setup(&dir).await;

        let first = sessions.place_draft("img", 1.0, 1.0).await;
        sessions.commit(&store, &first.id, comment("one")).await.unwrap();
        let second = sessions.place_draft("img", 2.0, 2.0).await;
        sessions.commit(&store, &second.id, comment("two")).await.unwrap();

        sessions.commit(&store, &first.id, comment("one, revised")).await.unwrap();

        let listed = store.list("img").await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[0].comment.as_deref(), Some("one, revised"));
        assert_eq!(listed[0].created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_commit_unknown_id_is_none() {
        let dir = TempDir::new().unwrap();
        let (store, sessions) = setup(&dir).await;
        assert!(sessions
            .commit(&store, "nope", AnnotationEdits::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_draft() {
        let dir = TempDir::new().unwrap();
        let (store, sessions) = setup(&dir).await;
        let draft = sessions.place_draft("img", 1.0, 1.0).await;
        store.close().await;

        assert!(sessions.commit(&store, &draft.id, comment("x")).await.is_err());
        let copy = sessions.working_copy(&store, "img").await;
        assert_eq!(copy.len(), 1);
        assert_eq!(copy[0].state, PersistState::Draft);
    }

    #[tokio::test]
    async fn test_remove_draft_and_committed() {
        let dir = TempDir::new().unwrap();
        let (store, sessions) = setup(&dir).await;
        let a = sessions.place_draft("img", 1.0, 1.0).await;
        sessions.commit(&store, &a.id, comment("x")).await.unwrap();
        let b = sessions.place_draft("img", 2.0, 2.0).await;

        sessions.remove(&store, &a.id).await.unwrap();
        sessions.remove(&store, &b.id).await.unwrap();
        assert!(sessions.working_copy(&store, "img").await.is_empty());
    }
}
