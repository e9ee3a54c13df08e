use std::sync::Arc;

use crate::annotations::session::SessionRegistry;
use crate::asset_client::AssetDirectory;
use crate::config::Config;
use crate::storage::annotations::AnnotationStore;
use crate::storage::blobs::{BlobStore, FsBlobStore, Partition};
use crate::storage::settings::SettingsStore;
use crate::storage::slots::{FileSlotStore, SlotStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub annotations: Arc<AnnotationStore>,
    pub settings: Arc<SettingsStore>,
    /// Uploaded subject images.
    pub images: Arc<dyn BlobStore>,
    /// Supporting evidence images.
    pub evidence: Arc<dyn BlobStore>,
    pub assets: Arc<dyn AssetDirectory>,
    /// Unsaved annotations, per image.
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Opens every local store under `config.data_dir`.
    pub async fn open(config: Config, assets: Arc<dyn AssetDirectory>) -> Self {
        let slots: Arc<dyn SlotStore> = Arc::new(FileSlotStore::new(config.data_dir.join("slots")));
        let annotations = Arc::new(AnnotationStore::open(slots.clone()).await);
        let settings = Arc::new(SettingsStore::new(slots));
        let images: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(&config.data_dir, Partition::Images));
        let evidence: Arc<dyn BlobStore> =
            Arc::new(FsBlobStore::new(&config.data_dir, Partition::Evidence));

        Self {
            config,
            annotations,
            settings,
            images,
            evidence,
            assets,
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}
