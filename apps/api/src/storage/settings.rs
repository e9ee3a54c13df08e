use std::sync::Arc;

use tracing::warn;

use crate::models::settings::AppSettings;
use crate::storage::slots::SlotStore;
use crate::storage::StorageError;

pub const SETTINGS_SLOT: &str = "proofsnap_settings";

pub struct SettingsStore {
    slots: Arc<dyn SlotStore>,
}

impl SettingsStore {
    pub fn new(slots: Arc<dyn SlotStore>) -> Self {
        Self { slots }
    }

    /// Current settings; an unreadable or corrupt slot reads as defaults.
    pub async fn get(&self) -> AppSettings {
        let data = match self.slots.read(SETTINGS_SLOT).await {
            Ok(Some(data)) => data,
            Ok(None) => return AppSettings::default(),
            Err(e) => {
                warn!("Settings storage unavailable, using defaults: {e}");
                return AppSettings::default();
            }
        };
        serde_json::from_str(&data).unwrap_or_else(|e| {
            warn!("Settings slot is corrupt, using defaults: {e}");
            AppSettings::default()
        })
    }

    pub async fn set(&self, settings: AppSettings) -> Result<AppSettings, StorageError> {
        let settings = settings.normalized();
        let data = serde_json::to_string(&settings)?;
        self.slots.write(SETTINGS_SLOT, &data).await?;
        Ok(settings)
    }
}
