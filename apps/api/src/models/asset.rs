use serde::{Deserialize, Serialize};

/// Asset descriptor as returned by the ProofSnap asset listing.
///
/// The service uses either `nid` or `id` for the identifier depending on the
/// endpoint version; the first non-empty one wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofSnapAsset {
    #[serde(default)]
    pub nid: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub asset_file: Option<String>,
    #[serde(default)]
    pub asset_file_thumbnail: Option<String>,
    #[serde(default)]
    pub asset_creator_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Normalized view handed to the evidence picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetDescriptor {
    pub id: String,
    pub file_url: String,
    pub thumbnail_url: Option<String>,
    pub creator_name: Option<String>,
    pub created_at: Option<String>,
}

impl ProofSnapAsset {
    pub fn asset_id(&self) -> Option<&str> {
        [self.nid.as_deref(), self.id.as_deref()]
            .into_iter()
            .flatten()
            .find(|id| !id.is_empty())
    }

    /// Descriptor for display, or `None` when the asset has no usable id or file.
    pub fn descriptor(&self) -> Option<AssetDescriptor> {
        let id = self.asset_id()?;
        let file_url = self.asset_file.as_deref().filter(|f| !f.is_empty())?;
        Some(AssetDescriptor {
            id: id.to_string(),
            file_url: file_url.to_string(),
            thumbnail_url: self.asset_file_thumbnail.clone(),
            creator_name: self.asset_creator_name.clone(),
            created_at: self.created_at.clone(),
        })
    }
}
