use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reference to exactly one externally verified ProofSnap asset.
///
/// The id and URL travel together; an annotation either carries both or neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofSnapRef {
    pub asset_id: String,
    pub url: String,
}

/// A single marked finding on an image.
///
/// `x`/`y` are in the coordinate space of the canvas as it was rendered when the
/// point was captured, not the native resolution of the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub image_id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_snap: Option<ProofSnapRef>,
    /// Evidence store ids, insertion ordered, no duplicates.
    #[serde(default)]
    pub supporting_evidence_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// The editable evidence of an annotation, as submitted from the editor.
///
/// Applying edits replaces all three evidence fields; identity, position and
/// creation time are never touched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotationEdits {
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub proof_snap: Option<ProofSnapRef>,
    #[serde(default)]
    pub supporting_evidence_ids: Vec<String>,
}

impl Annotation {
    /// Creates a fresh annotation at a captured canvas position.
    pub fn new(image_id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            image_id: image_id.into(),
            x,
            y,
            comment: None,
            proof_snap: None,
            supporting_evidence_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn has_comment(&self) -> bool {
        self.comment
            .as_deref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn apply(&mut self, edits: AnnotationEdits) {
        self.comment = edits
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        self.proof_snap = edits
            .proof_snap
            .filter(|p| !p.asset_id.trim().is_empty() && !p.url.trim().is_empty());

        let mut ids: Vec<String> = Vec::with_capacity(edits.supporting_evidence_ids.len());
        for id in edits.supporting_evidence_ids {
            let id = id.trim().to_string();
            if !id.is_empty() && !ids.contains(&id) {
                ids.push(id);
            }
        }
        self.supporting_evidence_ids = ids;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_annotation_has_no_evidence() {
        let a = Annotation::new("1", 10.0, 20.0);
        assert!(!a.has_comment());
        assert!(a.proof_snap.is_none());
        assert!(a.supporting_evidence_ids.is_empty());
        assert_eq!(a.image_id, "1");
        assert!(!a.id.is_empty());
    }

    #[test]
    fn test_apply_normalizes_comment_and_dedupes_evidence() {
        let mut a = Annotation::new("1", 0.0, 0.0);
        a.apply(AnnotationEdits {
            comment: Some("   ".to_string()),
            proof_snap: None,
            supporting_evidence_ids: vec![
                "e1".to_string(),
                "e2".to_string(),
                "e1".to_string(),
                " ".to_string(),
            ],
        });
        assert_eq!(a.comment, None);
        assert_eq!(a.supporting_evidence_ids, vec!["e1", "e2"]);
    }

    #[test]
    fn test_apply_keeps_identity_and_creation_time() {
        let mut a = Annotation::new("img", 5.0, 6.0);
        let id = a.id.clone();
        let created = a.created_at;
        a.apply(AnnotationEdits {
            comment: Some("  blurry edge ".to_string()),
            ..Default::default()
        });
        assert_eq!(a.id, id);
        assert_eq!(a.created_at, created);
        assert_eq!((a.x, a.y), (5.0, 6.0));
        assert_eq!(a.comment.as_deref(), Some("blurry edge"));
    }

    #[test]
    fn test_apply_drops_half_filled_proof_snap() {
        let mut a = Annotation::new("img", 0.0, 0.0);
        a.apply(AnnotationEdits {
            proof_snap: Some(ProofSnapRef {
                asset_id: "p1".to_string(),
                url: String::new(),
            }),
            ..Default::default()
        });
        assert!(a.proof_snap.is_none());
    }
}
