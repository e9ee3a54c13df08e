use std::cmp::Ordering;

use serde::Serialize;

use crate::models::annotation::Annotation;

/// Trust level of the strongest evidence attached to an annotation.
///
/// Ordered so that `Cryptographic > Supporting > Commentary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceTier {
    /// Tier 1: a ProofSnap asset with a verifiable capture record.
    Cryptographic,
    /// Tier 2: uploaded supporting images.
    Supporting,
    /// Tier 3: investigator commentary only.
    Commentary,
}

impl EvidenceTier {
    pub fn rank(self) -> u8 {
        match self {
            EvidenceTier::Cryptographic => 1,
            EvidenceTier::Supporting => 2,
            EvidenceTier::Commentary => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EvidenceTier::Cryptographic => "Tier 1: Cryptographic Proof",
            EvidenceTier::Supporting => "Tier 2: Supporting Evidence",
            EvidenceTier::Commentary => "Tier 3: Commentary Only",
        }
    }

    /// Short uppercase tag for compact listings.
    pub fn tag(self) -> &'static str {
        match self {
            EvidenceTier::Cryptographic => "TIER 1",
            EvidenceTier::Supporting => "TIER 2",
            EvidenceTier::Commentary => "TIER 3",
        }
    }
}

impl Ord for EvidenceTier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lower rank number is stronger evidence.
        other.rank().cmp(&self.rank())
    }
}

impl PartialOrd for EvidenceTier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub const NO_EVIDENCE_TAG: &str = "NO EVIDENCE";

/// Derives the tier from the evidence currently attached. Strict precedence:
/// a ProofSnap reference beats supporting images, which beat a comment.
pub fn classify(annotation: &Annotation) -> Option<EvidenceTier> {
    if annotation.proof_snap.is_some() {
        Some(EvidenceTier::Cryptographic)
    } else if !annotation.supporting_evidence_ids.is_empty() {
        Some(EvidenceTier::Supporting)
    } else if annotation.has_comment() {
        Some(EvidenceTier::Commentary)
    } else {
        None
    }
}

pub fn tier_tag(tier: Option<EvidenceTier>) -> &'static str {
    tier.map(EvidenceTier::tag).unwrap_or(NO_EVIDENCE_TAG)
}
