use serde::Serialize;

use crate::evidence::tier::{classify, EvidenceTier};
use crate::models::annotation::Annotation;
use crate::report::page::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Verified,
    Partial,
    Unverified,
}

impl VerificationStatus {
    pub fn label(self) -> &'static str {
        match self {
            VerificationStatus::Verified => "VERIFIED",
            VerificationStatus::Partial => "PARTIAL",
            VerificationStatus::Unverified => "UNVERIFIED",
        }
    }

    pub fn color(self) -> Color {
        match self {
            VerificationStatus::Verified => Color::GREEN_500,
            VerificationStatus::Partial => Color::AMBER_500,
            VerificationStatus::Unverified => Color::RED_500,
        }
    }
}

/// Counts shown on the cover and in the conclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportStatistics {
    pub total: usize,
    pub tier1: usize,
    pub tier2: usize,
    pub tier3: usize,
    pub untiered: usize,
    /// Attached evidence ids across all annotations, whatever their tier.
    pub supporting_images: usize,
    pub with_comments: usize,
    pub status: VerificationStatus,
}

impl ReportStatistics {
    pub fn from_annotations(annotations: &[Annotation]) -> Self {
        let mut stats = Self {
            total: annotations.len(),
            tier1: 0,
            tier2: 0,
            tier3: 0,
            untiered: 0,
            supporting_images: 0,
            with_comments: 0,
            status: VerificationStatus::Unverified,
        };

        for a in annotations {
            match classify(a) {
                Some(EvidenceTier::Cryptographic) => stats.tier1 += 1,
                Some(EvidenceTier::Supporting) => stats.tier2 += 1,
                Some(EvidenceTier::Commentary) => stats.tier3 += 1,
                None => stats.untiered += 1,
            }
            stats.supporting_images += a.supporting_evidence_ids.len();
            if a.has_comment() {
                stats.with_comments += 1;
            }
        }

        stats.status = if stats.tier1 > 0 {
            VerificationStatus::Verified
        } else if stats.tier2 > 0 {
            VerificationStatus::Partial
        } else {
            VerificationStatus::Unverified
        };
        stats
    }
}
