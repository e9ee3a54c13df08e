//! Report composition: turns an image, its ordered annotations and their
//! resolved evidence into laid-out pages.
//!
//! Composition is pure and deterministic for identical inputs. It never fails:
//! an unusable subject image becomes a placeholder and unresolved evidence is
//! simply absent from the thumbnail rows.

use chrono::{DateTime, Utc};
use image::DynamicImage;
use image::GenericImageView;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::evidence::resolve::ResolvedEvidence;
use crate::evidence::tier::classify;
use crate::models::annotation::Annotation;
use crate::report::blocks::{
    comment_preview, conclusion_text, cover_ops, footer_ops, ConclusionBlock, CoverInfo, FigureLabel,
    FindingBlock, Heading, ImageFigure, ImagePlaceholder, QuickRefLine, Thumbnail, MAX_THUMBS,
    QUICK_REF_LINE_HEIGHT,
};
use crate::report::layout::{Block, PageComposer, Placement};
use crate::report::page::{Page, PageGeometry};
use crate::report::pdf::render_pdf;
use crate::report::raster::{annotated_copy, scale_markers, MarkerScale};
use crate::report::stats::ReportStatistics;

#[derive(Debug, Clone, Error)]
pub enum SubjectImageError {
    #[error("image file is missing")]
    Missing,

    #[error("image could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("report task failed: {0}")]
    Task(String),
}

pub struct ReportInput {
    pub image_title: String,
    pub image: Result<DynamicImage, SubjectImageError>,
    /// Committed annotations in list order.
    pub annotations: Vec<Annotation>,
    /// Resolved evidence, indexed like `annotations`.
    pub evidence: Vec<Vec<ResolvedEvidence>>,
    pub rendered_width: f64,
    pub rendered_height: f64,
    pub investigator: String,
    pub generated_at: DateTime<Utc>,
}

pub struct ComposedReport {
    pub pages: Vec<Page>,
    /// Images referenced by `DrawOp::Image` indices.
    pub images: Vec<DynamicImage>,
    /// Page placement of each finding block, in annotation order.
    pub findings: Vec<Placement>,
    pub statistics: ReportStatistics,
    pub report_id: String,
    pub filename: String,
}

/// What an export hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedReport {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub filename: String,
    pub report_id: String,
    pub page_count: usize,
    /// 1-based page on which each finding starts, in annotation order.
    pub finding_pages: Vec<usize>,
    pub statistics: ReportStatistics,
}

/// Base-36 of the generation time in milliseconds, uppercase.
pub fn report_id(generated_at: &DateTime<Utc>) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut n = generated_at.timestamp_millis().max(0) as u64;
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// `ImageProof-Report-{title}-{millis}.pdf` with whitespace runs, path
/// separators and quotes in the title replaced by `-`.
pub fn report_filename(title: &str, generated_at: &DateTime<Utc>) -> String {
    let mut safe = String::with_capacity(title.len());
    let mut in_space = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_space {
                safe.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        match c {
            '/' | '\\' | '"' | '\'' => safe.push('-'),
            c if c.is_control() => {}
            c => safe.push(c),
        }
    }
    format!(
        "ImageProof-Report-{safe}-{}.pdf",
        generated_at.timestamp_millis()
    )
}

pub fn compose_report(input: &ReportInput) -> ComposedReport {
    let geometry = PageGeometry::a4();
    let statistics = ReportStatistics::from_annotations(&input.annotations);
    let report_id = report_id(&input.generated_at);
    let mut images: Vec<DynamicImage> = Vec::new();
    let mut composer = PageComposer::new(geometry);

    // Cover
    composer.draw(cover_ops(
        &CoverInfo {
            investigator: &input.investigator,
            generated_at: input.generated_at,
            subject: &input.image_title,
            report_id: &report_id,
        },
        &statistics,
        &geometry,
    ));

    // Annotated image
    composer.new_page();
    composer.place(&Heading::new("Annotated Image Analysis", 16.0), 2.0);
    match &input.image {
        Ok(subject) => {
            let (native_w, native_h) = subject.dimensions();
            let scale = MarkerScale::new(native_w, native_h, input.rendered_width, input.rendered_height);
            let markers = scale_markers(&input.annotations, scale);
            let labels = markers
                .iter()
                .map(|m| FigureLabel {
                    number: m.number,
                    fx: m.cx / native_w.max(1) as f64,
                    fy: m.cy / native_h.max(1) as f64,
                    size_frac: m.label_px / native_w.max(1) as f64,
                })
                .collect();
            images.push(annotated_copy(subject, &markers));
            let figure = ImageFigure::new(images.len() - 1, native_w, native_h, labels);
            composer.place(&figure, 15.0);
        }
        Err(e) => {
            warn!(subject = %input.image_title, "Report image unavailable, using placeholder: {e}");
            composer.place(&ImagePlaceholder, 10.0);
        }
    }

    // Quick reference
    if !input.annotations.is_empty() {
        let heading = Heading::new("Quick Reference", 14.0);
        composer.ensure(heading.height() + QUICK_REF_LINE_HEIGHT);
        composer.place(&heading, 0.0);
        for (i, annotation) in input.annotations.iter().enumerate() {
            let line = QuickRefLine {
                number: i + 1,
                tier: classify(annotation),
                preview: comment_preview(annotation.comment.as_deref()),
            };
            composer.place(&line, 0.0);
        }
        composer.advance(8.0);
    }

    // Detail blocks
    let blocks: Vec<FindingBlock> = input
        .annotations
        .iter()
        .enumerate()
        .map(|(i, annotation)| {
            let resolved = input.evidence.get(i).map(Vec::as_slice).unwrap_or(&[]);
            finding_block(i + 1, annotation, resolved, &geometry, &mut images)
        })
        .collect();

    let heading = Heading::new("Detailed Findings", 16.0);
    let first = blocks
        .first()
        .map(|b| b.height().min(geometry.usable_height() - heading.height()))
        .unwrap_or(0.0);
    composer.ensure(heading.height() + first);
    composer.place(&heading, 0.0);

    let findings: Vec<Placement> = blocks.iter().map(|b| composer.place(b, 6.0)).collect();

    // Conclusion
    if !composer.at_page_top() {
        composer.advance(4.0);
    }
    let conclusion = ConclusionBlock::new(&conclusion_text(&input.image_title, &statistics), &geometry);
    composer.place(&conclusion, 0.0);

    composer.stamp_footers(footer_ops);
    let pages = composer.finish();

    ComposedReport {
        pages,
        images,
        findings,
        statistics,
        filename: report_filename(&input.image_title, &input.generated_at),
        report_id,
    }
}

/// Builds a finding block, registering the thumbnails it shows in `images`.
fn finding_block(
    number: usize,
    annotation: &Annotation,
    resolved: &[ResolvedEvidence],
    geometry: &PageGeometry,
    images: &mut Vec<DynamicImage>,
) -> FindingBlock {
    let shown_ids = &annotation.supporting_evidence_ids[..annotation.supporting_evidence_ids.len().min(MAX_THUMBS)];
    let mut thumbnails = Vec::new();
    for evidence in resolved.iter().filter(|e| shown_ids.contains(&e.id)) {
        let (w, h) = evidence.image.dimensions();
        if w == 0 || h == 0 {
            continue;
        }
        images.push(evidence.image.clone());
        thumbnails.push(Thumbnail {
            image: images.len() - 1,
            aspect: w as f64 / h as f64,
            name: evidence.name.clone(),
            uploaded_at: evidence.uploaded_at,
        });
    }

    let mut block = FindingBlock {
        number,
        tier: classify(annotation),
        comment_lines: FindingBlock::wrap_comment(annotation.comment.as_deref(), geometry),
        logged_at: annotation.created_at,
        evidence_count: annotation.supporting_evidence_ids.len(),
        thumbnails,
        proof: annotation.proof_snap.clone(),
    };
    block.clamp_to_page(geometry);
    block
}

/// Composes and renders the PDF off the async runtime.
pub async fn export_report(input: ReportInput) -> Result<RenderedReport, ReportError> {
    tokio::task::spawn_blocking(move || {
        let composed = compose_report(&input);
        let bytes = render_pdf(&composed, &input.image_title)?;
        info!(
            report_id = %composed.report_id,
            pages = composed.pages.len(),
            findings = composed.statistics.total,
            "Report rendered"
        );
        Ok(RenderedReport {
            bytes,
            filename: composed.filename,
            report_id: composed.report_id,
            page_count: composed.pages.len(),
            finding_pages: composed.findings.iter().map(|p| p.page + 1).collect(),
            statistics: composed.statistics,
        })
    })
    .await
    .map_err(|e| ReportError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::resolve::tests::png_bytes;
    use crate::models::annotation::{AnnotationEdits, ProofSnapRef};
    use crate::report::page::DrawOp;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn subject(w: u32, h: u32) -> DynamicImage {
        image::load_from_memory(&png_bytes(w, h)).unwrap()
    }

    fn annotation(comment: &str, evidence: &[&str], proof: bool) -> Annotation {
        let mut a = Annotation::new("7", 100.0, 80.0);
        a.apply(AnnotationEdits {
            comment: Some(comment.to_string()),
            supporting_evidence_ids: evidence.iter().map(|s| s.to_string()).collect(),
            proof_snap: proof.then(|| ProofSnapRef {
                asset_id: "p1".to_string(),
                url: "https://files.example/p1.jpg".to_string(),
            }),
        });
        a
    }

    fn evidence(id: &str) -> ResolvedEvidence {
        ResolvedEvidence {
            id: id.to_string(),
            name: format!("{id}.png"),
            uploaded_at: at(0),
            image: subject(40, 20),
        }
    }

    fn input(annotations: Vec<Annotation>, evidence: Vec<Vec<ResolvedEvidence>>) -> ReportInput {
        ReportInput {
            image_title: "Image #7".to_string(),
            image: Ok(subject(400, 300)),
            annotations,
            evidence,
            rendered_width: 400.0,
            rendered_height: 300.0,
            investigator: "Dana".to_string(),
            generated_at: at(1_700_000_000_000),
        }
    }

    #[test]
    fn test_report_id_is_base36_millis() {
        assert_eq!(report_id(&at(35)), "Z");
        assert_eq!(report_id(&at(36)), "10");
        assert_eq!(report_id(&at(1_700_000_000_000)), "LOYW3V28");
    }

    #[test]
    fn test_filename_replaces_whitespace_and_separators() {
        let ts = at(1_700_000_000_000);
        assert_eq!(
            report_filename("Image #7", &ts),
            "ImageProof-Report-Image-#7-1700000000000.pdf"
        );
        assert_eq!(
            report_filename("my  shot/2 \"final\"", &ts),
            "ImageProof-Report-my-shot-2--final--1700000000000.pdf"
        );
    }

    #[test]
    fn test_page_structure_and_footers() {
        let annotations = vec![
            annotation("blurred hand", &["e1", "e2"], true),
            annotation("text looks garbled", &[], false),
        ];
        let report = compose_report(&input(
            annotations,
            vec![vec![evidence("e1"), evidence("e2")], vec![]],
        ));

        assert!(report.pages[0].contains_text("IMAGE VERIFICATION REPORT"));
        assert!(report.pages[0].contains_text("Investigator: Dana"));
        assert!(report.pages[0].contains_text("Report ID: LOYW3V28"));
        assert!(report.pages[0].contains_text("VERIFIED"));
        assert!(report.pages[1].contains_text("Annotated Image Analysis"));
        assert!(report.pages.iter().any(|p| p.contains_text("Quick Reference")));
        assert!(report.pages.iter().any(|p| p.contains_text("Conclusion")));

        let n = report.pages.len();
        for (i, page) in report.pages.iter().enumerate() {
            assert!(page.contains_text(&format!("Page {} of {n}", i + 1)));
        }

        // Subject image plus two thumbnails.
        assert_eq!(report.images.len(), 3);
        assert_eq!(report.findings.len(), 2);
    }

    #[test]
    fn test_quick_reference_lines_follow_list_order() {
        let annotations = vec![
            annotation("first", &[], false),
            annotation(&"long ".repeat(30), &["e1"], false),
            Annotation::new("7", 1.0, 1.0),
        ];
        let report = compose_report(&input(annotations, vec![vec![], vec![], vec![]]));
        let texts: Vec<&str> = report.pages.iter().flat_map(|p| p.texts()).collect();

        let pos = |needle: &str| texts.iter().position(|t| *t == needle).unwrap();
        assert!(pos("#1") < pos("#2") && pos("#2") < pos("#3"));
        assert!(texts.contains(&"TIER 3"));
        assert!(texts.contains(&"TIER 2"));
        assert!(texts.contains(&"NO EVIDENCE"));
        assert!(texts.contains(&"(no comment)"));
        assert!(texts.iter().any(|t| t.ends_with("...") && t.starts_with("long")));
    }

    #[test]
    fn test_many_findings_never_cross_break_limit() {
        let annotations: Vec<Annotation> = (0..30)
            .map(|i| annotation(&"word ".repeat(10 + i * 7), &["e1", "e2", "e3", "e4", "e5"][..i % 6], i % 3 == 0))
            .collect();
        let evidence = vec![Vec::new(); annotations.len()];
        let report = compose_report(&input(annotations, evidence));
        let limit = PageGeometry::a4().break_limit;

        for p in &report.findings {
            let fits_page = p.height <= PageGeometry::a4().usable_height();
            if fits_page {
                assert!(p.bottom() <= limit + 1e-9);
            } else {
                assert_eq!(p.top, PageGeometry::a4().top);
            }
        }
        // Pages grow monotonically.
        assert!(report.findings.windows(2).all(|w| w[0].page <= w[1].page));
    }

    #[test]
    fn test_broken_image_gets_placeholder() {
        let mut inp = input(vec![annotation("x", &[], false)], vec![vec![]]);
        inp.image = Err(SubjectImageError::Decode("bad header".to_string()));
        let report = compose_report(&inp);
        assert!(report.pages[1].contains_text("Image could not be loaded"));
        assert!(report.images.is_empty());
    }

    #[test]
    fn test_failed_thumbnails_are_packed_left() {
        // e2 did not resolve: e1 and e3 take the first two cells.
        let a = annotation("x", &["e1", "e2", "e3"], false);
        let report = compose_report(&input(vec![a], vec![vec![evidence("e1"), evidence("e3")]]));
        let placement = report.findings[0];
        let thumbs: Vec<(f64, f64)> = report.pages[placement.page]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { x, y, image, .. } if *image > 0 => Some((*x, *y)),
                _ => None,
            })
            .collect();
        assert_eq!(thumbs.len(), 2);
        assert!(thumbs[0].0 < thumbs[1].0);
        assert_eq!(thumbs[0].1, thumbs[1].1);
        assert!(thumbs[0].0 < 20.0 + 18.0 + 28.0);
    }

    #[test]
    fn test_finding_thumbnails_carry_evidence_name_and_date() {
        let a = annotation("x", &["e1", "e2"], false);
        let report = compose_report(&input(vec![a], vec![vec![evidence("e1"), evidence("e2")]]));
        let page = &report.pages[report.findings[0].page];
        assert!(page.contains_text("e1.png"));
        assert!(page.contains_text("e2.png"));
        assert!(page.contains_text("1970-01-01 00:00"));
    }

    #[test]
    fn test_composition_is_deterministic() {
        let annotations = vec![annotation("same", &[], true)];
        let a = compose_report(&input(annotations.clone(), vec![vec![]]));
        let b = compose_report(&input(annotations, vec![vec![]]));
        assert_eq!(a.pages, b.pages);
        assert_eq!(a.filename, b.filename);
    }

    #[tokio::test]
    async fn test_export_produces_pdf() {
        let report = export_report(input(vec![annotation("x", &["e1"], false)], vec![vec![evidence("e1")]]))
            .await
            .unwrap();
        assert!(report.bytes.starts_with(b"%PDF"));
        assert_eq!(report.statistics.status, crate::report::stats::VerificationStatus::Partial);
        assert!(report.page_count >= 2);
        assert_eq!(report.finding_pages.len(), 1);
        assert!(report.finding_pages[0] >= 2 && report.finding_pages[0] <= report.page_count);
    }
}
