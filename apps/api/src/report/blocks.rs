//! The content blocks a report is built from.
//!
//! Every flowing block knows its height before it is drawn so the composer can
//! decide on page breaks up front.

use chrono::{DateTime, Utc};

use crate::evidence::tier::{tier_tag, EvidenceTier};
use crate::models::annotation::ProofSnapRef;
use crate::report::font_metrics::{truncate_to_width, wrap_lines, FontStyle, PT_TO_MM};
use crate::report::layout::Block;
use crate::report::page::{Align, Color, DrawOp, PageGeometry};
use crate::report::stats::ReportStatistics;

pub const PRODUCT_LINE: &str = "ImageProof Studio | Professional Image Verification";

pub const FIGURE_MAX_WIDTH: f64 = 170.0;
pub const FIGURE_MAX_HEIGHT: f64 = 160.0;

pub const FINDING_BASE_HEIGHT: f64 = 28.0;
pub const FINDING_LINE_HEIGHT: f64 = 5.0;
pub const COMMENT_SIZE_PT: f64 = 9.0;
/// Comment text is indented past the number badge and kept clear of the right edge.
pub const COMMENT_INSET: f64 = 30.0;
pub const THUMB_CAPTION_HEIGHT: f64 = 6.0;
/// One cell plus two caption lines (file name, upload date).
pub const THUMB_ROW_HEIGHT: f64 = 37.0;
pub const THUMB_CELL: f64 = 28.0;
pub const THUMB_LABEL_PT: f64 = 6.0;
pub const THUMBS_PER_ROW: usize = 4;
pub const MAX_THUMB_ROWS: usize = 2;
pub const MAX_THUMBS: usize = THUMBS_PER_ROW * MAX_THUMB_ROWS;
pub const PROOF_RESERVE: f64 = 14.0;

pub const QUICK_REF_LINE_HEIGHT: f64 = 6.0;
pub const PREVIEW_CHARS: usize = 60;

pub const CONCLUSION_HEAD: f64 = 18.0;
pub const CONCLUSION_LINE_HEIGHT: f64 = 4.5;

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn tier_color(tier: Option<EvidenceTier>) -> Color {
    match tier {
        Some(EvidenceTier::Cryptographic) => Color::GREEN_500,
        Some(EvidenceTier::Supporting) => Color::BLUE_500,
        Some(EvidenceTier::Commentary) => Color::AMBER_500,
        None => Color::GRAY_400,
    }
}

/// Largest `(w, h)` with the given aspect (width / height) inside the box.
pub fn fit_within(aspect: f64, max_w: f64, max_h: f64) -> (f64, f64) {
    if !aspect.is_finite() || aspect <= 0.0 {
        return (max_w, max_h);
    }
    let mut w = max_w;
    let mut h = w / aspect;
    if h > max_h {
        h = max_h;
        w = h * aspect;
    }
    (w, h)
}

/// Comment shortened to `PREVIEW_CHARS` characters, `None` when there is no comment.
pub fn comment_preview(comment: Option<&str>) -> Option<String> {
    let comment = comment.map(str::trim).filter(|c| !c.is_empty())?;
    if comment.chars().count() > PREVIEW_CHARS {
        let head: String = comment.chars().take(PREVIEW_CHARS).collect();
        Some(format!("{head}..."))
    } else {
        Some(comment.to_string())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fixed pieces: cover and footer
// ────────────────────────────────────────────────────────────────────────────

pub struct CoverInfo<'a> {
    pub investigator: &'a str,
    pub generated_at: DateTime<Utc>,
    pub subject: &'a str,
    pub report_id: &'a str,
}

pub fn cover_ops(info: &CoverInfo<'_>, stats: &ReportStatistics, g: &PageGeometry) -> Vec<DrawOp> {
    let m = g.margin;
    let cw = g.content_width();
    let mut ops = vec![
        DrawOp::filled_rect(0.0, 40.0, g.width, 30.0, Color::GRAY_900),
        DrawOp::text(g.width / 2.0, 58.0, "IMAGE VERIFICATION REPORT", FontStyle::Bold, 24.0, Color::WHITE)
            .aligned(Align::Center),
    ];

    // Metadata box
    let meta_top = 100.0;
    let meta_y = meta_top + 12.0;
    ops.push(DrawOp::boxed(m, meta_top, cw, 50.0, Some(Color::GRAY_50), Color::GRAY_200));
    ops.push(DrawOp::text(m + 10.0, meta_y, "REPORT METADATA", FontStyle::Bold, 10.0, Color::GRAY_600));
    let fit = |line: String| truncate_to_width(&line, FontStyle::Regular, 10.0, cw - 20.0);
    let meta_lines = [
        fit(format!("Investigator: {}", info.investigator)),
        format!("Date Generated: {}", format_timestamp(&info.generated_at)),
        fit(format!("Subject: {}", info.subject)),
        format!("Report ID: {}", info.report_id),
    ];
    for (i, line) in meta_lines.into_iter().enumerate() {
        let y = meta_y + 10.0 + 8.0 * i as f64;
        ops.push(DrawOp::text(m + 10.0, y, line, FontStyle::Regular, 10.0, Color::BLACK));
    }

    // Summary statistics box
    let stats_top = 165.0;
    ops.push(DrawOp::boxed(m, stats_top, cw, 53.0, Some(Color::BLUE_50), Color::BLUE_200));
    ops.push(DrawOp::text(m + 10.0, stats_top + 12.0, "SUMMARY STATISTICS", FontStyle::Bold, 10.0, Color::BLUE_800));

    let stats_y = stats_top + 22.0;
    let col1 = m + 10.0;
    let col2 = m + cw / 2.0;
    let left = [
        ("Total Findings:", stats.total),
        ("Tier 1 (Cryptographic):", stats.tier1),
        ("Tier 2 (Supporting):", stats.tier2),
        ("Tier 3 (Commentary):", stats.tier3),
    ];
    let right = [
        ("With Comments:", stats.with_comments),
        ("Supporting Images:", stats.supporting_images),
        ("No Evidence:", stats.untiered),
    ];
    for (i, (label, value)) in left.iter().enumerate() {
        let y = stats_y + 8.0 * i as f64;
        ops.push(DrawOp::text(col1, y, *label, FontStyle::Regular, 9.0, Color::GRAY_600));
        ops.push(DrawOp::text(col1 + 48.0, y, value.to_string(), FontStyle::Bold, 11.0, Color::BLACK));
    }
    for (i, (label, value)) in right.iter().enumerate() {
        let y = stats_y + 8.0 * i as f64;
        ops.push(DrawOp::text(col2, y, *label, FontStyle::Regular, 9.0, Color::GRAY_600));
        ops.push(DrawOp::text(col2 + 42.0, y, value.to_string(), FontStyle::Bold, 11.0, Color::BLACK));
    }

    // Status badge
    let badge_y = stats_y + 24.0;
    ops.push(DrawOp::text(col2, badge_y, "Verification Status:", FontStyle::Regular, 9.0, Color::GRAY_600));
    ops.push(DrawOp::filled_rect(col2 + 42.0, badge_y - 5.0, 28.0, 6.0, stats.status.color()));
    ops.push(
        DrawOp::text(col2 + 56.0, badge_y - 0.5, stats.status.label(), FontStyle::Bold, 8.0, Color::WHITE)
            .aligned(Align::Center),
    );

    ops
}

pub fn footer_ops(page: usize, total: usize, g: &PageGeometry) -> Vec<DrawOp> {
    vec![
        DrawOp::rule(g.margin, g.width - g.margin, g.footer_rule, Color::GRAY_200, 0.3 / PT_TO_MM),
        DrawOp::text(g.margin, g.footer_text, PRODUCT_LINE, FontStyle::Regular, 8.0, Color::GRAY_400),
        DrawOp::text(
            g.width - g.margin,
            g.footer_text,
            format!("Page {page} of {total}"),
            FontStyle::Regular,
            8.0,
            Color::GRAY_400,
        )
        .aligned(Align::Right),
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Flowing blocks
// ────────────────────────────────────────────────────────────────────────────

pub struct Heading {
    pub text: String,
    pub size_pt: f64,
}

impl Heading {
    pub fn new(text: impl Into<String>, size_pt: f64) -> Self {
        Self {
            text: text.into(),
            size_pt,
        }
    }
}

impl Block for Heading {
    fn height(&self) -> f64 {
        10.0
    }

    fn render(&self, top: f64, g: &PageGeometry) -> Vec<DrawOp> {
        let baseline = top + self.size_pt * PT_TO_MM * 0.75;
        vec![DrawOp::text(g.margin, baseline, self.text.clone(), FontStyle::Bold, self.size_pt, Color::BLACK)]
    }
}

/// A marker number to print over the placed figure. Positions are fractions
/// of the image size so they survive any scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureLabel {
    pub number: usize,
    pub fx: f64,
    pub fy: f64,
    /// Label height as a fraction of the image width.
    pub size_frac: f64,
}

pub struct ImageFigure {
    pub image: usize,
    pub width: f64,
    pub height: f64,
    pub labels: Vec<FigureLabel>,
}

impl ImageFigure {
    pub fn new(image: usize, native_w: u32, native_h: u32, labels: Vec<FigureLabel>) -> Self {
        let aspect = native_w as f64 / native_h.max(1) as f64;
        let (width, height) = fit_within(aspect, FIGURE_MAX_WIDTH, FIGURE_MAX_HEIGHT);
        Self {
            image,
            width,
            height,
            labels,
        }
    }
}

impl Block for ImageFigure {
    fn height(&self) -> f64 {
        self.height
    }

    fn render(&self, top: f64, g: &PageGeometry) -> Vec<DrawOp> {
        let x = (g.width - self.width) / 2.0;
        let mut ops = vec![
            DrawOp::boxed(x - 2.0, top - 2.0, self.width + 4.0, self.height + 4.0, None, Color::GRAY_200),
            DrawOp::Image {
                x,
                y: top,
                w: self.width,
                h: self.height,
                image: self.image,
            },
        ];
        for label in &self.labels {
            let size_mm = label.size_frac * self.width;
            if size_mm <= 0.0 {
                continue;
            }
            ops.push(
                DrawOp::text(
                    x + label.fx * self.width,
                    top + label.fy * self.height + size_mm * 0.35,
                    label.number.to_string(),
                    FontStyle::Bold,
                    size_mm / PT_TO_MM,
                    Color::WHITE,
                )
                .aligned(Align::Center),
            );
        }
        ops
    }
}

pub struct ImagePlaceholder;

impl Block for ImagePlaceholder {
    fn height(&self) -> f64 {
        5.0
    }

    fn render(&self, top: f64, g: &PageGeometry) -> Vec<DrawOp> {
        vec![DrawOp::text(
            g.margin,
            top + 4.0,
            "Image could not be loaded",
            FontStyle::Regular,
            10.0,
            Color::RED_500,
        )]
    }
}

pub struct QuickRefLine {
    pub number: usize,
    pub tier: Option<EvidenceTier>,
    pub preview: Option<String>,
}

impl Block for QuickRefLine {
    fn height(&self) -> f64 {
        QUICK_REF_LINE_HEIGHT
    }

    fn render(&self, top: f64, g: &PageGeometry) -> Vec<DrawOp> {
        let y = top + 4.0;
        let m = g.margin;
        let preview_x = m + 40.0;
        let mut ops = vec![
            DrawOp::text(m, y, format!("#{}", self.number), FontStyle::Bold, 9.0, Color::BLACK),
            DrawOp::text(m + 12.0, y, tier_tag(self.tier), FontStyle::Bold, 8.0, tier_color(self.tier)),
        ];
        ops.push(match &self.preview {
            Some(preview) => {
                let room = g.width - g.margin - preview_x;
                let text = truncate_to_width(preview, FontStyle::Regular, 9.0, room);
                DrawOp::text(preview_x, y, text, FontStyle::Regular, 9.0, Color::GRAY_700)
            }
            None => DrawOp::text(preview_x, y, "(no comment)", FontStyle::Oblique, 9.0, Color::GRAY_400),
        });
        ops
    }
}

/// A resolved evidence image ready to place as a thumbnail.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub image: usize,
    /// Width / height.
    pub aspect: f64,
    /// Original file name of the upload.
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
}

pub struct FindingBlock {
    pub number: usize,
    pub tier: Option<EvidenceTier>,
    pub comment_lines: Vec<String>,
    pub logged_at: DateTime<Utc>,
    /// Number of attached evidence ids, resolved or not.
    pub evidence_count: usize,
    /// Thumbnails that resolved, at most `MAX_THUMBS`, in id order.
    pub thumbnails: Vec<Thumbnail>,
    pub proof: Option<ProofSnapRef>,
}

impl FindingBlock {
    pub fn comment_width(g: &PageGeometry) -> f64 {
        g.content_width() - COMMENT_INSET
    }

    pub fn wrap_comment(comment: Option<&str>, g: &PageGeometry) -> Vec<String> {
        match comment.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) => wrap_lines(c, FontStyle::Regular, COMMENT_SIZE_PT, Self::comment_width(g)),
            None => Vec::new(),
        }
    }

    fn line_count(&self) -> usize {
        self.comment_lines.len().max(1)
    }

    fn thumb_rows(&self) -> usize {
        self.evidence_count
            .min(MAX_THUMBS)
            .div_ceil(THUMBS_PER_ROW)
            .min(MAX_THUMB_ROWS)
    }

    pub fn thumbnail_reserve(&self) -> f64 {
        if self.evidence_count == 0 {
            0.0
        } else {
            THUMB_CAPTION_HEIGHT + THUMB_ROW_HEIGHT * self.thumb_rows() as f64
        }
    }

    pub fn proof_reserve(&self) -> f64 {
        if self.proof.is_some() {
            PROOF_RESERVE
        } else {
            0.0
        }
    }

    /// Drops comment lines until the block fits on one page. The last kept
    /// line ends with "..." when anything was cut.
    pub fn clamp_to_page(&mut self, g: &PageGeometry) {
        let fixed = FINDING_BASE_HEIGHT + self.thumbnail_reserve() + self.proof_reserve();
        let room = ((g.usable_height() - fixed) / FINDING_LINE_HEIGHT).floor();
        let max_lines = if room.is_finite() && room > 0.0 { room as usize + 1 } else { 1 };
        if self.comment_lines.len() <= max_lines {
            return;
        }
        self.comment_lines.truncate(max_lines);
        if let Some(last) = self.comment_lines.last_mut() {
            *last = truncate_to_width(
                &format!("{}...", last.trim_end()),
                FontStyle::Regular,
                COMMENT_SIZE_PT,
                Self::comment_width(g),
            );
        }
    }
}

impl Block for FindingBlock {
    fn height(&self) -> f64 {
        FINDING_BASE_HEIGHT
            + FINDING_LINE_HEIGHT * (self.line_count() - 1) as f64
            + self.thumbnail_reserve()
            + self.proof_reserve()
    }

    fn render(&self, top: f64, g: &PageGeometry) -> Vec<DrawOp> {
        let m = g.margin;
        let cw = g.content_width();
        let h = self.height();
        let inner = top + 10.0;
        let text_x = m + 18.0;

        let mut ops = vec![
            DrawOp::boxed(m, top, cw, h, Some(Color::GRAY_50), Color::GRAY_200),
            DrawOp::Circle {
                cx: m + 8.0,
                cy: inner,
                r: 6.0,
                fill: Color::RED_500,
            },
            DrawOp::text(m + 8.0, inner + 1.3, self.number.to_string(), FontStyle::Bold, 10.0, Color::WHITE)
                .aligned(Align::Center),
            DrawOp::text(text_x, inner + 2.0, format!("Finding #{}", self.number), FontStyle::Bold, 11.0, Color::BLACK),
            DrawOp::filled_rect(m + cw - 52.0, top + 6.0, 47.0, 8.0, tier_color(self.tier)),
            DrawOp::text(m + cw - 28.5, top + 11.5, tier_tag(self.tier), FontStyle::Bold, 8.0, Color::WHITE)
                .aligned(Align::Center),
        ];

        let comment_y = inner + 8.0;
        if self.comment_lines.is_empty() {
            ops.push(DrawOp::text(text_x, comment_y, "No comment provided", FontStyle::Oblique, 9.0, Color::GRAY_400));
        } else {
            for (i, line) in self.comment_lines.iter().enumerate() {
                let y = comment_y + FINDING_LINE_HEIGHT * i as f64;
                ops.push(DrawOp::text(text_x, y, line.clone(), FontStyle::Regular, COMMENT_SIZE_PT, Color::GRAY_700));
            }
        }

        let mut y = comment_y + FINDING_LINE_HEIGHT * (self.line_count() - 1) as f64 + 2.0;

        if self.evidence_count > 0 {
            let mut caption = format!("Supporting evidence: {} image(s)", self.evidence_count);
            if self.evidence_count > MAX_THUMBS {
                caption.push_str(&format!("  +{} more", self.evidence_count - MAX_THUMBS));
            }
            ops.push(DrawOp::text(text_x, y + 4.0, caption, FontStyle::Bold, 7.0, Color::GRAY_600));

            for (k, thumb) in self.thumbnails.iter().take(MAX_THUMBS).enumerate() {
                let cell_x = text_x + (THUMB_CELL + 2.0) * (k % THUMBS_PER_ROW) as f64;
                let cell_y = y + THUMB_CAPTION_HEIGHT + THUMB_ROW_HEIGHT * (k / THUMBS_PER_ROW) as f64;
                ops.push(DrawOp::boxed(cell_x, cell_y, THUMB_CELL, THUMB_CELL, Some(Color::WHITE), Color::GRAY_200));

                let (w, h) = fit_within(thumb.aspect, THUMB_CELL - 2.0, THUMB_CELL - 2.0);
                ops.push(DrawOp::Image {
                    x: cell_x + (THUMB_CELL - w) / 2.0,
                    y: cell_y + (THUMB_CELL - h) / 2.0,
                    w,
                    h,
                    image: thumb.image,
                });
                ops.push(DrawOp::text(
                    cell_x,
                    cell_y + THUMB_CELL + 3.0,
                    truncate_to_width(&thumb.name, FontStyle::Regular, THUMB_LABEL_PT, THUMB_CELL),
                    FontStyle::Regular,
                    THUMB_LABEL_PT,
                    Color::GRAY_700,
                ));
                ops.push(DrawOp::text(
                    cell_x,
                    cell_y + THUMB_CELL + 6.0,
                    thumb.uploaded_at.format("%Y-%m-%d %H:%M").to_string(),
                    FontStyle::Regular,
                    THUMB_LABEL_PT,
                    Color::GRAY_500,
                ));
            }
            y += self.thumbnail_reserve();
        }

        if let Some(proof) = &self.proof {
            let box_w = cw - 26.0;
            ops.push(DrawOp::boxed(text_x, y + 1.0, box_w, 12.0, Some(Color::GREEN_50), Color::GREEN_500));
            ops.push(DrawOp::text(
                text_x + 3.0,
                y + 5.5,
                truncate_to_width(&format!("ProofSnap Asset: {}", proof.asset_id), FontStyle::Bold, 8.0, box_w - 6.0),
                FontStyle::Bold,
                8.0,
                Color::GREEN_700,
            ));
            ops.push(DrawOp::text(
                text_x + 3.0,
                y + 10.0,
                truncate_to_width(&proof.url, FontStyle::Regular, 7.0, box_w - 6.0),
                FontStyle::Regular,
                7.0,
                Color::BLUE_500,
            ));
        }

        ops.push(DrawOp::text(
            text_x,
            top + h - 6.0,
            format!("Logged: {}", format_timestamp(&self.logged_at)),
            FontStyle::Regular,
            7.0,
            Color::GRAY_500,
        ));
        ops
    }
}

pub struct ConclusionBlock {
    pub lines: Vec<String>,
}

impl ConclusionBlock {
    pub fn new(text: &str, g: &PageGeometry) -> Self {
        Self {
            lines: wrap_lines(text, FontStyle::Regular, 9.0, g.content_width()),
        }
    }
}

impl Block for ConclusionBlock {
    fn height(&self) -> f64 {
        CONCLUSION_HEAD + CONCLUSION_LINE_HEIGHT * self.lines.len() as f64
    }

    fn render(&self, top: f64, g: &PageGeometry) -> Vec<DrawOp> {
        let mut ops = vec![
            DrawOp::rule(g.margin, g.width - g.margin, top, Color::GRAY_200, 0.5 / PT_TO_MM),
            DrawOp::text(g.margin, top + 10.0, "Conclusion", FontStyle::Bold, 12.0, Color::BLACK),
        ];
        for (i, line) in self.lines.iter().enumerate() {
            let y = top + CONCLUSION_HEAD + CONCLUSION_LINE_HEIGHT * i as f64;
            ops.push(DrawOp::text(g.margin, y, line.clone(), FontStyle::Regular, 9.0, Color::GRAY_700));
        }
        ops
    }
}

/// Prose summary of the tier distribution.
pub fn conclusion_text(title: &str, stats: &ReportStatistics) -> String {
    let mut parts = vec![format!(
        "This report documents {} finding(s) identified during the analysis of {}.",
        stats.total, title
    )];
    if stats.tier1 > 0 {
        parts.push(format!(
            "{} finding(s) include cryptographic evidence from ProofSnap, providing verifiable proof of investigation.",
            stats.tier1
        ));
    } else {
        parts.push("No cryptographic evidence was attached to the findings.".to_string());
    }
    if stats.tier2 > 0 {
        parts.push(format!(
            "{} finding(s) are backed by uploaded supporting evidence images.",
            stats.tier2
        ));
    }
    if stats.tier3 > 0 {
        parts.push(format!("{} finding(s) rest on investigator commentary only.", stats.tier3));
    }
    if stats.untiered > 0 {
        parts.push(format!("{} finding(s) carry no evidence.", stats.untiered));
    }
    parts.push(format!("Overall verification status: {}.", stats.status.label()));
    parts.push(
        "This report was generated by ImageProof Studio and should be reviewed by qualified personnel."
            .to_string(),
    );
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn finding(lines: usize, evidence: usize, proof: bool) -> FindingBlock {
        FindingBlock {
            number: 1,
            tier: None,
            comment_lines: (0..lines).map(|i| format!("line {i}")).collect(),
            logged_at: Utc::now(),
            evidence_count: evidence,
            thumbnails: Vec::new(),
            proof: proof.then(|| ProofSnapRef {
                asset_id: "p1".to_string(),
                url: "https://files.example/p1".to_string(),
            }),
        }
    }

    fn thumb(name: &str) -> Thumbnail {
        Thumbnail {
            image: 0,
            aspect: 2.0,
            name: name.to_string(),
            uploaded_at: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap(),
        }
    }

    fn max_text_right(ops: &[DrawOp]) -> f64 {
        ops.iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, text, style, size_pt, align: Align::Left, .. } => {
                    Some(x + crate::report::font_metrics::width_mm(text, *style, *size_pt))
                }
                _ => None,
            })
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_finding_height_formula() {
        assert_eq!(finding(0, 0, false).height(), 28.0);
        assert_eq!(finding(1, 0, false).height(), 28.0);
        assert_eq!(finding(4, 0, false).height(), 43.0);
        assert_eq!(finding(1, 1, false).height(), 28.0 + 6.0 + 37.0);
        assert_eq!(finding(1, 5, false).height(), 28.0 + 6.0 + 74.0);
        // More than two rows of ids still reserves two rows.
        assert_eq!(finding(1, 12, false).height(), 28.0 + 6.0 + 74.0);
        assert_eq!(finding(1, 0, true).height(), 42.0);
    }

    #[test]
    fn test_extra_evidence_summarised() {
        let g = PageGeometry::a4();
        let ops = finding(1, 11, false).render(20.0, &g);
        assert!(ops.iter().any(|op| op.text_content().is_some_and(|t| t.contains("+3 more"))));
    }

    #[test]
    fn test_render_stays_inside_block() {
        let g = PageGeometry::a4();
        let mut block = finding(3, 6, true);
        block.thumbnails = vec![thumb("e.png"); 6];
        let top = 30.0;
        let bottom = top + block.height();
        for op in block.render(top, &g) {
            match op {
                DrawOp::Text { y, .. } => assert!(y > top && y < bottom),
                DrawOp::Image { y, h, .. } => assert!(y >= top && y + h <= bottom),
                _ => {}
            }
        }
    }

    #[test]
    fn test_thumbnails_are_captioned_with_name_and_date() {
        let g = PageGeometry::a4();
        let mut block = finding(1, 2, false);
        block.thumbnails = vec![thumb("crowd.jpg"), thumb(&format!("{}.png", "very_long_name_".repeat(6)))];
        let ops = block.render(20.0, &g);
        let texts: Vec<&str> = ops.iter().filter_map(DrawOp::text_content).collect();
        assert!(texts.contains(&"crowd.jpg"));
        assert!(texts.contains(&"2024-03-09 14:05"));
        let long = texts.iter().find(|t| t.starts_with("very_long")).unwrap();
        assert!(long.ends_with("..."));
        assert!(crate::report::font_metrics::width_mm(long, FontStyle::Regular, THUMB_LABEL_PT) <= THUMB_CELL);
    }

    #[test]
    fn test_overlong_comment_is_clamped_to_one_page() {
        let g = PageGeometry::a4();
        let mut block = finding(120, 8, true);
        assert!(block.height() > g.usable_height());
        block.clamp_to_page(&g);
        assert!(block.height() <= g.usable_height());
        assert!(block.comment_lines.last().unwrap().ends_with("..."));

        let mut short = finding(3, 0, false);
        short.clamp_to_page(&g);
        assert_eq!(short.comment_lines, vec!["line 0", "line 1", "line 2"]);
    }

    #[test]
    fn test_wide_quick_ref_preview_stays_on_page() {
        let g = PageGeometry::a4();
        let line = QuickRefLine {
            number: 1,
            tier: None,
            preview: comment_preview(Some(&"W".repeat(80))),
        };
        let ops = line.render(30.0, &g);
        assert!(max_text_right(&ops) <= g.width - g.margin + 1e-9);
        assert!(ops.iter().any(|op| op.text_content().is_some_and(|t| t.starts_with('W') && t.ends_with("..."))));
    }

    #[test]
    fn test_long_investigator_name_is_truncated() {
        let g = PageGeometry::a4();
        let name = "Maximilian ".repeat(20);
        let ops = cover_ops(
            &CoverInfo {
                investigator: &name,
                generated_at: Utc::now(),
                subject: "Image #1",
                report_id: "ABC",
            },
            &ReportStatistics::from_annotations(&[]),
            &g,
        );
        let line = ops
            .iter()
            .filter_map(DrawOp::text_content)
            .find(|t| t.starts_with("Investigator:"))
            .unwrap();
        assert!(line.ends_with("..."));
        assert!(max_text_right(&ops) <= g.width - g.margin);
    }

    #[test]
    fn test_comment_preview_truncates_at_sixty_chars() {
        let long = "a".repeat(61);
        let preview = comment_preview(Some(&long)).unwrap();
        assert_eq!(preview, format!("{}...", "a".repeat(60)));
        assert_eq!(comment_preview(Some(&"b".repeat(60))).unwrap(), "b".repeat(60));
        assert_eq!(comment_preview(Some("   ")), None);
        assert_eq!(comment_preview(None), None);
    }

    #[test]
    fn test_fit_within_preserves_aspect() {
        assert_eq!(fit_within(2.0, 170.0, 160.0), (170.0, 85.0));
        assert_eq!(fit_within(0.5, 170.0, 160.0), (80.0, 160.0));
    }

    #[test]
    fn test_conclusion_mentions_distribution() {
        let stats = ReportStatistics::from_annotations(&[]);
        let text = conclusion_text("Image #3", &stats);
        assert!(text.contains("0 finding(s)"));
        assert!(text.contains("No cryptographic evidence"));
        assert!(text.contains("UNVERIFIED"));
    }

    #[test]
    fn test_footer_text() {
        let ops = footer_ops(2, 5, &PageGeometry::a4());
        assert!(ops.iter().any(|op| op.text_content() == Some("Page 2 of 5")));
    }
}
