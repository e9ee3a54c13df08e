//! Marker placement on the full-resolution subject image.
//!
//! Annotation coordinates were captured on the canvas as the UI rendered it,
//! so they are rescaled to the native resolution before markers are burnt in.

use image::GenericImageView;
use image::{DynamicImage, Rgb, RgbImage};

use crate::models::annotation::Annotation;

pub const MARKER_RADIUS_PX: f64 = 20.0;
pub const MARKER_STROKE_PX: f64 = 3.0;
pub const MARKER_LABEL_PX: f64 = 16.0;

const MARKER_FILL: [f64; 3] = [239.0, 68.0, 68.0];
const MARKER_ALPHA: f64 = 0.9;

/// Longest edge of the annotated image as embedded in the PDF.
pub const EMBED_MAX_PX: u32 = 2400;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerScale {
    pub sx: f64,
    pub sy: f64,
}

impl MarkerScale {
    pub const IDENTITY: MarkerScale = MarkerScale { sx: 1.0, sy: 1.0 };

    /// Native/rendered ratio per axis. Unusable rendered sizes give the identity.
    pub fn new(native_w: u32, native_h: u32, rendered_w: f64, rendered_h: f64) -> Self {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(rendered_w) || !usable(rendered_h) {
            return Self::IDENTITY;
        }
        Self {
            sx: native_w as f64 / rendered_w,
            sy: native_h as f64 / rendered_h,
        }
    }

    pub fn uniform(&self) -> f64 {
        self.sx.min(self.sy)
    }
}

/// A numbered marker in native image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub number: usize,
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub stroke: f64,
    pub label_px: f64,
}

/// One marker per annotation, numbered from 1 in list order.
pub fn scale_markers(annotations: &[Annotation], scale: MarkerScale) -> Vec<Marker> {
    let k = scale.uniform();
    annotations
        .iter()
        .enumerate()
        .map(|(i, a)| Marker {
            number: i + 1,
            cx: a.x * scale.sx,
            cy: a.y * scale.sy,
            radius: MARKER_RADIUS_PX * k,
            stroke: MARKER_STROKE_PX * k,
            label_px: MARKER_LABEL_PX * k,
        })
        .collect()
}

/// Paints each marker as a translucent red disc with a white ring.
pub fn burn_markers(img: &mut RgbImage, markers: &[Marker]) {
    let (w, h) = img.dimensions();
    for m in markers {
        let half = m.stroke / 2.0;
        let reach = m.radius + half;
        let x0 = (m.cx - reach).floor().max(0.0) as u32;
        let y0 = (m.cy - reach).floor().max(0.0) as u32;
        let x1 = ((m.cx + reach).ceil().max(0.0) as u32).min(w);
        let y1 = ((m.cy + reach).ceil().max(0.0) as u32).min(h);

        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f64 + 0.5 - m.cx;
                let dy = y as f64 + 0.5 - m.cy;
                let d = (dx * dx + dy * dy).sqrt();

                if (d - m.radius).abs() <= half {
                    img.put_pixel(x, y, Rgb([255, 255, 255]));
                } else if d < m.radius {
                    let px = img.get_pixel_mut(x, y);
                    for c in 0..3 {
                        let blended = MARKER_ALPHA * MARKER_FILL[c] + (1.0 - MARKER_ALPHA) * px.0[c] as f64;
                        px.0[c] = blended.round().clamp(0.0, 255.0) as u8;
                    }
                }
            }
        }
    }
}

/// Full-resolution copy of the subject with markers burnt in, downscaled for
/// embedding when it is very large.
pub fn annotated_copy(subject: &DynamicImage, markers: &[Marker]) -> DynamicImage {
    let mut rgb = subject.to_rgb8();
    burn_markers(&mut rgb, markers);
    let annotated = DynamicImage::ImageRgb8(rgb);
    let (w, h) = annotated.dimensions();
    if w.max(h) > EMBED_MAX_PX {
        annotated.resize(EMBED_MAX_PX, EMBED_MAX_PX, image::imageops::FilterType::Triangle)
    } else {
        annotated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64, y: f64) -> Annotation {
        Annotation::new("img", x, y)
    }

    #[test]
    fn test_identity_scale_when_rendered_matches_native() {
        let scale = MarkerScale::new(800, 600, 800.0, 600.0);
        assert_eq!(scale, MarkerScale::IDENTITY);
        let m = &scale_markers(&[at(120.0, 45.5)], scale)[0];
        assert_eq!((m.cx, m.cy), (120.0, 45.5));
        assert_eq!(m.radius, 20.0);
        assert_eq!(m.stroke, 3.0);
        assert_eq!(m.label_px, 16.0);
    }

    #[test]
    fn test_rescale_uses_min_axis_for_size() {
        // Rendered at half width, third height.
        let scale = MarkerScale::new(1600, 1800, 800.0, 600.0);
        let m = &scale_markers(&[at(100.0, 100.0)], scale)[0];
        assert_eq!((m.cx, m.cy), (200.0, 300.0));
        assert_eq!(m.radius, 40.0);
        assert_eq!(m.stroke, 6.0);
    }

    #[test]
    fn test_non_positive_rendered_size_is_identity() {
        assert_eq!(MarkerScale::new(800, 600, 0.0, 600.0), MarkerScale::IDENTITY);
        assert_eq!(MarkerScale::new(800, 600, 800.0, -1.0), MarkerScale::IDENTITY);
        assert_eq!(MarkerScale::new(800, 600, f64::NAN, 600.0), MarkerScale::IDENTITY);
    }

    #[test]
    fn test_markers_numbered_in_list_order() {
        let markers = scale_markers(&[at(1.0, 1.0), at(2.0, 2.0), at(3.0, 3.0)], MarkerScale::IDENTITY);
        let numbers: Vec<usize> = markers.iter().map(|m| m.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_burn_paints_fill_and_ring() {
        let mut img = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        let markers = scale_markers(&[at(50.0, 50.0)], MarkerScale::IDENTITY);
        burn_markers(&mut img, &markers);

        let centre = img.get_pixel(50, 50).0;
        assert_eq!(centre, [215, 61, 61]);
        // On the ring (distance ~20 from centre).
        assert_eq!(img.get_pixel(69, 50).0, [255, 255, 255]);
        // Outside the marker is untouched.
        assert_eq!(img.get_pixel(5, 5).0, [0, 0, 0]);
    }

    #[test]
    fn test_marker_near_edge_is_clipped() {
        let mut img = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        let markers = scale_markers(&[at(0.0, 0.0), at(500.0, 500.0)], MarkerScale::IDENTITY);
        burn_markers(&mut img, &markers);
        assert_ne!(img.get_pixel(0, 0).0, [0, 0, 0]);
    }
}
