//! Serializes composed pages to PDF with the built-in Helvetica faces.

use image::DynamicImage;
use image::GenericImageView;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::utils::calculate_points_for_circle;
use printpdf::{
    BuiltinFont, Color as PdfColor, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Polygon, Pt, Rect, Rgb,
};

use crate::report::compose::{ComposedReport, ReportError};
use crate::report::font_metrics::{width_mm, FontStyle};
use crate::report::page::{Align, Color, DrawOp, PageGeometry, Stroke};

const IMAGE_DPI: f32 = 300.0;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

impl Fonts {
    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Oblique => &self.oblique,
        }
    }
}

fn pdf_color(c: Color) -> PdfColor {
    PdfColor::Rgb(Rgb::new(
        c.0 as f32 / 255.0,
        c.1 as f32 / 255.0,
        c.2 as f32 / 255.0,
        None,
    ))
}

/// Built-in fonts only cover a single-byte encoding; anything else prints as '?'.
fn pdf_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c,
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            c if c.is_whitespace() => ' ',
            _ => '?',
        })
        .collect()
}

pub fn render_pdf(report: &ComposedReport, title: &str) -> Result<Vec<u8>, ReportError> {
    let g = PageGeometry::a4();
    let pdf_err = |e: printpdf::Error| ReportError::Pdf(e.to_string());

    let (doc, first_page, first_layer) =
        PdfDocument::new(pdf_safe(title), Mm(g.width as f32), Mm(g.height as f32), "Layer 1".to_string());
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?,
        oblique: doc.add_builtin_font(BuiltinFont::HelveticaOblique).map_err(pdf_err)?,
    };

    // printpdf wants 8-bit RGB without alpha.
    let images: Vec<DynamicImage> = report
        .images
        .iter()
        .map(|img| DynamicImage::ImageRgb8(img.to_rgb8()))
        .collect();

    for (i, page) in report.pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = doc.add_page(Mm(g.width as f32), Mm(g.height as f32), "Layer 1");
            doc.get_page(p).get_layer(l)
        };
        for op in &page.ops {
            draw(&layer, op, &fonts, &images, &g);
        }
    }

    doc.save_to_bytes().map_err(pdf_err)
}

/// Converts a top-left based `y` in millimetres to PDF user space.
fn flip(g: &PageGeometry, y: f64) -> Mm {
    Mm((g.height - y) as f32)
}

fn apply_stroke(layer: &PdfLayerReference, stroke: &Stroke) {
    layer.set_outline_color(pdf_color(stroke.color));
    layer.set_outline_thickness(stroke.width_pt as f32);
}

fn draw(layer: &PdfLayerReference, op: &DrawOp, fonts: &Fonts, images: &[DynamicImage], g: &PageGeometry) {
    match op {
        DrawOp::Text {
            x,
            y,
            text,
            style,
            size_pt,
            color,
            align,
        } => {
            let text = pdf_safe(text);
            let w = width_mm(&text, *style, *size_pt);
            let left = match align {
                Align::Left => *x,
                Align::Center => x - w / 2.0,
                Align::Right => x - w,
            };
            layer.set_fill_color(pdf_color(*color));
            layer.use_text(text, *size_pt as f32, Mm(left as f32), flip(g, *y), fonts.get(*style));
        }
        DrawOp::Rect {
            x,
            y,
            w,
            h,
            fill,
            stroke,
        } => {
            let mode = match (fill, stroke) {
                (Some(_), Some(_)) => PaintMode::FillStroke,
                (Some(_), None) => PaintMode::Fill,
                (None, Some(_)) => PaintMode::Stroke,
                (None, None) => return,
            };
            if let Some(fill) = fill {
                layer.set_fill_color(pdf_color(*fill));
            }
            if let Some(stroke) = stroke {
                apply_stroke(layer, stroke);
            }
            let rect = Rect::new(
                Mm(*x as f32),
                flip(g, y + h),
                Mm((x + w) as f32),
                flip(g, *y),
            )
            .with_mode(mode);
            layer.add_rect(rect);
        }
        DrawOp::Circle { cx, cy, r, fill } => {
            layer.set_fill_color(pdf_color(*fill));
            let points = calculate_points_for_circle(
                Pt::from(Mm(*r as f32)),
                Pt::from(Mm(*cx as f32)),
                Pt::from(flip(g, *cy)),
            );
            layer.add_polygon(Polygon {
                rings: vec![points],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            });
        }
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
        } => {
            apply_stroke(layer, stroke);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x1 as f32), flip(g, *y1)), false),
                    (Point::new(Mm(*x2 as f32), flip(g, *y2)), false),
                ],
                is_closed: false,
            });
        }
        DrawOp::Image { x, y, w, h, image } => {
            let Some(img) = images.get(*image) else {
                return;
            };
            let (px_w, px_h) = img.dimensions();
            if px_w == 0 || px_h == 0 {
                return;
            }
            // Natural size at IMAGE_DPI, in millimetres.
            let natural_w = px_w as f64 / IMAGE_DPI as f64 * 25.4;
            let natural_h = px_h as f64 / IMAGE_DPI as f64 * 25.4;
            Image::from_dynamic_image(img).add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(*x as f32)),
                    translate_y: Some(flip(g, y + h)),
                    scale_x: Some((w / natural_w) as f32),
                    scale_y: Some((h / natural_h) as f32),
                    dpi: Some(IMAGE_DPI),
                    ..Default::default()
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_safe_replaces_unsupported_chars() {
        assert_eq!(pdf_safe("View Evidence \u{2192}"), "View Evidence ?");
        assert_eq!(pdf_safe("\u{201C}quoted\u{201D}\tok"), "\"quoted\" ok");
        assert_eq!(pdf_safe("plain #1"), "plain #1");
    }

    #[test]
    fn test_flip_is_measured_from_bottom() {
        let g = PageGeometry::a4();
        assert_eq!(flip(&g, 0.0).0, 297.0);
        assert_eq!(flip(&g, 287.0).0, 10.0);
    }
}
