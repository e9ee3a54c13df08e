//! Page geometry and the drawing operations a composed page is made of.
//!
//! All coordinates are millimetres from the top-left corner of the page, with
//! `y` growing downwards. Text `y` is the baseline. The PDF writer flips axes.

use crate::report::font_metrics::FontStyle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    /// Where flowing content starts on a fresh page.
    pub top: f64,
    /// Flowing content must end above this line.
    pub break_limit: f64,
    /// Baseline of the footer rule.
    pub footer_rule: f64,
    pub footer_text: f64,
}

impl PageGeometry {
    pub const fn a4() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margin: 20.0,
            top: 20.0,
            break_limit: 260.0,
            footer_rule: 282.0,
            footer_text: 287.0,
        }
    }

    pub fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    /// Tallest block a single page can hold.
    pub fn usable_height(&self) -> f64 {
        self.break_limit - self.top
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const BLACK: Color = Color(0, 0, 0);
    pub const WHITE: Color = Color(255, 255, 255);
    pub const GRAY_50: Color = Color(249, 250, 251);
    pub const GRAY_200: Color = Color(229, 231, 235);
    pub const GRAY_400: Color = Color(156, 163, 175);
    pub const GRAY_500: Color = Color(107, 114, 128);
    pub const GRAY_600: Color = Color(75, 85, 99);
    pub const GRAY_700: Color = Color(55, 65, 81);
    pub const GRAY_900: Color = Color(31, 41, 55);
    pub const BLUE_50: Color = Color(239, 246, 255);
    pub const BLUE_200: Color = Color(191, 219, 254);
    pub const BLUE_500: Color = Color(59, 130, 246);
    pub const BLUE_800: Color = Color(30, 64, 175);
    pub const GREEN_50: Color = Color(240, 253, 244);
    pub const GREEN_500: Color = Color(34, 197, 94);
    pub const GREEN_700: Color = Color(21, 128, 61);
    pub const AMBER_500: Color = Color(245, 158, 11);
    pub const RED_500: Color = Color(239, 68, 68);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width_pt: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f64,
        y: f64,
        text: String,
        style: FontStyle,
        size_pt: f64,
        color: Color,
        align: Align,
    },
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        fill: Color,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: Stroke,
    },
    /// Places image `image` of the report's image list into the given box.
    Image {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        image: usize,
    },
}

impl DrawOp {
    pub fn text(x: f64, y: f64, text: impl Into<String>, style: FontStyle, size_pt: f64, color: Color) -> Self {
        DrawOp::Text {
            x,
            y,
            text: text.into(),
            style,
            size_pt,
            color,
            align: Align::Left,
        }
    }

    pub fn aligned(self, align: Align) -> Self {
        match self {
            DrawOp::Text {
                x,
                y,
                text,
                style,
                size_pt,
                color,
                ..
            } => DrawOp::Text {
                x,
                y,
                text,
                style,
                size_pt,
                color,
                align,
            },
            other => other,
        }
    }

    pub fn filled_rect(x: f64, y: f64, w: f64, h: f64, fill: Color) -> Self {
        DrawOp::Rect {
            x,
            y,
            w,
            h,
            fill: Some(fill),
            stroke: None,
        }
    }

    pub fn boxed(x: f64, y: f64, w: f64, h: f64, fill: Option<Color>, stroke: Color) -> Self {
        DrawOp::Rect {
            x,
            y,
            w,
            h,
            fill,
            stroke: Some(Stroke {
                color: stroke,
                width_pt: 0.5,
            }),
        }
    }

    pub fn rule(x1: f64, x2: f64, y: f64, color: Color, width_pt: f64) -> Self {
        DrawOp::Line {
            x1,
            y1: y,
            x2,
            y2: y,
            stroke: Stroke { color, width_pt },
        }
    }

    /// Text content, for ops that carry any.
    pub fn text_content(&self) -> Option<&str> {
        match self {
            DrawOp::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(DrawOp::text_content)
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}
