//! Page-break-aware flow layout.
//!
//! Content is a sequence of fixed-height blocks. A block is never split: if its
//! projected bottom crosses the break limit, a new page is started before any
//! of it is drawn. A block taller than a whole page goes at the top of a fresh
//! page and is allowed to run past the limit.

use crate::report::page::{DrawOp, Page, PageGeometry};

pub trait Block {
    /// Height in millimetres, known before drawing.
    fn height(&self) -> f64;
    /// Draw operations for the block with its top edge at `top`.
    fn render(&self, top: f64, geometry: &PageGeometry) -> Vec<DrawOp>;
}

/// Where a block ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Zero-based page index.
    pub page: usize,
    pub top: f64,
    pub height: f64,
}

impl Placement {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

const EPSILON: f64 = 1e-6;

pub struct PageComposer {
    geometry: PageGeometry,
    pages: Vec<Page>,
    cursor: f64,
}

impl PageComposer {
    /// Starts with one empty page.
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::default()],
            cursor: geometry.top,
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn current_page(&self) -> usize {
        self.pages.len() - 1
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor = self.geometry.top;
    }

    pub fn at_page_top(&self) -> bool {
        (self.cursor - self.geometry.top).abs() < EPSILON
    }

    pub fn fits(&self, height: f64) -> bool {
        self.cursor + height <= self.geometry.break_limit + EPSILON
    }

    /// Starts a new page unless `height` more millimetres fit on this one.
    pub fn ensure(&mut self, height: f64) {
        if !self.fits(height) && !self.at_page_top() {
            self.new_page();
        }
    }

    /// Moves the cursor down, e.g. for spacing between sections.
    pub fn advance(&mut self, dy: f64) {
        self.cursor += dy;
    }

    pub fn place(&mut self, block: &dyn Block, gap_after: f64) -> Placement {
        let height = block.height();
        self.ensure(height);

        let top = self.cursor;
        let ops = block.render(top, &self.geometry);
        self.draw(ops);
        self.cursor = top + height + gap_after;

        Placement {
            page: self.current_page(),
            top,
            height,
        }
    }

    /// Draws onto the current page without moving the cursor.
    pub fn draw(&mut self, ops: impl IntoIterator<Item = DrawOp>) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.extend(ops);
        }
    }

    /// Runs once per page after composition, when the final page count is known.
    pub fn stamp_footers<F>(&mut self, footer: F)
    where
        F: Fn(usize, usize, &PageGeometry) -> Vec<DrawOp>,
    {
        let total = self.pages.len();
        for (i, page) in self.pages.iter_mut().enumerate() {
            page.ops.extend(footer(i + 1, total, &self.geometry));
        }
    }

    pub fn finish(self) -> Vec<Page> {
        self.pages
    }
}
