//! Investigation report: statistics, page layout and PDF output.

pub mod blocks;
pub mod compose;
pub mod font_metrics;
pub mod handlers;
pub mod layout;
pub mod page;
pub mod pdf;
pub mod raster;
pub mod stats;
