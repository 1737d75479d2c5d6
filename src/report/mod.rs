//! Reporting: terminal tables, the paged Markdown report and the returns chart.

pub mod chart;
pub mod document;
pub mod format;

pub use chart::*;
pub use document::*;
pub use format::*;
