//! Analysis core.
//!
//! - `select`: narrow the fund universe
//! - `aggregate`: per-security totals across funds
//! - `diff`: day-over-day comparison
//! - `rank`: ranked views for reporting

pub mod aggregate;
pub mod diff;
pub mod rank;
pub mod select;

pub use aggregate::*;
pub use diff::*;
pub use rank::*;
pub use select::*;
