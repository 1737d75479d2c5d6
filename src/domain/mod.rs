//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - holdings at each stage (`RawHolding` -> `HoldingRecord` -> `AggregatedHolding`)
//! - day-level snapshots and their comparison rows (`DailySnapshot`, `DiffedHolding`)
//! - fund-level metadata and run configuration
//! - calendar helpers for finding the prior snapshot

pub mod calendar;
pub mod types;

pub use calendar::*;
pub use types::*;
