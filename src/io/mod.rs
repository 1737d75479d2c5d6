//! Input/output helpers.
//!
//! - provider row normalization + validation (`ingest`)
//! - daily snapshot CSV store (`snapshot`)
//! - diff export (CSV) (`export`)

pub mod export;
pub mod ingest;
pub mod snapshot;

pub use export::*;
pub use ingest::*;
pub use snapshot::*;
