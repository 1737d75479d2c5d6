//! `etf-consensus` library crate.
//!
//! The binary (`etfc`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the aggregation/diff engine is reusable outside the CLI
//! - code stays easy to navigate as the project grows

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
