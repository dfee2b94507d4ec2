//! Output sinks for produced gazette records.
//!
//! # Submodules
//!
//! - [`json`]: JSON files per spider and run date, or JSON lines on stdout

pub mod json;
