//! Core library for lead-desk: a physician lead list with weighted scoring,
//! duplicate merging, and versioned snapshot backups.
//!
//! The [`store`] module owns the live record set, [`scoring`] is a pure
//! function of record attributes and a configured rule set, and [`backup`]
//! owns the snapshot files and never touches the live set. Everything is
//! synchronous and single-process; the store is passed by reference to each
//! operation rather than living in a global.

pub mod backup;
pub mod config;
pub mod errors;
pub mod flags;
pub mod output;
pub mod scoring;
pub mod store;
