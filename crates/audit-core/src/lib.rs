//! Domain model and shared helpers for provider audit metrics.
//!
//! Holds the audit record types, the error taxonomy, ratio / percentile
//! statistics, date parsing, display formatting and CLI settings used by the
//! data and UI crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod stats;
pub mod time_utils;
