//! Data layer for the provider audit engine.
//!
//! Loads claim-level audit CSVs, derives per-row rates and runs the
//! analytical views (provider summary, cohort overlap, new providers,
//! high-volume outliers, monthly trend, distributions) that the UI and the
//! JSON output consume.

pub mod analysis;
pub mod cohort;
pub mod derive;
pub mod outliers;
pub mod reader;
pub mod series;
pub mod summary;
pub mod trend;

pub use audit_core as core;
