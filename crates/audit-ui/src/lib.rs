//! Terminal UI layer for the provider audit engine.
//!
//! Provides themes, the header and rate-bar components, table and chart
//! views for every analysis, and the application event loop built on top of
//! [`ratatui`].

pub mod app;
pub mod chart_view;
pub mod components;
pub mod table_view;
pub mod themes;

pub use audit_core as core;
