//! Reusable line-level widgets.

pub mod header;
pub mod rate_bar;
