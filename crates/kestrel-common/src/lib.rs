//! Common utilities for the Kestrel layout core.
//!
//! This crate provides shared infrastructure used by all Kestrel crates:
//! - **Warning System** - deduplicated diagnostics routed through `log`

pub mod warning;
