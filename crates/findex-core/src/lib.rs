//! Shared foundation for the findex workspace.
//!
//! Holds everything the scan pipeline and the query layer agree on:
//! error enums, the TOML configuration schema, the on-disk data models,
//! path identity helpers, and the cancellation token.

pub mod cancel;
pub mod config;
pub mod errors;
pub mod models;
pub mod paths;
pub mod source;
