//! Query layer over the index stores.
//!
//! A [`Searcher`] opens every configured index store read-shared and
//! answers full-text searches with structured filters, by-id lookups,
//! directory browsing with cached sizes, and statistics queries. Reads
//! never coordinate with scanners: the atomic swap guarantees each opened
//! store is a complete dataset.

pub mod fts;
pub mod searcher;
pub mod stats;

pub use searcher::{FileFilter, Searcher};
