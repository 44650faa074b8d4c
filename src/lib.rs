//! typeahead: search and ranking for autocomplete
//!
//! - [`search`]: tokenized, weighted, multi-field search over JSON records,
//!   diacritic-insensitive by default, plus a subsequence fuzzy matcher
//! - [`mention`]: `@mention` trigger detection and suggestion ranking
//! - [`cache`]: last-query memo for callers that re-run queries
//! - [`config`]: JSON configuration file

pub mod cache;
pub mod config;
pub mod error;
pub mod mention;
pub mod search;

pub use error::{Result, SearchError};
