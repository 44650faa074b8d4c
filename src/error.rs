//! Error types for the search engine
//!
//! No-match is never an error: the fuzzy matcher returns `None` and the
//! weighted search returns a zero score. Everything here is a configuration
//! problem surfaced synchronously before any candidate is scored.

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid field name: {0:?}")]
    InvalidField(String),
    #[error("Invalid weight for field {field:?}: {weight} (must be a positive number)")]
    InvalidWeight { field: String, weight: f64 },
    #[error("Invalid lookup: {0}")]
    InvalidLookup(String),
    #[error("Invalid conjunction: {0:?} (expected \"and\" or \"or\")")]
    InvalidConjunction(String),
    #[error("Invalid sort direction: {0:?} (expected \"asc\" or \"desc\")")]
    InvalidDirection(String),
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SearchError {
    /// Stable machine-readable code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            SearchError::InvalidField(_) => "invalid_field",
            SearchError::InvalidWeight { .. } => "invalid_weight",
            SearchError::InvalidLookup(_) => "invalid_lookup",
            SearchError::InvalidConjunction(_) => "invalid_conjunction",
            SearchError::InvalidDirection(_) => "invalid_direction",
            SearchError::Pattern(_) => "pattern_error",
            SearchError::Config(_) => "config_error",
        }
    }
}
