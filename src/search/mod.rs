//! Search and ranking
//!
//! Two independent matchers share this module: the weighted multi-field
//! token search (`engine`) and the subsequence fuzzy matcher (`fuzzy`).

pub mod collection;
pub mod diacritics;
pub mod engine;
pub mod fuzzy;
pub mod options;
pub mod scoring;
pub mod sort;
pub mod tokenizer;

#[cfg(test)]
mod property_tests;

pub use collection::{CandidateKey, Collection};
pub use engine::{search, PreparedSearch, ResultEntry, ResultSet, SearchIndex};
pub use fuzzy::{filter_and_rank, filter_and_rank_by, fuzzy_match, fuzzy_test, FuzzyMatch, FuzzyOptions, Ranked};
pub use options::{Conjunction, Direction, SearchField, SearchOptions, Sort, SortEntry, SortField, SCORE_FIELD};
pub use tokenizer::{Token, Tokenizer};
