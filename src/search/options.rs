//! Search options and the strategy hooks callers can inject

use super::collection::CandidateKey;
use super::engine::PreparedSearch;
use crate::error::SearchError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Synthetic sort field holding the computed score
pub const SCORE_FIELD: &str = "$score";

/// Whether every token must match or any token may contribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Conjunction {
    And,
    #[default]
    Or,
}

impl FromStr for Conjunction {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(Conjunction::And),
            "or" => Ok(Conjunction::Or),
            _ => Err(SearchError::InvalidConjunction(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl FromStr for Direction {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(SearchError::InvalidDirection(s.to_string())),
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

/// A searched field and its weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchField {
    pub field: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl SearchField {
    pub fn new(field: impl Into<String>) -> Self {
        Self::weighted(field, 1.0)
    }

    pub fn weighted(field: impl Into<String>, weight: f64) -> Self {
        Self {
            field: field.into(),
            weight,
        }
    }
}

/// `name` or `name:weight`
impl FromStr for SearchField {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((field, weight)) = s.rsplit_once(':') {
            if let Ok(weight) = weight.parse::<f64>() {
                return Ok(SearchField::weighted(field, weight));
            }
        }
        if s.is_empty() {
            return Err(SearchError::InvalidField(s.to_string()));
        }
        Ok(SearchField::new(s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SortField {
    pub field: String,
    #[serde(default)]
    pub direction: Direction,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// `field`, `field:asc` or `field:desc`
impl FromStr for SortField {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.rsplit_once(':') {
            Some((field, direction)) => (field, direction.parse()?),
            None => (s, Direction::Asc),
        };
        if field.is_empty() {
            return Err(SearchError::InvalidField(s.to_string()));
        }
        Ok(SortField {
            field: field.to_string(),
            direction,
        })
    }
}

/// One side of a sort comparison
#[derive(Debug, Clone, Copy)]
pub struct SortEntry<'a> {
    pub key: &'a CandidateKey,
    pub score: f64,
    pub candidate: &'a Value,
}

/// Per-candidate scoring closure
pub type ScoreFn<'a> = Box<dyn Fn(&Value) -> f64 + 'a>;

/// Builds the scoring closure for a prepared search, replacing the built-in scorer
pub type ScoreFactory = Arc<dyn for<'a> Fn(&'a PreparedSearch) -> ScoreFn<'a> + Send + Sync>;

/// Total order over result entries, replacing the built-in sort
pub type Comparator = Arc<dyn Fn(&SortEntry<'_>, &SortEntry<'_>) -> Ordering + Send + Sync>;

#[derive(Clone)]
pub enum Sort {
    Fields(Vec<SortField>),
    Custom(Comparator),
}

impl fmt::Debug for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            Sort::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<Vec<SortField>> for Sort {
    fn from(fields: Vec<SortField>) -> Self {
        Sort::Fields(fields)
    }
}

/// Options for one weighted search
#[derive(Clone)]
pub struct SearchOptions {
    /// Searched fields in order, each with a weight
    pub fields: Vec<SearchField>,
    pub conjunction: Conjunction,
    pub sort: Option<Sort>,
    /// Used instead of `sort` when the query is empty
    pub sort_empty: Option<Sort>,
    pub limit: Option<usize>,
    /// Drop candidates scoring zero
    pub filter: bool,
    pub diacritics: bool,
    pub respect_word_boundaries: bool,
    /// Treat field names as dotted paths
    pub nesting: bool,
    pub score: Option<ScoreFactory>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            conjunction: Conjunction::Or,
            sort: None,
            sort_empty: None,
            limit: None,
            filter: true,
            diacritics: true,
            respect_word_boundaries: false,
            nesting: false,
            score: None,
        }
    }
}

impl fmt::Debug for SearchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchOptions")
            .field("fields", &self.fields)
            .field("conjunction", &self.conjunction)
            .field("sort", &self.sort)
            .field("sort_empty", &self.sort_empty)
            .field("limit", &self.limit)
            .field("filter", &self.filter)
            .field("diacritics", &self.diacritics)
            .field("respect_word_boundaries", &self.respect_word_boundaries)
            .field("nesting", &self.nesting)
            .field("score", &self.score.as_ref().map(|_| ".."))
            .finish()
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(SearchField::new(field));
        self
    }

    pub fn with_weighted_field(mut self, field: impl Into<String>, weight: f64) -> Self {
        self.fields.push(SearchField::weighted(field, weight));
        self
    }

    pub fn with_conjunction(mut self, conjunction: Conjunction) -> Self {
        self.conjunction = conjunction;
        self
    }

    pub fn with_sort(mut self, fields: Vec<SortField>) -> Self {
        self.sort = Some(Sort::Fields(fields));
        self
    }

    pub fn with_sort_empty(mut self, fields: Vec<SortField>) -> Self {
        self.sort_empty = Some(Sort::Fields(fields));
        self
    }

    pub fn with_comparator<F>(mut self, compare: F) -> Self
    where
        F: Fn(&SortEntry<'_>, &SortEntry<'_>) -> Ordering + Send + Sync + 'static,
    {
        self.sort = Some(Sort::Custom(Arc::new(compare)));
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_filter(mut self, filter: bool) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_diacritics(mut self, diacritics: bool) -> Self {
        self.diacritics = diacritics;
        self
    }

    pub fn with_word_boundaries(mut self, respect: bool) -> Self {
        self.respect_word_boundaries = respect;
        self
    }

    pub fn with_nesting(mut self, nesting: bool) -> Self {
        self.nesting = nesting;
        self
    }

    pub fn with_score<F>(mut self, factory: F) -> Self
    where
        F: for<'a> Fn(&'a PreparedSearch) -> ScoreFn<'a> + Send + Sync + 'static,
    {
        self.score = Some(Arc::new(factory));
        self
    }
}
