//! Weighted Search Engine
//!
//! Ties together tokenizing, scoring and sorting over a collection of
//! JSON records to produce a ranked, limited result set.

use super::collection::{attr_fn, AttrFn, CandidateKey, Collection};
use super::options::{SearchOptions, SortEntry, ScoreFn};
use super::scoring;
use super::sort::{self, SortFn};
use super::tokenizer::{Token, Tokenizer};
use crate::error::{Result, SearchError};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Instant;
use tracing::debug;

/// A query tokenized and validated against its options, ready to score
pub struct PreparedSearch {
    /// Query text as given
    pub query: String,
    pub tokens: Vec<Token>,
    /// Searched fields with weights, in order, without duplicates
    pub weights: Vec<(String, f64)>,
    pub options: SearchOptions,
    attr: AttrFn,
}

impl fmt::Debug for PreparedSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedSearch")
            .field("query", &self.query)
            .field("tokens", &self.tokens)
            .field("weights", &self.weights)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl PreparedSearch {
    /// True when the query holds no tokens (empty or only whitespace)
    pub fn is_empty_query(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn field_count(&self) -> usize {
        self.weights.len()
    }

    /// Look up a field on a candidate, honouring the nesting option
    pub fn get_attr<'v>(&self, record: &'v Value, field: &str) -> Option<&'v Value> {
        (self.attr)(record, field)
    }
}

/// One ranked candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    pub id: CandidateKey,
    pub score: f64,
}

/// Outcome of a search
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet {
    pub query: String,
    pub tokens: Vec<Token>,
    pub items: Vec<ResultEntry>,
    /// Number of entries before the limit was applied
    pub total: usize,
}

/// Search index over a borrowed collection
#[derive(Debug, Clone, Copy)]
pub struct SearchIndex<'c> {
    items: &'c Collection,
}

impl<'c> SearchIndex<'c> {
    pub fn new(items: &'c Collection) -> Self {
        Self { items }
    }

    /// Validate options and tokenize the query
    pub fn prepare_search(&self, query: &str, options: &SearchOptions) -> Result<PreparedSearch> {
        let mut weights: Vec<(String, f64)> = Vec::with_capacity(options.fields.len());
        for field in &options.fields {
            if field.field.is_empty() {
                return Err(SearchError::InvalidField(field.field.clone()));
            }
            if !field.weight.is_finite() || field.weight <= 0.0 {
                return Err(SearchError::InvalidWeight {
                    field: field.field.clone(),
                    weight: field.weight,
                });
            }
            // Repeated field keeps its first position, last weight wins
            match weights.iter_mut().find(|(name, _)| *name == field.field) {
                Some(existing) => existing.1 = field.weight,
                None => weights.push((field.field.clone(), field.weight)),
            }
        }

        let names: Vec<&str> = weights.iter().map(|(name, _)| name.as_str()).collect();
        let tokens = Tokenizer::new(options.diacritics, options.respect_word_boundaries)
            .tokenize(query, &names)?;

        Ok(PreparedSearch {
            query: query.to_string(),
            tokens,
            weights,
            options: options.clone(),
            attr: attr_fn(options.nesting),
        })
    }

    /// Scorer for a prepared search: the injected factory if any, else the built-in one
    pub fn get_score_function<'s>(&self, search: &'s PreparedSearch) -> ScoreFn<'s> {
        match &search.options.score {
            Some(factory) => factory(search),
            None => scoring::score_function(search),
        }
    }

    pub fn get_sort_function<'s>(&self, search: &'s PreparedSearch) -> Option<SortFn<'s>> {
        sort::sort_function(search)
    }

    /// Score, filter, sort and limit the collection for `query`
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<ResultSet> {
        let start = Instant::now();
        let prepared = self.prepare_search(query, options)?;

        let scored = {
            let score = self.get_score_function(&prepared);
            let mut scored: Vec<(usize, f64)> = Vec::new();
            for (position, (_, record)) in self.items.iter().enumerate() {
                let value = score(record);
                if !prepared.options.filter || value > 0.0 {
                    scored.push((position, value));
                }
            }

            if let Some(compare) = self.get_sort_function(&prepared) {
                scored.sort_by(|&(pa, sa), &(pb, sb)| {
                    compare(&self.sort_entry(pa, sa), &self.sort_entry(pb, sb))
                });
            }
            scored
        };

        let total = scored.len();
        let limit = prepared.options.limit.unwrap_or(total);
        let items: Vec<ResultEntry> = scored
            .into_iter()
            .take(limit)
            .map(|(position, score)| ResultEntry {
                id: self.items.entry(position).0.clone(),
                score,
            })
            .collect();

        debug!(
            "Search {:?}: {} tokens, {}/{} candidates matched, {} returned in {:?}",
            query,
            prepared.tokens.len(),
            total,
            self.items.len(),
            items.len(),
            start.elapsed()
        );

        Ok(ResultSet {
            query: prepared.query,
            tokens: prepared.tokens,
            items,
            total,
        })
    }

    fn sort_entry(&self, position: usize, score: f64) -> SortEntry<'c> {
        let (key, candidate) = self.items.entry(position);
        SortEntry {
            key,
            score,
            candidate,
        }
    }
}

/// Search `items` for `query` in one call
pub fn search(query: &str, items: &Collection, options: &SearchOptions) -> Result<ResultSet> {
    SearchIndex::new(items).search(query, options)
}
