//! Relevance scoring
//!
//! Scores are non-negative. A field value scores the fraction of its text
//! covered by the token, plus 0.5 when the match starts the value, times the
//! field weight.

use super::collection::{has_text, value_text};
use super::engine::PreparedSearch;
use super::options::{Conjunction, ScoreFn};
use super::tokenizer::Token;
use serde_json::Value;

/// Bonus for a match at the very start of the field value
pub const PREFIX_BONUS: f64 = 0.5;

/// Score one field value against one token
pub fn score_value(value: Option<&Value>, token: &Token, weight: f64) -> f64 {
    let Some(text) = value.and_then(value_text) else {
        return 0.0;
    };
    if text.is_empty() {
        return 0.0;
    }
    let Some(position) = token.find(&text) else {
        return 0.0;
    };

    let mut score = token.text.chars().count() as f64 / text.chars().count() as f64;
    if position == 0 {
        score += PREFIX_BONUS;
    }
    score * weight
}

/// Built-in scorer for a prepared search
pub fn score_function(search: &PreparedSearch) -> ScoreFn<'_> {
    let field_count = search.field_count();
    if field_count == 0 || search.is_empty_query() {
        return Box::new(|_: &Value| 1.0);
    }

    let token_score = move |token: &Token, record: &Value| -> f64 {
        match &token.field {
            Some(field) => {
                let value = search.get_attr(record, field);
                if token.pattern.is_none() {
                    if value.is_some_and(has_text) {
                        1.0 / field_count as f64
                    } else {
                        0.0
                    }
                } else {
                    score_value(value, token, 1.0)
                }
            }
            None => {
                let sum: f64 = search
                    .weights
                    .iter()
                    .map(|(field, weight)| score_value(search.get_attr(record, field), token, *weight))
                    .sum();
                sum / field_count as f64
            }
        }
    };

    let tokens = &search.tokens;
    if let [token] = tokens.as_slice() {
        return Box::new(move |record: &Value| token_score(token, record));
    }

    match search.options.conjunction {
        Conjunction::And => Box::new(move |record: &Value| {
            let mut sum = 0.0;
            for token in tokens {
                let score = token_score(token, record);
                if score <= 0.0 {
                    return 0.0;
                }
                sum += score;
            }
            sum
        }),
        Conjunction::Or => Box::new(move |record: &Value| {
            let sum: f64 = tokens.iter().map(|token| token_score(token, record)).sum();
            sum / tokens.len() as f64
        }),
    }
}
