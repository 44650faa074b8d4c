//! Result ordering
//!
//! Builds a comparator over scored entries. Numbers compare numerically,
//! everything else as folded lowercase text. `$score` reads the computed
//! score rather than a candidate field.

use super::collection::value_text;
use super::diacritics::asciifold;
use super::engine::PreparedSearch;
use super::options::{Direction, Sort, SortEntry, SortField, SCORE_FIELD};
use serde_json::Value;
use std::cmp::Ordering;

/// Comparator over two result entries
pub type SortFn<'a> = Box<dyn Fn(&SortEntry<'_>, &SortEntry<'_>) -> Ordering + 'a>;

fn boxed<'a, F>(compare: F) -> SortFn<'a>
where
    F: Fn(&SortEntry<'_>, &SortEntry<'_>) -> Ordering + 'a,
{
    Box::new(compare)
}

/// A sort key value: either the computed score or a candidate field
#[derive(Debug, Clone, Copy)]
enum SortValue<'a> {
    Score(f64),
    Field(Option<&'a Value>),
}

impl SortValue<'_> {
    fn as_number(&self) -> Option<f64> {
        match self {
            SortValue::Score(score) => Some(*score),
            SortValue::Field(Some(Value::Number(n))) => n.as_f64(),
            SortValue::Field(_) => None,
        }
    }

    fn folded(&self) -> String {
        match self {
            SortValue::Score(score) => score.to_string(),
            SortValue::Field(value) => value
                .and_then(value_text)
                .map(|text| asciifold(&text))
                .unwrap_or_default(),
        }
    }
}

fn compare_sort_values(a: SortValue<'_>, b: SortValue<'_>) -> Ordering {
    if let (Some(a), Some(b)) = (a.as_number(), b.as_number()) {
        return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    }
    a.folded().cmp(&b.folded())
}

/// Compare two field values. A missing value sorts as empty text.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    compare_sort_values(SortValue::Field(a), SortValue::Field(b))
}

/// Sort keys in effect for a search, after the implicit score rules.
///
/// A non-empty query ranks by score first unless `$score` is listed; an
/// empty query drops score keys since every candidate scores the same.
pub fn effective_sort_fields(fields: &[SortField], empty_query: bool) -> Vec<SortField> {
    if empty_query {
        return fields
            .iter()
            .filter(|sort| sort.field != SCORE_FIELD)
            .cloned()
            .collect();
    }

    let mut fields = fields.to_vec();
    if !fields.iter().any(|sort| sort.field == SCORE_FIELD) {
        fields.insert(0, SortField::desc(SCORE_FIELD));
    }
    fields
}

/// Comparator for a prepared search, or `None` to keep insertion order
pub fn sort_function(search: &PreparedSearch) -> Option<SortFn<'_>> {
    let empty_query = search.is_empty_query();
    let options = &search.options;
    let sort = if empty_query {
        options.sort_empty.as_ref().or(options.sort.as_ref())
    } else {
        options.sort.as_ref()
    };

    let fields = match sort {
        Some(Sort::Custom(compare)) => {
            let compare = compare.clone();
            return Some(boxed(move |a, b| compare(a, b)));
        }
        Some(Sort::Fields(fields)) => effective_sort_fields(fields, empty_query),
        None => effective_sort_fields(&[], empty_query),
    };
    if fields.is_empty() {
        return None;
    }

    Some(boxed(move |a, b| {
        for sort in &fields {
            let ordering = if sort.field == SCORE_FIELD {
                compare_sort_values(SortValue::Score(a.score), SortValue::Score(b.score))
            } else {
                compare_values(
                    search.get_attr(a.candidate, &sort.field),
                    search.get_attr(b.candidate, &sort.field),
                )
            };
            let ordering = match sort.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_compare_numerically() {
        assert_eq!(compare_values(Some(&json!(9)), Some(&json!(10))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(2.5)), Some(&json!(2))), Ordering::Greater);
    }

    #[test]
    fn test_mixed_types_compare_as_text() {
        // "10" < "9" as text
        assert_eq!(compare_values(Some(&json!("10")), Some(&json!(9))), Ordering::Less);
    }

    #[test]
    fn test_text_folds_case_and_accents() {
        assert_eq!(compare_values(Some(&json!("Émile")), Some(&json!("emile"))), Ordering::Equal);
        assert_eq!(compare_values(Some(&json!("b")), Some(&json!("A"))), Ordering::Greater);
    }

    #[test]
    fn test_missing_sorts_as_empty() {
        assert_eq!(compare_values(None, Some(&json!("a"))), Ordering::Less);
        assert_eq!(compare_values(None, Some(&json!(""))), Ordering::Equal);
        assert_eq!(compare_values(Some(&json!(null)), None), Ordering::Equal);
    }

    #[test]
    fn test_implicit_score_key() {
        let fields = effective_sort_fields(&[SortField::asc("name")], false);
        assert_eq!(fields, vec![SortField::desc(SCORE_FIELD), SortField::asc("name")]);

        let explicit = vec![SortField::asc("name"), SortField::asc(SCORE_FIELD)];
        assert_eq!(effective_sort_fields(&explicit, false), explicit);
    }

    #[test]
    fn test_empty_query_drops_score_key() {
        let fields = effective_sort_fields(&[SortField::desc(SCORE_FIELD), SortField::asc("name")], true);
        assert_eq!(fields, vec![SortField::asc("name")]);
        assert!(effective_sort_fields(&[], true).is_empty());
    }
}
