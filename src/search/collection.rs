//! Candidate collections and attribute access
//!
//! Candidates are JSON records owned by the caller. The engine only reads
//! them: fields are looked up by name (optionally as a dotted path) and
//! turned into text for scoring and sorting.

use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Stable identity of a candidate within its collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandidateKey {
    Int(i64),
    Str(String),
}

impl fmt::Display for CandidateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateKey::Int(i) => write!(f, "{}", i),
            CandidateKey::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for CandidateKey {
    fn from(value: i64) -> Self {
        CandidateKey::Int(value)
    }
}

impl From<&str> for CandidateKey {
    fn from(value: &str) -> Self {
        CandidateKey::Str(value.to_string())
    }
}

impl From<String> for CandidateKey {
    fn from(value: String) -> Self {
        CandidateKey::Str(value)
    }
}

/// Ordered collection of keyed candidate records
#[derive(Debug, Clone, Default)]
pub struct Collection {
    entries: Vec<(CandidateKey, Value)>,
    positions: HashMap<CandidateKey, usize>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records keyed by their index in `items`
    pub fn from_list(items: Vec<Value>) -> Self {
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (CandidateKey::Int(i as i64), item))
            .collect()
    }

    /// Records keyed by property name, in insertion order
    pub fn from_map(items: Map<String, Value>) -> Self {
        items
            .into_iter()
            .map(|(key, item)| (CandidateKey::Str(key), item))
            .collect()
    }

    /// Accepts a JSON array or object
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => Ok(Self::from_list(items)),
            Value::Object(items) => Ok(Self::from_map(items)),
            other => Err(SearchError::Config(format!(
                "candidates must be a JSON array or object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Insert a record; a repeated key replaces the earlier record in place
    pub fn insert(&mut self, key: CandidateKey, record: Value) {
        match self.positions.get(&key) {
            Some(&position) => self.entries[position].1 = record,
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, record));
            }
        }
    }

    pub fn get(&self, key: &CandidateKey) -> Option<&Value> {
        self.positions.get(key).map(|&i| &self.entries[i].1)
    }

    pub(crate) fn entry(&self, position: usize) -> (&CandidateKey, &Value) {
        let (key, record) = &self.entries[position];
        (key, record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CandidateKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl FromIterator<(CandidateKey, Value)> for Collection {
    fn from_iter<I: IntoIterator<Item = (CandidateKey, Value)>>(iter: I) -> Self {
        let mut collection = Collection::new();
        for (key, record) in iter {
            collection.insert(key, record);
        }
        collection
    }
}

/// Field accessor chosen once per search
pub type AttrFn = for<'a> fn(&'a Value, &str) -> Option<&'a Value>;

/// Direct property lookup
pub fn get_attr<'a>(record: &'a Value, name: &str) -> Option<&'a Value> {
    record.get(name)
}

/// Dotted-path lookup: `"author.name"` walks into nested objects
pub fn get_attr_nesting<'a>(record: &'a Value, name: &str) -> Option<&'a Value> {
    name.split('.').try_fold(record, |current, part| {
        if part.is_empty() {
            return None;
        }
        current.get(part)
    })
}

pub fn attr_fn(nesting: bool) -> AttrFn {
    if nesting {
        get_attr_nesting
    } else {
        get_attr
    }
}

/// Text form of a field value for matching and sorting.
///
/// Null and objects have no text form.
pub fn value_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        Value::Number(n) => Some(Cow::Owned(number_text(n))),
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Array(items) => Some(Cow::Owned(
            items
                .iter()
                .map(|item| value_text(item).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
        )),
    }
}

fn number_text(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        // f64 Display drops a zero fraction: 2.0 -> "2"
        n.as_f64().map_or_else(|| n.to_string(), |f| f.to_string())
    }
}

/// True when the value carries non-empty text
pub fn has_text(value: &Value) -> bool {
    value_text(value).is_some_and(|text| !text.is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_list_keys_by_index() {
        let collection = Collection::from_list(vec![json!({"a": 1}), json!({"a": 2})]);
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get(&CandidateKey::Int(1)), Some(&json!({"a": 2})));
    }

    #[test]
    fn test_from_map_keeps_insertion_order() {
        let value = json!({"zeta": {"n": 1}, "alpha": {"n": 2}});
        let collection = Collection::from_json(value).unwrap();
        let keys: Vec<String> = collection.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_from_json_rejects_scalars() {
        let err = Collection::from_json(json!("nope")).unwrap_err();
        assert_eq!(err.error_code(), "config_error");
    }

    #[test]
    fn test_insert_replaces_existing_key() {
        let mut collection = Collection::new();
        collection.insert("a".into(), json!(1));
        collection.insert("b".into(), json!(2));
        collection.insert("a".into(), json!(3));
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get(&"a".into()), Some(&json!(3)));
    }

    #[test]
    fn test_nested_lookup() {
        let record = json!({"author": {"name": "Ana"}, "title": "Notes"});
        assert_eq!(get_attr_nesting(&record, "author.name"), Some(&json!("Ana")));
        assert_eq!(get_attr_nesting(&record, "title"), Some(&json!("Notes")));
        assert_eq!(get_attr_nesting(&record, "author.email"), None);
        assert_eq!(get_attr_nesting(&record, "title.length"), None);
        assert_eq!(get_attr(&record, "author.name"), None);
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("x")).as_deref(), Some("x"));
        assert_eq!(value_text(&json!(42)).as_deref(), Some("42"));
        assert_eq!(value_text(&json!(2.0)).as_deref(), Some("2"));
        assert_eq!(value_text(&json!(2.5)).as_deref(), Some("2.5"));
        assert_eq!(value_text(&json!(true)).as_deref(), Some("true"));
        assert_eq!(value_text(&json!(["a", 1, null])).as_deref(), Some("a,1,"));
        assert_eq!(value_text(&json!(null)), None);
        assert_eq!(value_text(&json!({"k": 1})), None);
    }

    #[test]
    fn test_has_text() {
        assert!(has_text(&json!("a")));
        assert!(has_text(&json!(0)));
        assert!(!has_text(&json!("")));
        assert!(!has_text(&json!([])));
        assert!(!has_text(&json!(null)));
    }
}
