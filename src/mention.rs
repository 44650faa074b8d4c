//! Mention autocomplete
//!
//! Text-level half of an `@mention` menu: finding the trigger the user is
//! typing after, ranking the collection's records against the typed text,
//! and splicing the chosen record back into the text.

use crate::error::{Result, SearchError};
use crate::search::collection::value_text;
use crate::search::fuzzy::{filter_and_rank_by, FuzzyOptions, Ranked};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

const NO_BREAK_SPACE: char = '\u{00A0}';

/// Computes the text a record is matched on, given the typed mention text
pub type LookupFn = Arc<dyn Fn(&Value, &str) -> String + Send + Sync>;

/// How the comparable text is pulled out of a record
#[derive(Clone)]
pub enum Lookup {
    /// Property name
    Key(String),
    Computed(LookupFn),
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Lookup::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl Default for Lookup {
    fn default() -> Self {
        Lookup::Key("key".to_string())
    }
}

impl Lookup {
    pub fn computed<F>(lookup: F) -> Self
    where
        F: Fn(&Value, &str) -> String + Send + Sync + 'static,
    {
        Lookup::Computed(Arc::new(lookup))
    }

    /// A lookup from configuration must be a property name
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(key) if !key.is_empty() => Ok(Lookup::Key(key.clone())),
            other => Err(SearchError::InvalidLookup(other.to_string())),
        }
    }

    pub fn text<'v>(&self, record: &'v Value, mention_text: &str) -> Option<Cow<'v, str>> {
        match self {
            Lookup::Key(key) => record.get(key).and_then(value_text),
            Lookup::Computed(lookup) => Some(Cow::Owned(lookup(record, mention_text))),
        }
    }
}

/// One trigger and the records it offers
#[derive(Debug, Clone)]
pub struct MentionCollection {
    pub trigger: String,
    pub lookup: Lookup,
    /// Property inserted into the text when a record is chosen
    pub fill_attr: String,
    pub menu_item_limit: Option<usize>,
    /// Trigger must start the text or follow whitespace
    pub require_leading_space: bool,
    /// Mention text may contain plain spaces
    pub allow_spaces: bool,
    pub values: Vec<Value>,
}

impl Default for MentionCollection {
    fn default() -> Self {
        Self {
            trigger: "@".to_string(),
            lookup: Lookup::default(),
            fill_attr: "value".to_string(),
            menu_item_limit: None,
            require_leading_space: true,
            allow_spaces: false,
            values: Vec::new(),
        }
    }
}

impl MentionCollection {
    pub fn new(trigger: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            trigger: trigger.into(),
            values,
            ..Self::default()
        }
    }

    /// Rank `values` against the typed mention text, best first
    pub fn suggest<'a>(&'a self, mention_text: &str, options: &FuzzyOptions) -> Vec<Ranked<'a, Value>> {
        let mut ranked = filter_and_rank_by(mention_text, &self.values, options, |record| {
            self.lookup.text(record, mention_text)
        });
        if let Some(limit) = self.menu_item_limit {
            ranked.truncate(limit);
        }
        ranked
    }

    /// Text that replaces the trigger and mention text for `record`
    pub fn replacement(&self, record: &Value) -> String {
        let fill = record
            .get(&self.fill_attr)
            .and_then(value_text)
            .unwrap_or_default();
        format!("{}{}", self.trigger, fill)
    }

    fn trigger_position(&self, text: &str) -> Option<usize> {
        if self.trigger.is_empty() {
            return None;
        }
        if !self.require_leading_space {
            return text.rfind(&self.trigger);
        }
        text.char_indices().rev().map(|(i, _)| i).find(|&i| {
            text[i..].starts_with(&self.trigger)
                && text[..i].chars().next_back().map_or(true, char::is_whitespace)
        })
    }
}

/// A mention being typed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionQuery {
    pub trigger: String,
    /// Byte offset of the trigger
    pub position: usize,
    /// Text typed after the trigger
    pub text: String,
    /// Index of the collection the trigger belongs to
    pub collection: usize,
}

/// Find the mention being typed at the end of `before_caret`.
///
/// The collection whose trigger occurs last wins; the first listed wins
/// ties. No mention when the typed text starts with a space or holds
/// whitespace the collection does not allow.
pub fn detect_mention(before_caret: &str, collections: &[MentionCollection]) -> Option<MentionQuery> {
    let mut latest: Option<(usize, usize)> = None;
    for (index, collection) in collections.iter().enumerate() {
        if let Some(position) = collection.trigger_position(before_caret) {
            if latest.map_or(true, |(best, _)| position > best) {
                latest = Some((position, index));
            }
        }
    }
    let (position, index) = latest?;
    let collection = &collections[index];

    let snippet = &before_caret[position + collection.trigger.len()..];
    if snippet.starts_with([' ', NO_BREAK_SPACE]) {
        return None;
    }
    let blocked = snippet.chars().any(|c| {
        if collection.allow_spaces {
            c.is_whitespace() && c != ' '
        } else {
            c.is_whitespace()
        }
    });
    if blocked {
        trace!("Mention after {:?} ended by whitespace", collection.trigger);
        return None;
    }

    Some(MentionQuery {
        trigger: collection.trigger.clone(),
        position,
        text: snippet.to_string(),
        collection: index,
    })
}

/// Replace the trigger and mention text with `replacement` plus a space.
///
/// Returns the new text and the caret offset just after the inserted space,
/// or `None` when the mention does not line up with `text`.
pub fn apply_selection(text: &str, mention: &MentionQuery, replacement: &str) -> Option<(String, usize)> {
    let end = mention.position + mention.trigger.len() + mention.text.len();
    let before = text.get(..mention.position)?;
    let after = text.get(end..)?;

    let mut result = String::with_capacity(before.len() + replacement.len() + 1 + after.len());
    result.push_str(before);
    result.push_str(replacement);
    result.push(' ');
    let caret = result.len();
    result.push_str(after);
    Some((result, caret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn people() -> MentionCollection {
        MentionCollection::new(
            "@",
            vec![
                json!({"key": "Jordan Smith", "value": "jordan"}),
                json!({"key": "Joe Bloggs", "value": "joe"}),
                json!({"key": "Bob Stone", "value": "bob"}),
            ],
        )
    }

    fn tags() -> MentionCollection {
        MentionCollection::new("#", vec![json!({"key": "rust", "value": "rust"})])
    }

    #[test]
    fn test_detect_basic() {
        let mention = detect_mention("hello @jo", &[people()]).unwrap();
        assert_eq!(mention.trigger, "@");
        assert_eq!(mention.position, 6);
        assert_eq!(mention.text, "jo");
        assert_eq!(mention.collection, 0);
    }

    #[test]
    fn test_detect_bare_trigger() {
        let mention = detect_mention("@", &[people()]).unwrap();
        assert_eq!(mention.text, "");
    }

    #[test]
    fn test_leading_space_required() {
        assert!(detect_mention("mail@host", &[people()]).is_none());
        assert!(detect_mention("a\t@x", &[people()]).is_some());

        let mut loose = people();
        loose.require_leading_space = false;
        let mention = detect_mention("mail@host", &[loose]).unwrap();
        assert_eq!(mention.text, "host");
    }

    #[test]
    fn test_whitespace_ends_mention() {
        assert!(detect_mention("@jo hn", &[people()]).is_none());
        assert!(detect_mention("@ jo", &[people()]).is_none());
        assert!(detect_mention("@\u{a0}jo", &[people()]).is_none());

        let mut spaced = people();
        spaced.allow_spaces = true;
        let mention = detect_mention("@jo hn", &[spaced.clone()]).unwrap();
        assert_eq!(mention.text, "jo hn");
        assert!(detect_mention("@jo\nhn", &[spaced.clone()]).is_none());
        assert!(detect_mention("@ jo", &[spaced]).is_none());
    }

    #[test]
    fn test_latest_trigger_wins() {
        let collections = [people(), tags()];
        let mention = detect_mention("@bob #ru", &collections).unwrap();
        assert_eq!(mention.collection, 1);
        assert_eq!(mention.text, "ru");

        let mention = detect_mention("#rust @bo", &collections).unwrap();
        assert_eq!(mention.collection, 0);
    }

    #[test]
    fn test_first_collection_wins_ties() {
        let collections = [people(), MentionCollection::new("@", Vec::new())];
        assert_eq!(detect_mention("@x", &collections).unwrap().collection, 0);
    }

    #[test]
    fn test_no_trigger() {
        assert!(detect_mention("plain text", &[people()]).is_none());
        assert!(detect_mention("", &[people()]).is_none());
        assert!(detect_mention("@x", &[]).is_none());
    }

    #[test]
    fn test_multibyte_text_before_trigger() {
        let mention = detect_mention("héllo @jö", &[people()]).unwrap();
        assert_eq!(mention.position, "héllo ".len());
        assert_eq!(mention.text, "jö");
    }

    #[test]
    fn test_suggest_ranks_and_limits() {
        let mut collection = people();
        let ranked = collection.suggest("jo", &FuzzyOptions::default());
        let values: Vec<&str> = ranked.iter().filter_map(|r| r.original["value"].as_str()).collect();
        assert_eq!(values, vec!["jordan", "joe"]);

        collection.menu_item_limit = Some(1);
        assert_eq!(collection.suggest("jo", &FuzzyOptions::default()).len(), 1);
        assert_eq!(collection.suggest("", &FuzzyOptions::default()).len(), 1);
    }

    #[test]
    fn test_suggest_computed_lookup() {
        let mut collection = people();
        collection.lookup = Lookup::computed(|record, _| {
            record["value"].as_str().unwrap_or_default().to_uppercase()
        });
        let ranked = collection.suggest("BOB", &FuzzyOptions::highlight("<", ">"));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].text, "<B><O><B>");
    }

    #[test]
    fn test_lookup_from_json() {
        assert!(matches!(Lookup::from_json(&json!("name")).unwrap(), Lookup::Key(k) if k == "name"));
        let err = Lookup::from_json(&json!(42)).unwrap_err();
        assert_eq!(err.error_code(), "invalid_lookup");
        assert!(Lookup::from_json(&json!("")).is_err());
    }

    #[test]
    fn test_replacement_and_apply() {
        let collection = people();
        let replacement = collection.replacement(&collection.values[0]);
        assert_eq!(replacement, "@jordan");

        let text = "hi @jo, bye";
        let mention = detect_mention("hi @jo", &[collection]).unwrap();
        let (result, caret) = apply_selection(text, &mention, &replacement).unwrap();
        assert_eq!(result, "hi @jordan , bye");
        assert_eq!(caret, "hi @jordan ".len());
    }

    #[test]
    fn test_apply_rejects_misaligned_mention() {
        let mention = MentionQuery {
            trigger: "@".into(),
            position: 1,
            text: "x".into(),
            collection: 0,
        };
        // position 1 falls inside 'é'
        assert!(apply_selection("é@x", &mention, "@y").is_none());
        assert!(apply_selection("", &mention, "@y").is_none());
    }

    #[test]
    fn test_replacement_missing_fill() {
        let collection = people();
        assert_eq!(collection.replacement(&json!({"key": "anon"})), "@");
    }
}
