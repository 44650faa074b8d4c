//! Query Tokenizer
//!
//! Splits a query into whitespace-delimited tokens, recognises `field:`
//! prefixes for searched fields, and compiles one case-insensitive match
//! pattern per token.

use super::diacritics::diacritic_pattern;
use crate::error::Result;
use regex::{Regex, RegexBuilder};
use serde::{Serialize, Serializer};

/// One unit of a search query
#[derive(Debug, Clone, Serialize)]
pub struct Token {
    /// Literal token text, without any field prefix
    pub text: String,
    /// Field this token is restricted to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// `None` when the text is empty: the token then only checks that the field has a value
    #[serde(serialize_with = "serialize_pattern")]
    pub pattern: Option<Regex>,
    /// Whether the pattern is anchored at a word boundary
    pub anchored: bool,
}

fn serialize_pattern<S: Serializer>(pattern: &Option<Regex>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match pattern {
        Some(regex) => serializer.serialize_some(regex.as_str()),
        None => serializer.serialize_none(),
    }
}

impl Token {
    /// Byte offset of the first match in `haystack`
    pub fn find(&self, haystack: &str) -> Option<usize> {
        self.pattern
            .as_ref()
            .and_then(|pattern| pattern.find(haystack))
            .map(|m| m.start())
    }
}

/// Query tokenizer
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    pub diacritics: bool,
    pub respect_word_boundaries: bool,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            diacritics: true,
            respect_word_boundaries: false,
        }
    }
}

impl Tokenizer {
    pub fn new(diacritics: bool, respect_word_boundaries: bool) -> Self {
        Self {
            diacritics,
            respect_word_boundaries,
        }
    }

    /// Tokenize `query`. `fields` are the names usable as `field:` prefixes,
    /// tried in order.
    pub fn tokenize<S: AsRef<str>>(&self, query: &str, fields: &[S]) -> Result<Vec<Token>> {
        query
            .split_whitespace()
            .map(|word| self.token(word, fields))
            .collect()
    }

    fn token<S: AsRef<str>>(&self, word: &str, fields: &[S]) -> Result<Token> {
        let (field, text) = Self::split_field(word, fields);

        let mut pattern = None;
        if !text.is_empty() {
            let mut source = if self.diacritics {
                diacritic_pattern(text)
            } else {
                regex::escape(text)
            };
            if !source.is_empty() {
                if self.respect_word_boundaries {
                    source.insert_str(0, r"\b");
                }
                pattern = Some(
                    RegexBuilder::new(&source)
                        .case_insensitive(true)
                        .unicode(true)
                        .build()?,
                );
            }
        }

        Ok(Token {
            text: text.to_string(),
            field: field.map(str::to_string),
            pattern,
            anchored: self.respect_word_boundaries,
        })
    }

    /// Strip a `field:` prefix naming one of `fields`
    fn split_field<'w, S: AsRef<str>>(word: &'w str, fields: &[S]) -> (Option<&'w str>, &'w str) {
        for field in fields {
            let field = field.as_ref();
            if field.is_empty() {
                continue;
            }
            if let Some(rest) = word.strip_prefix(field).and_then(|r| r.strip_prefix(':')) {
                return (Some(&word[..field.len()]), rest);
            }
        }
        (None, word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_FIELDS: &[&str] = &[];

    #[test]
    fn test_basic_tokenizing() {
        let tokens = Tokenizer::default().tokenize("hello world", NO_FIELDS).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "hello");
        assert_eq!(tokens[1].text, "world");
        assert!(tokens.iter().all(|t| t.field.is_none()));
    }

    #[test]
    fn test_empty_query() {
        assert!(Tokenizer::default().tokenize("", NO_FIELDS).unwrap().is_empty());
        assert!(Tokenizer::default().tokenize("  \t ", NO_FIELDS).unwrap().is_empty());
    }

    #[test]
    fn test_whitespace_runs() {
        let tokens = Tokenizer::default().tokenize("  red \t\n apple  ", NO_FIELDS).unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["red", "apple"]);
    }

    #[test]
    fn test_field_prefix() {
        let tokens = Tokenizer::default()
            .tokenize("name:john smith", &["name", "email"])
            .unwrap();
        assert_eq!(tokens[0].field.as_deref(), Some("name"));
        assert_eq!(tokens[0].text, "john");
        assert_eq!(tokens[1].field, None);
    }

    #[test]
    fn test_unknown_field_prefix_is_literal() {
        let tokens = Tokenizer::default().tokenize("phone:555", &["name"]).unwrap();
        assert_eq!(tokens[0].field, None);
        assert_eq!(tokens[0].text, "phone:555");
        assert!(tokens[0].pattern.as_ref().unwrap().is_match("phone:555"));
    }

    #[test]
    fn test_empty_field_token_has_no_pattern() {
        let tokens = Tokenizer::default().tokenize("email:", &["name", "email"]).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].field.as_deref(), Some("email"));
        assert!(tokens[0].text.is_empty());
        assert!(tokens[0].pattern.is_none());
    }

    #[test]
    fn test_case_insensitive_pattern() {
        let tokens = Tokenizer::new(false, false).tokenize("APP", NO_FIELDS).unwrap();
        assert_eq!(tokens[0].find("an apple"), Some(3));
    }

    #[test]
    fn test_meta_characters_escaped() {
        for diacritics in [true, false] {
            let tokens = Tokenizer::new(diacritics, false).tokenize("a+b (c)", NO_FIELDS).unwrap();
            assert!(tokens[0].pattern.as_ref().unwrap().is_match("a+b"));
            assert!(!tokens[0].pattern.as_ref().unwrap().is_match("aab"));
            assert!(tokens[1].pattern.as_ref().unwrap().is_match("(c)"));
        }
    }

    #[test]
    fn test_diacritics_toggle() {
        let folded = Tokenizer::new(true, false).tokenize("jose", NO_FIELDS).unwrap();
        assert!(folded[0].pattern.as_ref().unwrap().is_match("José"));

        let plain = Tokenizer::new(false, false).tokenize("jose", NO_FIELDS).unwrap();
        assert!(!plain[0].pattern.as_ref().unwrap().is_match("José"));
    }

    #[test]
    fn test_word_boundaries() {
        let tokens = Tokenizer::new(true, true).tokenize("ple", NO_FIELDS).unwrap();
        assert!(tokens[0].anchored);
        assert!(tokens[0].find("apple").is_none());
        assert_eq!(tokens[0].find("a plenty"), Some(2));
    }

    #[test]
    fn test_token_serializes_pattern_source() {
        let tokens = Tokenizer::new(false, false).tokenize("a.b", NO_FIELDS).unwrap();
        let json = serde_json::to_value(&tokens[0]).unwrap();
        assert_eq!(json["text"], "a.b");
        assert_eq!(json["pattern"], r"a\.b");
        assert!(json.get("field").is_none());
    }
}
