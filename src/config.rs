//! Configuration file
//!
//! Optional JSON file with defaults for the search, fuzzy and mention
//! commands. Command-line flags override what is loaded here.

use crate::error::SearchError;
use crate::mention::{Lookup, MentionCollection};
use crate::search::fuzzy::FuzzyOptions;
use crate::search::options::{Conjunction, SearchField, SearchOptions, Sort, SortField};
use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub fuzzy: FuzzyOptions,
    pub mentions: Vec<MentionConfig>,
}

/// `"name"` or `{"field": "name", "weight": 2.0}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldSpec {
    Name(String),
    Weighted(SearchField),
}

/// `"name"`, `"name:desc"` or `{"field": "name", "direction": "desc"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SortSpec {
    Short(String),
    Full {
        field: String,
        #[serde(default)]
        direction: Option<String>,
    },
}

impl TryFrom<&SortSpec> for SortField {
    type Error = SearchError;

    fn try_from(spec: &SortSpec) -> Result<Self, Self::Error> {
        match spec {
            SortSpec::Short(text) => text.parse(),
            SortSpec::Full { field, direction } => {
                if field.is_empty() {
                    return Err(SearchError::InvalidField(field.clone()));
                }
                Ok(SortField {
                    field: field.clone(),
                    direction: direction.as_deref().unwrap_or("asc").parse()?,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SearchConfig {
    pub fields: Vec<FieldSpec>,
    /// `"and"` or `"or"`
    pub conjunction: String,
    pub sort: Vec<SortSpec>,
    pub sort_empty: Vec<SortSpec>,
    pub limit: Option<usize>,
    pub filter: bool,
    pub diacritics: bool,
    pub respect_word_boundaries: bool,
    pub nesting: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            conjunction: "or".to_string(),
            sort: Vec::new(),
            sort_empty: Vec::new(),
            limit: None,
            filter: true,
            diacritics: true,
            respect_word_boundaries: false,
            nesting: false,
        }
    }
}

fn sort_fields(specs: &[SortSpec]) -> Result<Option<Sort>, SearchError> {
    if specs.is_empty() {
        return Ok(None);
    }
    let fields = specs
        .iter()
        .map(SortField::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(Sort::Fields(fields)))
}

impl TryFrom<&SearchConfig> for SearchOptions {
    type Error = SearchError;

    fn try_from(config: &SearchConfig) -> Result<Self, Self::Error> {
        let mut fields = Vec::with_capacity(config.fields.len());
        for spec in &config.fields {
            let field = match spec {
                FieldSpec::Name(name) => SearchField::new(name.clone()),
                FieldSpec::Weighted(field) => field.clone(),
            };
            if field.field.is_empty() {
                return Err(SearchError::InvalidField(field.field));
            }
            if !field.weight.is_finite() || field.weight <= 0.0 {
                return Err(SearchError::InvalidWeight {
                    field: field.field,
                    weight: field.weight,
                });
            }
            fields.push(field);
        }

        Ok(SearchOptions {
            fields,
            conjunction: config.conjunction.parse::<Conjunction>()?,
            sort: sort_fields(&config.sort)?,
            sort_empty: sort_fields(&config.sort_empty)?,
            limit: config.limit,
            filter: config.filter,
            diacritics: config.diacritics,
            respect_word_boundaries: config.respect_word_boundaries,
            nesting: config.nesting,
            score: None,
        })
    }
}

/// One mention trigger and its records
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MentionConfig {
    pub trigger: String,
    /// Property the records are matched on
    pub lookup: Value,
    pub fill_attr: String,
    pub menu_item_limit: Option<usize>,
    pub require_leading_space: bool,
    pub allow_spaces: bool,
    pub values: Vec<Value>,
}

impl Default for MentionConfig {
    fn default() -> Self {
        let defaults = MentionCollection::default();
        Self {
            trigger: defaults.trigger,
            lookup: Value::String("key".to_string()),
            fill_attr: defaults.fill_attr,
            menu_item_limit: defaults.menu_item_limit,
            require_leading_space: defaults.require_leading_space,
            allow_spaces: defaults.allow_spaces,
            values: defaults.values,
        }
    }
}

impl TryFrom<MentionConfig> for MentionCollection {
    type Error = SearchError;

    fn try_from(config: MentionConfig) -> Result<Self, Self::Error> {
        if config.trigger.is_empty() {
            return Err(SearchError::Config("mention trigger must not be empty".to_string()));
        }
        Ok(MentionCollection {
            lookup: Lookup::from_json(&config.lookup)?,
            trigger: config.trigger,
            fill_attr: config.fill_attr,
            menu_item_limit: config.menu_item_limit,
            require_leading_space: config.require_leading_space,
            allow_spaces: config.allow_spaces,
            values: config.values,
        })
    }
}

impl Config {
    pub fn search_options(&self) -> Result<SearchOptions, SearchError> {
        SearchOptions::try_from(&self.search)
    }

    pub fn mention_collections(&self) -> Result<Vec<MentionCollection>, SearchError> {
        self.mentions
            .iter()
            .cloned()
            .map(MentionCollection::try_from)
            .collect()
    }
}

/// Get the path to the default configuration file
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
    Ok(config_dir.join("typeahead").join("config.json"))
}

/// Load configuration from `explicit`, or from the default location when it
/// exists. An explicit path must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config_path() {
            Ok(path) if path.exists() => path,
            _ => {
                debug!("No config file, using defaults");
                return Ok(Config::default());
            }
        },
    };

    let data = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}
