//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use typeahead::search::{Conjunction, FuzzyOptions, SearchField, SearchOptions, Sort, SortField};

/// Typeahead CLI
#[derive(Parser)]
#[command(name = "typeahead")]
#[command(about = "Weighted token search and fuzzy matching over JSON records", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to typeahead/config.json in the user config directory)
    #[arg(short, long, global = true, env = "TYPEAHEAD_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Weighted token search over a JSON array or object of records
    Search(SearchArgs),
    /// Fuzzy-match one pattern against one string
    Fuzzy(FuzzyArgs),
    /// Fuzzy filter and rank a JSON array
    Rank(RankArgs),
    /// Detect the mention being typed and suggest completions
    Mention(MentionArgs),
    /// Print the JSON schema of the configuration file
    Schema,
}

/// Search command arguments
#[derive(Args, Clone, Debug)]
pub struct SearchArgs {
    /// JSON file holding the candidate records
    #[arg(short, long)]
    pub data: PathBuf,

    /// Query text (empty matches everything)
    #[arg(short, long, conflicts_with = "interactive")]
    pub query: Option<String>,

    /// Read one query per line from stdin
    #[arg(short, long)]
    pub interactive: bool,

    /// Field to search, optionally weighted: name or name:2.5 (repeatable)
    #[arg(short, long = "field")]
    pub fields: Vec<SearchField>,

    /// and: every token must match; or: any token may
    #[arg(long)]
    pub conjunction: Option<Conjunction>,

    /// Sort key: field, field:asc or field:desc; $score is the relevance (repeatable)
    #[arg(short, long = "sort")]
    pub sort: Vec<SortField>,

    /// Sort key used when the query is empty (repeatable)
    #[arg(long = "sort-empty")]
    pub sort_empty: Vec<SortField>,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Keep records that score zero
    #[arg(long)]
    pub no_filter: bool,

    /// Match accented letters literally
    #[arg(long)]
    pub no_diacritics: bool,

    /// Anchor tokens at word starts
    #[arg(long)]
    pub word_boundaries: bool,

    /// Treat field names as dotted paths into nested objects
    #[arg(long)]
    pub nesting: bool,
}

impl SearchArgs {
    /// Overlay flags given on the command line onto configured options
    pub fn apply(&self, mut options: SearchOptions) -> SearchOptions {
        if !self.fields.is_empty() {
            options.fields = self.fields.clone();
        }
        if let Some(conjunction) = self.conjunction {
            options.conjunction = conjunction;
        }
        if !self.sort.is_empty() {
            options.sort = Some(Sort::Fields(self.sort.clone()));
        }
        if !self.sort_empty.is_empty() {
            options.sort_empty = Some(Sort::Fields(self.sort_empty.clone()));
        }
        if self.limit.is_some() {
            options.limit = self.limit;
        }
        if self.no_filter {
            options.filter = false;
        }
        if self.no_diacritics {
            options.diacritics = false;
        }
        if self.word_boundaries {
            options.respect_word_boundaries = true;
        }
        if self.nesting {
            options.nesting = true;
        }
        options
    }
}

/// Fuzzy command arguments
#[derive(Args, Clone, Debug)]
pub struct FuzzyArgs {
    #[arg(short, long)]
    pub pattern: String,

    #[arg(short, long)]
    pub text: String,

    /// Inserted before each matched character
    #[arg(long)]
    pub pre: Option<String>,

    /// Inserted after each matched character
    #[arg(long)]
    pub post: Option<String>,

    #[arg(long)]
    pub case_sensitive: bool,
}

impl FuzzyArgs {
    pub fn apply(&self, mut options: FuzzyOptions) -> FuzzyOptions {
        if let Some(pre) = &self.pre {
            options.pre = pre.clone();
        }
        if let Some(post) = &self.post {
            options.post = post.clone();
        }
        if self.case_sensitive {
            options.case_sensitive = true;
        }
        options
    }
}

/// Rank command arguments
#[derive(Args, Clone, Debug)]
pub struct RankArgs {
    #[arg(short, long)]
    pub pattern: String,

    /// JSON array of strings or records
    #[arg(short, long)]
    pub data: PathBuf,

    /// Record property to match on
    #[arg(long)]
    pub lookup: Option<String>,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Mention command arguments
#[derive(Args, Clone, Debug)]
pub struct MentionArgs {
    /// Text being edited
    #[arg(short, long)]
    pub text: String,

    /// Caret position in characters (defaults to the end of the text)
    #[arg(long)]
    pub caret: Option<usize>,
}
