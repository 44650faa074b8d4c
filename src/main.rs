//! typeahead CLI
//!
//! Command-line front end for the search library:
//! - `search` - weighted token search over JSON records
//! - `fuzzy` / `rank` - subsequence fuzzy matching
//! - `mention` - mention detection and suggestions
//! - `schema` - configuration file schema

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use serde_json::{json, Value};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use typeahead::cache::LastSearch;
use typeahead::config::{load_config, Config};
use typeahead::mention::detect_mention;
use typeahead::search::collection::value_text;
use typeahead::search::{filter_and_rank_by, fuzzy_match, Collection, ResultSet, SearchIndex};
use typeahead::SearchError;

fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity flags; RUST_LOG wins when set
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr) // Log to stderr to keep stdout clean
        .init();

    match run(cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(get_exit_code(&e));
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let load = || load_config(cli.config.as_deref());

    match cli.command {
        Commands::Search(args) => execute_search(args, &load()?),
        Commands::Fuzzy(args) => execute_fuzzy(args, &load()?),
        Commands::Rank(args) => execute_rank(args, &load()?),
        Commands::Mention(args) => execute_mention(args, &load()?),
        Commands::Schema => execute_schema(),
    }
}

/// Execute schema command
fn execute_schema() -> Result<String> {
    let schema = schemars::schema_for!(Config);
    Ok(serde_json::to_string_pretty(&schema)?)
}

fn read_json(path: &Path) -> Result<Value> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Failed to parse data file {}", path.display()))
}

/// Execute search command
fn execute_search(args: cli::SearchArgs, config: &Config) -> Result<String> {
    let options = args.apply(config.search_options()?);
    let mut data = DataFile::open(&args.data)?;

    if !args.interactive {
        let result = data.index().search(args.query.as_deref().unwrap_or_default(), &options)?;
        return Ok(serde_json::to_string_pretty(&result)?);
    }

    let mut last: LastSearch<String, ResultSet> = LastSearch::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let query = line.context("Failed to read query from stdin")?;
        if data.reload_if_changed()? {
            last.invalidate();
        }

        let index = data.index();
        let result = last.get_or_try_insert_with(query, |query| index.search(query, &options))?;
        writeln!(stdout, "{}", serde_json::to_string(result)?)?;
        stdout.flush()?;
    }
    debug!("Interactive session: {} cached, {} searched", last.hits(), last.misses());

    Ok(String::new())
}

/// Candidate records loaded from a JSON file, reloaded when the file changes
struct DataFile<'p> {
    path: &'p Path,
    modified: Option<SystemTime>,
    collection: Collection,
}

impl<'p> DataFile<'p> {
    fn open(path: &'p Path) -> Result<Self> {
        let modified = modified_time(path);
        let collection = Collection::from_json(read_json(path)?)?;
        info!("Loaded {} records from {}", collection.len(), path.display());
        Ok(Self {
            path,
            modified,
            collection,
        })
    }

    fn index(&self) -> SearchIndex<'_> {
        SearchIndex::new(&self.collection)
    }

    /// Re-read the file if its modification time moved. Returns true on reload.
    fn reload_if_changed(&mut self) -> Result<bool> {
        if modified_time(self.path) == self.modified {
            return Ok(false);
        }
        *self = Self::open(self.path)?;
        Ok(true)
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// Execute fuzzy command
fn execute_fuzzy(args: cli::FuzzyArgs, config: &Config) -> Result<String> {
    let options = args.apply(config.fuzzy.clone());
    let result = fuzzy_match(&args.pattern, &args.text, &options);
    Ok(serde_json::to_string_pretty(&result)?)
}

/// Execute rank command
fn execute_rank(args: cli::RankArgs, config: &Config) -> Result<String> {
    let items = match read_json(&args.data)? {
        Value::Array(items) => items,
        _ => return Err(SearchError::Config("rank data must be a JSON array".to_string()).into()),
    };

    let mut ranked = filter_and_rank_by(&args.pattern, &items, &config.fuzzy, |item| match &args.lookup {
        Some(key) => item.get(key).and_then(value_text),
        None => value_text(item),
    });
    if let Some(limit) = args.limit {
        ranked.truncate(limit);
    }
    Ok(serde_json::to_string_pretty(&ranked)?)
}

/// Execute mention command
fn execute_mention(args: cli::MentionArgs, config: &Config) -> Result<String> {
    let collections = config.mention_collections()?;
    let caret = args.caret.unwrap_or(usize::MAX);
    let before_caret: String = args.text.chars().take(caret).collect();

    let Some(mention) = detect_mention(&before_caret, &collections) else {
        return Ok(serde_json::to_string_pretty(&json!({ "mention": null, "suggestions": [] }))?);
    };

    let collection = &collections[mention.collection];
    let suggestions: Vec<Value> = collection
        .suggest(&mention.text, &config.fuzzy)
        .into_iter()
        .map(|ranked| {
            json!({
                "text": ranked.text,
                "score": ranked.score,
                "index": ranked.index,
                "replacement": collection.replacement(ranked.original),
            })
        })
        .collect();

    Ok(serde_json::to_string_pretty(&json!({
        "mention": mention,
        "suggestions": suggestions,
    }))?)
}

/// Map errors to process exit codes
fn get_exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.downcast_ref::<SearchError>().is_some() {
            return 1; // Invalid configuration or arguments
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::NotFound {
                return 3; // Not found error
            }
        }
    }

    let err_str = err.to_string().to_lowercase();
    if err_str.contains("invalid") || err_str.contains("usage") || err_str.contains("config") {
        1
    } else if err_str.contains("not found") {
        3
    } else {
        5 // Other application errors
    }
}
