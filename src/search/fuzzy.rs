//! Subsequence Fuzzy Matcher
//!
//! A pattern matches when its characters appear in order in the target,
//! not necessarily adjacent. Every placement is explored and the one with
//! the best contiguity score wins; the matched characters are then wrapped
//! in highlight markers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

/// Options for a fuzzy match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FuzzyOptions {
    /// Inserted before each matched character
    pub pre: String,
    /// Inserted after each matched character
    pub post: String,
    pub case_sensitive: bool,
    /// Accept every target unchanged with score 0
    pub skip: bool,
    /// Only the pattern text after the last separator is matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

impl FuzzyOptions {
    pub fn highlight(pre: impl Into<String>, post: impl Into<String>) -> Self {
        Self {
            pre: pre.into(),
            post: post.into(),
            ..Self::default()
        }
    }

    fn active_pattern<'p>(&self, pattern: &'p str) -> &'p str {
        match self.separator.as_deref() {
            Some(separator) if !separator.is_empty() => pattern.rsplit(separator).next().unwrap_or(pattern),
            _ => pattern,
        }
    }

    fn fold(&self, c: char) -> char {
        if self.case_sensitive {
            c
        } else {
            // First char of the lower-case mapping keeps indices aligned with the target
            c.to_lowercase().next().unwrap_or(c)
        }
    }
}

/// A successful match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FuzzyMatch {
    /// Target with matched characters wrapped in the highlight markers
    pub rendered: String,
    pub score: u64,
    /// Char positions of the matched characters, ascending
    pub indices: Vec<usize>,
}

/// Best continuation from one search state: the score of the remaining
/// pattern characters and the first of them, with its run multiplier
#[derive(Debug, Clone, Copy)]
struct Step {
    score: u64,
    next: Option<(usize, u64)>,
}

/// Placement search memoized on `(matched, start, run)`. The remaining score
/// only depends on how much of the pattern is placed, where the target
/// resumes and the run multiplier of the last placed character.
struct Traversal<'t> {
    target: &'t [char],
    pattern: &'t [char],
    memo: HashMap<(usize, usize, u64), Option<Step>>,
}

impl<'t> Traversal<'t> {
    fn new(target: &'t [char], pattern: &'t [char]) -> Self {
        Self {
            target,
            pattern,
            memo: HashMap::new(),
        }
    }

    /// Best indices and their score, `None` when the pattern does not fit
    fn run(mut self) -> Option<(u64, Vec<usize>)> {
        let mut state = (0, 0, 0);
        let first = self.best(state.0, state.1, state.2)?;
        let mut indices = Vec::with_capacity(self.pattern.len());
        let mut step = first;
        while let Some((index, run)) = step.next {
            indices.push(index);
            state = (state.0 + 1, index + 1, run);
            match self.best(state.0, state.1, state.2) {
                Some(next) => step = next,
                None => break,
            }
        }
        Some((first.score, indices))
    }

    fn best(&mut self, matched: usize, start: usize, run: u64) -> Option<Step> {
        let (target, pattern) = (self.target, self.pattern);
        if matched == pattern.len() {
            return Some(Step { score: 0, next: None });
        }
        if start >= target.len() || pattern.len() - matched > target.len() - start {
            return None;
        }
        if let Some(known) = self.memo.get(&(matched, start, run)) {
            return *known;
        }

        let wanted = pattern[matched];
        let mut best: Option<Step> = None;
        for index in (start..target.len()).filter(|&i| target[i] == wanted) {
            let next_run = if matched > 0 && index == start {
                run.saturating_mul(2).saturating_add(1)
            } else {
                1
            };
            // Later occurrences leave even less room, so they cannot succeed either
            let Some(rest) = self.best(matched + 1, index + 1, next_run) else {
                break;
            };
            let score = next_run.saturating_add(rest.score);
            // Strictly greater only: the first placement found wins ties
            if best.map_or(true, |b| b.score < score) {
                best = Some(Step {
                    score,
                    next: Some((index, next_run)),
                });
            }
        }
        self.memo.insert((matched, start, run), best);
        best
    }
}

/// Match `pattern` as a subsequence of `text`. `None` when it is not one.
pub fn fuzzy_match(pattern: &str, text: &str, options: &FuzzyOptions) -> Option<FuzzyMatch> {
    if options.skip {
        return Some(FuzzyMatch {
            rendered: text.to_string(),
            score: 0,
            indices: Vec::new(),
        });
    }

    let target: Vec<char> = text.chars().map(|c| options.fold(c)).collect();
    let pattern: Vec<char> = options
        .active_pattern(pattern)
        .chars()
        .map(|c| options.fold(c))
        .collect();

    let (score, indices) = Traversal::new(&target, &pattern).run()?;

    Some(FuzzyMatch {
        rendered: render(text, &indices, &options.pre, &options.post),
        score,
        indices,
    })
}

/// True when `pattern` is a subsequence of `text`
pub fn fuzzy_test(pattern: &str, text: &str, options: &FuzzyOptions) -> bool {
    fuzzy_match(pattern, text, options).is_some()
}

/// Sum of run multipliers: each adjacent index extends the run as `run * 2 + 1`,
/// any gap resets it to 1.
pub fn contiguity_score(indices: &[usize]) -> u64 {
    let mut score: u64 = 0;
    let mut run: u64 = 1;
    for (i, &index) in indices.iter().enumerate() {
        if i > 0 {
            if indices[i - 1] + 1 == index {
                run = run.saturating_mul(2).saturating_add(1);
            } else {
                run = 1;
            }
        }
        score = score.saturating_add(run);
    }
    score
}

fn render(text: &str, indices: &[usize], pre: &str, post: &str) -> String {
    let mut rendered = String::with_capacity(text.len() + indices.len() * (pre.len() + post.len()));
    let mut pending = indices.iter().peekable();
    for (i, c) in text.chars().enumerate() {
        if pending.peek() == Some(&&i) {
            pending.next();
            rendered.push_str(pre);
            rendered.push(c);
            rendered.push_str(post);
        } else {
            rendered.push(c);
        }
    }
    rendered
}

/// A matched item from a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<'a, T> {
    /// Rendered text of the item
    pub text: String,
    pub score: u64,
    /// Position of the item in the input
    pub index: usize,
    pub original: &'a T,
}

/// Match every string in `items`, drop non-matches, best first
pub fn filter_and_rank<'a, S>(pattern: &str, items: &'a [S], options: &FuzzyOptions) -> Vec<Ranked<'a, S>>
where
    S: AsRef<str>,
{
    filter_and_rank_by(pattern, items, options, |item| Some(item.as_ref()))
}

/// Like [`filter_and_rank`], matching the text `extract` pulls out of each
/// item. Items with nothing to extract are matched as empty text.
pub fn filter_and_rank_by<'a, T, E, F>(
    pattern: &str,
    items: &'a [T],
    options: &FuzzyOptions,
    extract: F,
) -> Vec<Ranked<'a, T>>
where
    E: AsRef<str>,
    F: Fn(&'a T) -> Option<E>,
{
    let mut ranked: Vec<Ranked<'a, T>> = items
        .iter()
        .enumerate()
        .filter_map(|(index, original)| {
            let text = extract(original);
            let text: &str = match &text {
                Some(text) => text.as_ref(),
                None => "",
            };
            fuzzy_match(pattern, text, options).map(|m| Ranked {
                text: m.rendered,
                score: m.score,
                index,
                original,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));
    trace!("Fuzzy {:?}: {}/{} items matched", pattern, ranked.len(), items.len());
    ranked
}
