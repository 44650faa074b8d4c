//! Diacritic folding and accent-insensitive pattern expansion
//!
//! A folding table maps every folded ("ascii-like", lower-case) string to a
//! regex fragment matching all code points that fold to it. The table is
//! derived from a fixed list of code point ranges, built on first use and
//! never mutated afterwards.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// Code point ranges scanned when building the folding table
const CODE_POINTS: &[(u32, u32)] = &[(0x0000, 0xFFFF)];

/// Folded forms longer than this are left out of the table
const MAX_FOLDED_LEN: usize = 3;

/// Upper bound on a chain of overlapping multi-character sequences expanded
/// as one unit. Keeps the alternation size bounded for inputs like "aaaaaaaa".
const MAX_RUN_LEN: usize = 8;

/// Letters NFKD leaves untouched, grouped by the Latin text they stand for
const LATIN_CONDENSED: &[(&str, &str)] = &[
    ("/", "⁄∕"),
    ("0", "߀"),
    ("a", "ⱥɐɑ"),
    ("aa", "ꜳ"),
    ("ae", "æǽǣ"),
    ("ao", "ꜵ"),
    ("au", "ꜷ"),
    ("av", "ꜹꜻ"),
    ("ay", "ꜽ"),
    ("b", "ƀɓƃ"),
    ("c", "ꜿƈȼↄ"),
    ("d", "đɗɖᴅƌꮷԁɦ"),
    ("e", "ɛǝᴇɇ"),
    ("f", "ꝼƒ"),
    ("g", "ǥɠꞡᵹꝿɢ"),
    ("h", "ħⱨⱶɥ"),
    ("i", "ɨı"),
    ("j", "ɉȷ"),
    ("k", "ƙⱪꝁꝃꝅꞣ"),
    ("l", "łƚɫⱡꝉꝇꞁɭ"),
    ("m", "ɱɯϻ"),
    ("n", "ꞥƞɲꞑᴎлԉ"),
    ("o", "øǿɔɵꝋꝍᴑ"),
    ("oe", "œ"),
    ("oi", "ƣ"),
    ("oo", "ꝏ"),
    ("ou", "ȣ"),
    ("p", "ƥᵽꝑꝓꝕρ"),
    ("q", "ꝗꝙɋ"),
    ("r", "ɍɽꝛꞧꞃ"),
    ("s", "ßȿꞩꞅʂ"),
    ("t", "ŧƭʈⱦꞇ"),
    ("th", "þ"),
    ("tz", "ꜩ"),
    ("u", "ʉ"),
    ("v", "ʋꝟʌ"),
    ("vy", "ꝡ"),
    ("w", "ⱳ"),
    ("y", "ƴɏỿ"),
    ("z", "ƶȥɀⱬꝣ"),
    ("hv", "ƕ"),
];

static LATIN_CONVERT: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    LATIN_CONDENSED
        .iter()
        .flat_map(|(latin, variants)| variants.chars().map(move |c| (c, *latin)))
        .collect()
});

static FOLD_TABLE: Lazy<FoldTable> = Lazy::new(|| FoldTable::build(CODE_POINTS));

/// Combining marks and modifier letters dropped while folding
fn is_stripped_accent(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}' | '\u{00B7}' | '\u{02BE}' | '\u{02BC}')
}

fn fold_char_into(c: char, out: &mut String) {
    let mut folded = String::new();
    for decomposed in std::iter::once(c).nfkd() {
        for lower in decomposed.to_lowercase() {
            if let Some(latin) = LATIN_CONVERT.get(&lower) {
                folded.push_str(latin);
            } else if !is_stripped_accent(lower) {
                folded.push(lower);
            }
        }
    }
    out.extend(folded.nfc());
}

/// Strip accents, expand ligatures and lower-case `text`.
///
/// ```
/// use typeahead::search::diacritics::asciifold;
/// assert_eq!(asciifold("Crème Brûlée"), "creme brulee");
/// assert_eq!(asciifold("Æsir"), "aesir");
/// ```
pub fn asciifold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        fold_char_into(c, &mut out);
    }
    out
}

/// Variants collected for one folded key, in discovery order
#[derive(Default)]
struct Variants {
    entries: Vec<String>,
    seen: HashSet<String>,
}

impl Variants {
    fn add(&mut self, spelling: &str) {
        // Case variants are already covered once the pattern is compiled case-insensitively
        if self.seen.insert(spelling.to_lowercase()) {
            self.entries.push(regex::escape(spelling));
        }
    }

    fn to_pattern(&self) -> String {
        alternation(&self.entries)
    }
}

/// Character class when every alternative is one char, group otherwise
fn alternation(alternatives: &[String]) -> String {
    match alternatives {
        [] => String::new(),
        [single] => single.clone(),
        many if many.iter().all(|a| a.chars().count() == 1) => format!("[{}]", many.concat()),
        many => format!("(?:{})", many.join("|")),
    }
}

/// Folded text -> regex fragment covering every spelling that folds to it
pub struct FoldTable {
    patterns: HashMap<String, String>,
    multi_char: HashSet<String>,
}

impl FoldTable {
    fn build(ranges: &[(u32, u32)]) -> Self {
        let started = Instant::now();
        let mut order: Vec<String> = Vec::new();
        let mut sets: HashMap<String, Variants> = HashMap::new();

        for &(min, max) in ranges {
            for code_point in min..=max {
                // Surrogates are not chars
                let Some(c) = char::from_u32(code_point) else {
                    continue;
                };
                let composed = c.to_string();
                let folded = asciifold(&composed);
                if folded == composed.to_lowercase() {
                    continue;
                }
                let len = folded.chars().count();
                if len == 0 || len > MAX_FOLDED_LEN {
                    continue;
                }
                let variants = sets.entry(folded.clone()).or_insert_with(|| {
                    order.push(folded.clone());
                    Variants::default()
                });
                variants.add(&folded);
                variants.add(&composed);
            }
        }

        let mut patterns = HashMap::with_capacity(order.len());
        let mut multi_char = HashSet::new();
        for folded in order {
            if let Some(variants) = sets.get(&folded) {
                if folded.chars().count() > 1 {
                    multi_char.insert(folded.clone());
                }
                patterns.insert(folded, variants.to_pattern());
            }
        }

        debug!(
            "Built diacritic table: {} keys ({} multi-char) in {:?}",
            patterns.len(),
            multi_char.len(),
            started.elapsed()
        );

        Self {
            patterns,
            multi_char,
        }
    }

    /// Number of folded keys in the table
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Pattern for a folded key, if any code point folds to it
    pub fn pattern_for(&self, folded: &str) -> Option<&str> {
        self.patterns.get(folded).map(String::as_str)
    }

    fn atom(&self, piece: &str) -> String {
        match self.patterns.get(piece) {
            Some(pattern) => pattern.clone(),
            None => regex::escape(piece),
        }
    }

    /// Length of the longest multi-char key starting at `at`
    fn longest_multi_at(&self, chars: &[char], at: usize) -> Option<usize> {
        (2..=MAX_FOLDED_LEN)
            .rev()
            .filter(|len| at + len <= chars.len())
            .find(|len| {
                let piece: String = chars[at..at + len].iter().collect();
                self.multi_char.contains(&piece)
            })
    }

    /// End of the chain of overlapping multi-char keys starting at `start`
    fn run_end(&self, chars: &[char], start: usize) -> usize {
        let limit = (start + MAX_RUN_LEN).min(chars.len());
        let mut end = start + 1;
        let mut at = start;
        while at < end && at < limit {
            if let Some(len) = self.longest_multi_at(chars, at) {
                end = end.max(at + len);
            }
            at += 1;
        }
        end.min(limit)
    }

    /// Every way of splitting `run` into single chars and multi-char keys,
    /// each part replaced by its variant pattern.
    fn expand_run(&self, run: &[char]) -> String {
        let mut suffixes = vec![String::new(); run.len() + 1];
        for from in (0..run.len()).rev() {
            let mut branches = Vec::new();
            for len in 1..=MAX_FOLDED_LEN.min(run.len() - from) {
                let piece: String = run[from..from + len].iter().collect();
                let head = if len == 1 {
                    self.atom(&piece)
                } else if let Some(pattern) = self.patterns.get(&piece) {
                    pattern.clone()
                } else {
                    continue;
                };
                branches.push(format!("{}{}", head, suffixes[from + len]));
            }
            suffixes[from] = match branches.len() {
                1 => branches.remove(0),
                _ => format!("(?:{})", branches.join("|")),
            };
        }
        std::mem::take(&mut suffixes[0])
    }

    /// Pattern matching every spelling of already-folded text
    pub fn expand(&self, folded: &str) -> String {
        let chars: Vec<char> = folded.chars().collect();
        // (fragment, single char?) - only single chars may take a repeat count
        let mut atoms: Vec<(String, bool)> = Vec::new();
        let mut at = 0;
        while at < chars.len() {
            let end = self.run_end(&chars, at);
            if end - at == 1 {
                atoms.push((self.atom(&chars[at].to_string()), true));
            } else {
                atoms.push((self.expand_run(&chars[at..end]), false));
            }
            at = end;
        }
        sequence(&atoms)
    }
}

/// Concatenate atoms, collapsing repeated single-char atoms into `{n}`
fn sequence(atoms: &[(String, bool)]) -> String {
    let mut pattern = String::new();
    let mut i = 0;
    while i < atoms.len() {
        let (atom, single) = &atoms[i];
        let mut repeat = 1;
        while *single && i + repeat < atoms.len() && atoms[i + repeat].0 == *atom {
            repeat += 1;
        }
        pattern.push_str(atom);
        if repeat > 1 {
            pattern.push_str(&format!("{{{}}}", repeat));
        }
        i += repeat;
    }
    pattern
}

/// Build the folding table if it has not been built yet
pub fn initialize() -> &'static FoldTable {
    &FOLD_TABLE
}

/// Regex source matching `text` under any diacritic or ligature spelling.
///
/// `text` is plain (unescaped) text: every literal is escaped here, so the
/// result is safe to compile as-is. Compile it case-insensitively. Returns an
/// empty string when nothing is left to match after folding.
pub fn diacritic_pattern(text: &str) -> String {
    let table = initialize();
    let mut pattern = table.expand(&asciifold(text));

    // Precomposed and combining-mark encodings of the same visible text
    let composed: String = text.nfc().collect();
    let decomposed: String = text.nfkd().collect();
    if composed != decomposed {
        let mut alternatives = Vec::with_capacity(3);
        if !pattern.is_empty() {
            alternatives.push(pattern);
        }
        for spelling in [composed, decomposed] {
            let literal = regex::escape(&spelling);
            if !alternatives.contains(&literal) {
                alternatives.push(literal);
            }
        }
        pattern = format!("(?:{})", alternatives.join("|"));
    }

    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::RegexBuilder;

    fn compile(text: &str) -> regex::Regex {
        let source = diacritic_pattern(text);
        RegexBuilder::new(&format!("^(?:{})$", source))
            .case_insensitive(true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_asciifold() {
        assert_eq!(asciifold("José"), "jose");
        assert_eq!(asciifold("ŁÓDŹ"), "lodz");
        assert_eq!(asciifold("Œuvre"), "oeuvre");
        assert_eq!(asciifold("ﬁne"), "fine");
        assert_eq!(asciifold("plain"), "plain");
    }

    #[test]
    fn test_table_is_populated() {
        let table = initialize();
        assert!(!table.is_empty());
        // Fragments keep one spelling per lowercase form and rely on
        // case-insensitive compilation for the other
        let fragment = |folded: &str| {
            let source = table.pattern_for(folded).unwrap();
            RegexBuilder::new(&format!("^(?:{})$", source))
                .case_insensitive(true)
                .build()
                .unwrap()
        };
        let a = fragment("a");
        for text in ["a", "A", "á", "Á", "å"] {
            assert!(a.is_match(text), "{text}");
        }
        assert!(!a.is_match("b"));
        let ae = fragment("ae");
        assert!(ae.is_match("æ"));
        assert!(ae.is_match("Æ"));
    }

    #[test]
    fn test_accented_spellings_match() {
        let re = compile("jose");
        assert!(re.is_match("jose"));
        assert!(re.is_match("José"));
        assert!(re.is_match("JOSÉ"));
        assert!(!re.is_match("josh"));
    }

    #[test]
    fn test_accented_query_matches_plain_text() {
        let re = compile("café");
        assert!(re.is_match("cafe"));
        assert!(re.is_match("Café"));
        assert!(re.is_match("cafe\u{301}".nfc().collect::<String>().as_str()));
    }

    #[test]
    fn test_ligature_splits() {
        let re = compile("aesir");
        assert!(re.is_match("aesir"));
        assert!(re.is_match("Æsir"));
        assert!(re.is_match("äesir"));

        let re = compile("oeuvre");
        assert!(re.is_match("œuvre"));
        assert!(re.is_match("oeuvre"));
    }

    #[test]
    fn test_overlapping_ligatures() {
        // "a" + "ae" as well as "aa" + "e"
        let re = compile("aae");
        assert!(re.is_match("aae"));
        assert!(re.is_match("aæ"));
        assert!(re.is_match("ꜳe"));
    }

    #[test]
    fn test_meta_characters_are_literal() {
        let re = compile("a.b");
        assert!(re.is_match("a.b"));
        assert!(!re.is_match("axb"));

        let re = compile("c++");
        assert!(re.is_match("c++"));
        assert!(re.is_match("ç++"));
    }

    #[test]
    fn test_repeated_chars_collapse() {
        let source = diacritic_pattern("zzz");
        assert!(source.ends_with("{3}"), "{}", source);
        let re = compile("zzz");
        assert!(re.is_match("zżź"));
        assert!(!re.is_match("zz"));
    }

    #[test]
    fn test_long_ligature_chain_stays_bounded() {
        let text = "a".repeat(40);
        let source = diacritic_pattern(&text);
        assert!(source.len() < 200_000);
        let re = compile(&text);
        assert!(re.is_match(&text));
    }

    #[test]
    fn test_empty_after_folding() {
        assert_eq!(diacritic_pattern(""), "");
    }
}
