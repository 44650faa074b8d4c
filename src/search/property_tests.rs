use proptest::prelude::*;
use proptest::char::range as char_range;
use serde_json::json;

use super::collection::Collection;
use super::engine::search;
use super::fuzzy::{contiguity_score, fuzzy_match, fuzzy_test, FuzzyOptions};
use super::options::SearchOptions;

fn is_subsequence(pattern: &str, text: &str) -> bool {
    let mut rest = text.chars();
    pattern.chars().all(|p| rest.any(|c| c == p))
}

/// Every placement in lexicographic order, keeping the first strictly best one
fn exhaustive_best(pattern: &[char], target: &[char], start: usize, path: &mut Vec<usize>, best: &mut Option<(u64, Vec<usize>)>) {
    if path.len() == pattern.len() {
        let score = contiguity_score(path);
        if best.as_ref().map_or(true, |(b, _)| *b < score) {
            *best = Some((score, path.clone()));
        }
        return;
    }
    for index in start..target.len() {
        if target[index] == pattern[path.len()] {
            path.push(index);
            exhaustive_best(pattern, target, index + 1, path, best);
            path.pop();
        }
    }
}

fn mixed_case_word(max: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![char_range('a', 'c'), char_range('A', 'C')], 0..max)
        .prop_map(|v| v.into_iter().collect())
}

fn word(max: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(char_range('a', 'e'), 0..max).prop_map(|v| v.into_iter().collect())
}

// Property test: matched indices point at the pattern's characters, in order
proptest! {
    #[test]
    fn fuzzy_indices_spell_the_pattern(pattern in word(5), text in word(16)) {
        if let Some(m) = fuzzy_match(&pattern, &text, &FuzzyOptions::default()) {
            let chars: Vec<char> = text.chars().collect();
            prop_assert!(m.indices.windows(2).all(|w| w[0] < w[1]));
            let spelled: String = m.indices.iter().map(|&i| chars[i]).collect();
            prop_assert_eq!(spelled, pattern);
        }
    }
}

// Property test: a match exists exactly when the pattern is a subsequence
proptest! {
    #[test]
    fn fuzzy_matches_iff_subsequence(pattern in word(5), text in word(16)) {
        let matched = fuzzy_match(&pattern, &text, &FuzzyOptions::default()).is_some();
        prop_assert_eq!(matched, is_subsequence(&pattern, &text));
    }
}

// Property test: without markers the rendered text is the input
proptest! {
    #[test]
    fn fuzzy_render_without_markers_is_identity(pattern in word(4), text in word(12)) {
        if let Some(m) = fuzzy_match(&pattern, &text, &FuzzyOptions::default()) {
            prop_assert_eq!(m.rendered, text);
        }
    }
}

// Property test: the limit caps returned items but not the reported total
proptest! {
    #[test]
    fn search_limit_keeps_total(names in proptest::collection::vec(word(8), 0..30), query in word(3), limit in 0usize..10) {
        let items = Collection::from_list(names.iter().map(|n| json!({ "name": n })).collect());
        let unlimited = search(&query, &items, &SearchOptions::new().with_field("name")).unwrap();
        let limited = search(&query, &items, &SearchOptions::new().with_field("name").with_limit(limit)).unwrap();

        prop_assert_eq!(limited.total, unlimited.total);
        prop_assert_eq!(limited.items.len(), limit.min(unlimited.total));
        prop_assert_eq!(&limited.items[..], &unlimited.items[..limited.items.len()]);
        prop_assert!(unlimited.items.iter().all(|item| item.score > 0.0));
    }
}

// Property test: the memoized search agrees with trying every placement
proptest! {
    #[test]
    fn fuzzy_picks_first_best_placement(pattern in word(5), text in word(12)) {
        let chars = |s: &str| s.chars().collect::<Vec<char>>();
        let mut best = None;
        exhaustive_best(&chars(&pattern), &chars(&text), 0, &mut Vec::new(), &mut best);

        let found = fuzzy_match(&pattern, &text, &FuzzyOptions::default()).map(|m| (m.score, m.indices));
        prop_assert_eq!(found, best);
    }
}

// Property test: mixed-case input matches iff it is a subsequence after the same case folding
proptest! {
    #[test]
    fn fuzzy_test_respects_case_setting(pattern in mixed_case_word(5), text in mixed_case_word(16), case_sensitive in any::<bool>()) {
        let options = FuzzyOptions { case_sensitive, ..FuzzyOptions::default() };
        let expected = if case_sensitive {
            is_subsequence(&pattern, &text)
        } else {
            is_subsequence(&pattern.to_lowercase(), &text.to_lowercase())
        };
        prop_assert_eq!(fuzzy_test(&pattern, &text, &options), expected);
        prop_assert_eq!(fuzzy_match(&pattern, &text, &options).is_some(), expected);
    }
}
