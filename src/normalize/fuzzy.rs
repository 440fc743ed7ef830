//! Approximate string scoring on a 0-100 scale
//!
//! Scores follow the weighted-ratio scheme used by the common fuzzy
//! matching libraries so that thresholds carry over:
//!
//! - `ratio` is the normalized indel similarity, `2 * LCS / (|a| + |b|)`,
//!   where LCS is the longest common subsequence of chars.
//! - `partial_ratio` aligns the shorter string against every window of the
//!   longer one.
//! - the token variants compare sorted tokens and token sets.
//! - `weighted_ratio` combines them, favouring partial matches only when the
//!   lengths differ a lot.
//!
//! Inputs to `weighted_ratio` and `extract_one` go through
//! [`default_process`] first, so case and punctuation (including the `#`
//! prefix) never affect the score.

use std::collections::BTreeSet;

/// Token ratios are scaled down so exact character matches win ties
const UNBASE_SCALE: f64 = 0.95;

/// Length ratio at which partial matching kicks in
const PARTIAL_LENGTH_RATIO: f64 = 1.5;

/// Length ratio past which partial matches are trusted even less
const LONG_PARTIAL_LENGTH_RATIO: f64 = 8.0;

/// Best match found by [`extract_one`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    pub choice: &'a str,
    pub score: u8,
}

/// Lowercase, turn every non-alphanumeric char into a space, trim
pub fn default_process(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .trim()
        .to_string()
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

fn partial_ratio_chars(a: &[char], b: &[char]) -> f64 {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let n = short.len();
    let mut best: f64 = 0.0;

    // Full-length windows
    for start in 0..=(long.len() - n) {
        best = best.max(ratio_chars(short, &long[start..start + n]));
        if best >= 100.0 {
            return 100.0;
        }
    }

    // Windows clipped at either end of the longer string
    for k in 1..n {
        best = best
            .max(ratio_chars(short, &long[..k]))
            .max(ratio_chars(short, &long[long.len() - k..]));
    }

    best
}

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// Normalized indel similarity, 0-100
pub fn ratio(a: &str, b: &str) -> f64 {
    ratio_chars(&chars(a), &chars(b))
}

/// Best `ratio` of the shorter string against windows of the longer one
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    partial_ratio_chars(&chars(a), &chars(b))
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// `ratio` after sorting whitespace-separated tokens
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// `partial_ratio` after sorting whitespace-separated tokens
pub fn partial_token_sort_ratio(a: &str, b: &str) -> f64 {
    partial_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

struct TokenSets {
    intersection: String,
    diff_ab: String,
    diff_ba: String,
}

impl TokenSets {
    fn new(a: &str, b: &str) -> Self {
        let set_a: BTreeSet<&str> = a.split_whitespace().collect();
        let set_b: BTreeSet<&str> = b.split_whitespace().collect();
        let join = |tokens: Vec<&str>| tokens.join(" ");

        Self {
            intersection: join(set_a.intersection(&set_b).copied().collect()),
            diff_ab: join(set_a.difference(&set_b).copied().collect()),
            diff_ba: join(set_b.difference(&set_a).copied().collect()),
        }
    }

    fn with_intersection(&self, diff: &str) -> String {
        match (self.intersection.is_empty(), diff.is_empty()) {
            (true, _) => diff.to_string(),
            (false, true) => self.intersection.clone(),
            (false, false) => format!("{} {}", self.intersection, diff),
        }
    }
}

/// Compare the shared tokens against each side's leftovers
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let sets = TokenSets::new(a, b);
    if sets.intersection.is_empty() && sets.diff_ab.is_empty() && sets.diff_ba.is_empty() {
        return 0.0;
    }
    if !sets.intersection.is_empty() && (sets.diff_ab.is_empty() || sets.diff_ba.is_empty()) {
        return 100.0;
    }

    let combined_ab = sets.with_intersection(&sets.diff_ab);
    let combined_ba = sets.with_intersection(&sets.diff_ba);

    ratio(&sets.intersection, &combined_ab)
        .max(ratio(&sets.intersection, &combined_ba))
        .max(ratio(&combined_ab, &combined_ba))
}

/// Any shared token is a perfect partial match; otherwise compare leftovers
pub fn partial_token_set_ratio(a: &str, b: &str) -> f64 {
    let sets = TokenSets::new(a, b);
    if !sets.intersection.is_empty() {
        return 100.0;
    }
    partial_ratio(&sets.diff_ab, &sets.diff_ba)
}

/// Weighted combination of the ratios above, rounded half to even into 0-100
///
/// Both inputs are preprocessed with [`default_process`]. Returns 0 if
/// either side is empty after preprocessing.
pub fn weighted_ratio(a: &str, b: &str) -> u8 {
    let p1 = default_process(a);
    let p2 = default_process(b);
    processed_weighted_ratio(&p1, &p2)
}

fn processed_weighted_ratio(p1: &str, p2: &str) -> u8 {
    if p1.is_empty() || p2.is_empty() {
        return 0;
    }

    let len1 = p1.chars().count() as f64;
    let len2 = p2.chars().count() as f64;
    let len_ratio = len1.max(len2) / len1.min(len2);

    let base = ratio(p1, p2);

    let score = if len_ratio < PARTIAL_LENGTH_RATIO {
        base.max(token_sort_ratio(p1, p2) * UNBASE_SCALE)
            .max(token_set_ratio(p1, p2) * UNBASE_SCALE)
    } else {
        let partial_scale = if len_ratio < LONG_PARTIAL_LENGTH_RATIO { 0.9 } else { 0.6 };
        base.max(partial_ratio(p1, p2) * partial_scale)
            .max(partial_token_sort_ratio(p1, p2) * UNBASE_SCALE * partial_scale)
            .max(partial_token_set_ratio(p1, p2) * UNBASE_SCALE * partial_scale)
    };

    score.round_ties_even().clamp(0.0, 100.0) as u8
}

/// Highest-scoring choice for `query`; the first one wins ties.
///
/// Returns `None` only when `choices` is empty.
pub fn extract_one<'a, I>(query: &str, choices: I) -> Option<Match<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let processed_query = default_process(query);
    let mut best: Option<Match<'a>> = None;

    for choice in choices {
        let score = processed_weighted_ratio(&processed_query, &default_process(choice));
        if best.map_or(true, |b| score > b.score) {
            best = Some(Match { choice, score });
            if score == 100 {
                break;
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_strips_case_and_punctuation() {
        assert_eq!(default_process("#DataEngineer"), "dataengineer");
        assert_eq!(default_process("  #foo_bar! "), "foo bar");
        assert_eq!(default_process("#"), "");
    }

    #[test]
    fn ratio_is_normalized_indel_similarity() {
        assert_eq!(ratio("abc", "abc"), 100.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert!((ratio("this is a test", "this is a test!") - 96.551_724).abs() < 1e-4);
    }

    #[test]
    fn partial_ratio_finds_embedded_match() {
        assert_eq!(partial_ratio("this is a test", "this is a test!"), 100.0);
        assert_eq!(partial_ratio("bear", "fuzzy bear"), 100.0);
        assert_eq!(partial_ratio("", "abc"), 0.0);
    }

    #[test]
    fn token_ratios_ignore_word_order() {
        let sorted = token_sort_ratio("fuzzy wuzzy was a bear", "wuzzy fuzzy was a bear");
        assert_eq!(sorted, 100.0);
        let set = token_set_ratio("fuzzy was a bear", "fuzzy fuzzy was a bear");
        assert_eq!(set, 100.0);
        assert_eq!(partial_token_set_ratio("new york", "york city"), 100.0);
    }

    #[test]
    fn weighted_ratio_scores_typos_high() {
        assert_eq!(weighted_ratio("#dataenginer", "#dataengineer"), 96);
        assert_eq!(weighted_ratio("#startup", "#startups"), 93);
        assert_eq!(weighted_ratio("#BERLIN", "#berlin"), 100);
    }

    #[test]
    fn weighted_ratio_scores_unrelated_low() {
        assert!(weighted_ratio("#quantumcomputing", "#dataengineer") < 50);
        assert_eq!(weighted_ratio("#", "#berlin"), 0);
    }

    #[test]
    fn weighted_ratio_rounds_halves_to_even() {
        // 5 shared chars out of 16: exactly 62.5
        assert_eq!(weighted_ratio("#abcdexyz", "#abcdeqrs"), 62);
        // 1 shared char out of 16: exactly 12.5
        assert_eq!(weighted_ratio("#axxxxxxx", "#ayyyyyyy"), 12);
    }

    #[test]
    fn weighted_ratio_discounts_partial_matches() {
        // "ai" sits inside "aiethics": partial 100, scaled by 0.9
        assert_eq!(weighted_ratio("#aiethics", "#ai"), 90);
    }

    #[test]
    fn extract_one_prefers_first_of_equal_scores() {
        let choices = ["#beer", "#beer", "#berlin"];
        let best = extract_one("#beer", choices).unwrap();
        assert_eq!(best.choice, "#beer");
        assert_eq!(best.score, 100);

        let best = extract_one("#berln", ["#beer", "#berlin"]).unwrap();
        assert_eq!(best.choice, "#berlin");
    }

    #[test]
    fn extract_one_on_empty_choices() {
        assert!(extract_one("#x", std::iter::empty::<&str>()).is_none());
    }
}
