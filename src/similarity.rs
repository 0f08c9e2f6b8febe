//! String similarity ratios used by the title scorer and the alias matcher.
//!
//! Every ratio is in `[0.0, 1.0]` and expects normalized input (see
//! [`crate::text::normalize`]). The base edit ratio is normalized Levenshtein
//! from `strsim`; the other ratios reshape the inputs before comparing them.

use strsim::normalized_levenshtein;

use crate::text::{token_set, tokenize};

/// Length ratio above which the partial comparisons take over.
const PARTIAL_LEN_RATIO: f64 = 1.5;
/// Length ratio above which partial comparisons are heavily discounted.
const LONG_LEN_RATIO: f64 = 8.0;
const TOKEN_SCALE: f64 = 0.95;

/// Plain edit similarity over the whole strings.
pub fn ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

/// Best [`ratio`] between the shorter string and every window of the
/// longer string with the same length.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() || b_chars.is_empty() {
        return ratio(a, b);
    }

    let (short, long) = if a_chars.len() <= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };

    if short.len() == long.len() {
        return ratio(a, b);
    }

    let short: String = short.into_iter().collect();
    let mut best = 0.0_f64;
    for window in long.windows(short.chars().count()) {
        let window: String = window.iter().collect();
        let score = ratio(&short, &window);
        if score > best {
            best = score;
            if best >= 1.0 {
                break;
            }
        }
    }
    best
}

/// [`ratio`] after sorting the tokens of both sides.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Order- and duplicate-insensitive comparison of the token sets.
///
/// A side whose tokens are all contained in the other side scores 1.0.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let a_set = token_set(a);
    let b_set = token_set(b);

    if a_set.is_empty() || b_set.is_empty() {
        return 0.0;
    }

    let common = join(a_set.intersection(&b_set));
    let only_a = join(a_set.difference(&b_set));
    let only_b = join(b_set.difference(&a_set));

    if !common.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 1.0;
    }

    let combined_a = concat(&common, &only_a);
    let combined_b = concat(&common, &only_b);

    ratio(&combined_a, &combined_b)
        .max(ratio(&common, &combined_a))
        .max(ratio(&common, &combined_b))
}

/// Holistic similarity that tolerates reordered words and one string being
/// embedded in a longer one. Picks the best of the plain, token and partial
/// ratios, discounting the reshaped comparisons.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len == 0 || b_len == 0 {
        return ratio(a, b);
    }

    let base = ratio(a, b);
    if base >= 1.0 {
        return base;
    }

    let len_ratio = a_len.max(b_len) as f64 / a_len.min(b_len) as f64;

    if len_ratio < PARTIAL_LEN_RATIO {
        return base
            .max(token_sort_ratio(a, b) * TOKEN_SCALE)
            .max(token_set_ratio(a, b) * TOKEN_SCALE);
    }

    let partial_scale = if len_ratio < LONG_LEN_RATIO { 0.9 } else { 0.6 };

    base.max(partial_ratio(a, b) * partial_scale)
        .max(partial_ratio(&sorted_tokens(a), &sorted_tokens(b)) * TOKEN_SCALE * partial_scale)
        .max(token_set_ratio(a, b) * TOKEN_SCALE * partial_scale)
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens = tokenize(s);
    tokens.sort_unstable();
    tokens.join(" ")
}

fn join<'a, T: AsRef<str> + 'a>(tokens: impl Iterator<Item = &'a T>) -> String {
    tokens.map(|t| t.as_ref()).collect::<Vec<_>>().join(" ")
}

fn concat(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{} {}", head, tail),
    }
}
