//! Helpers for turning raw OCR output into title queries.

use regex::Regex;
use std::sync::OnceLock;

const MAX_CANDIDATES: usize = 5;
const MAX_VARIATIONS: usize = 3;
const MAX_CLEANED_CHARS: usize = 150;

fn price_marker() -> &'static Regex {
    static PRICE: OnceLock<Regex> = OnceLock::new();
    PRICE.get_or_init(|| Regex::new(r"(?i)price|[$€£]").expect("price pattern is valid"))
}

fn digits_only() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"^\d+$").expect("digits pattern is valid"))
}

fn stray_chars() -> &'static Regex {
    static STRAY: OnceLock<Regex> = OnceLock::new();
    STRAY.get_or_init(|| {
        Regex::new(r"[^A-Za-z0-9_\s\-:()&']").expect("stray character pattern is valid")
    })
}

/// Words printed on boxes and listings that are never part of a title.
fn filler_words() -> &'static Regex {
    static FILLER: OnceLock<Regex> = OnceLock::new();
    FILLER.get_or_init(|| {
        Regex::new(
            r"\b(game|games|video|console|playstation|xbox|nintendo|pc|version|edition|new|used)\b",
        )
        .expect("filler word pattern is valid")
    })
}

/// Lines of OCR output that could hold a title: not too short or long, not
/// a bare number, no price text. At most five, in reading order.
pub fn candidate_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| {
            let len = line.chars().count();
            len > 3 && len < 100
        })
        .filter(|line| !digits_only().is_match(line))
        .filter(|line| !price_marker().is_match(line))
        .take(MAX_CANDIDATES)
        .collect()
}

/// Whether `text` reads like a title rather than OCR debris.
pub fn is_plausible_title(text: &str) -> bool {
    let text = text.trim();
    let len = text.chars().count();
    if !(3..=100).contains(&len) {
        return false;
    }
    if digits_only().is_match(text) {
        return false;
    }
    if !text.chars().any(|c| c.is_ascii_alphabetic()) {
        return false;
    }

    let symbols = text
        .chars()
        .filter(|c| !c.is_ascii_alphanumeric() && !c.is_whitespace())
        .count();
    symbols as f64 <= len as f64 * 0.3
}

/// Lowercased single-line text with stray symbols and filler words
/// removed, at most 150 characters. Empty when almost nothing is left.
pub fn clean_text(text: &str) -> String {
    let text = collapse_whitespace(&stray_chars().replace_all(text, " "));
    if text.chars().count() <= 2 {
        return String::new();
    }

    let lowered = text.to_lowercase();
    collapse_whitespace(&filler_words().replace_all(&lowered, ""))
        .chars()
        .take(MAX_CLEANED_CHARS)
        .collect()
}

/// Up to three cleaned readings of the OCR text worth ranking on their own:
/// the whole text, each candidate line, then the whole text minus its first
/// word, minus its last word, and its first two words.
pub fn query_variations(text: &str) -> Vec<String> {
    let mut variations: Vec<String> = Vec::new();
    let mut push = |candidate: String| {
        if variations.len() < MAX_VARIATIONS
            && is_plausible_title(&candidate)
            && !variations.contains(&candidate)
        {
            variations.push(candidate);
        }
    };

    let cleaned = clean_text(text);
    push(cleaned.clone());

    for line in candidate_lines(text) {
        push(clean_text(line));
    }

    let words: Vec<&str> = cleaned.split(' ').collect();
    if words.len() > 1 {
        push(words[1..].join(" "));
        push(words[..words.len() - 1].join(" "));
        push(words[..2].join(" "));
    }

    variations
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
