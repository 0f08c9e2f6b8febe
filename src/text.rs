//! Text canonicalization shared by the title index and the alias matcher.

use std::collections::BTreeSet;

/// Canonicalize noisy OCR text: ASCII uppercase, anything outside
/// `[A-Z0-9 ]` becomes a space, whitespace runs collapse to one space.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        let upper = ch.to_ascii_uppercase();
        if upper.is_ascii_uppercase() || upper.is_ascii_digit() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(upper);
        } else {
            pending_space = true;
        }
    }

    out
}

/// Split normalized text into its tokens, in order.
pub fn tokenize(normalized: &str) -> Vec<&str> {
    normalized.split(' ').filter(|t| !t.is_empty()).collect()
}

/// Order-insensitive, duplicate-free view of the tokens.
pub fn token_set(normalized: &str) -> BTreeSet<&str> {
    normalized.split(' ').filter(|t| !t.is_empty()).collect()
}

pub fn is_numeric_token(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}
