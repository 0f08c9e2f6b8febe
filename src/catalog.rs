//! Title catalog index, composite scorer and ranker.
//!
//! A [`CatalogIndex`] is built once from the entries of a single platform
//! catalog and is read-only afterwards, so one index can serve any number
//! of concurrent lookups by shared reference.
//!
//! # Scoring
//!
//! Each entry gets a composite score in `[0, 1]`:
//! - **Token overlap** (55%) - IDF-weighted Jaccard of the token sets
//! - **Whole string** (30%) - [`weighted_ratio`] of the normalized strings
//! - **Token set** (15%) - [`token_set_ratio`] of the normalized strings
//! - **Numeric bonus** (+0.05) - every numeral in the query is in the title

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::similarity::{token_set_ratio, weighted_ratio};
use crate::text::{is_numeric_token, normalize, token_set};

const OVERLAP_WEIGHT: f64 = 0.55;
const WHOLE_WEIGHT: f64 = 0.30;
const TOKEN_SET_WEIGHT: f64 = 0.15;
const NUMERIC_BONUS: f64 = 0.05;

/// A catalog record. `raw_fields` holds every field except `Title`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub title: String,
    pub raw_fields: BTreeMap<String, String>,
}

impl CatalogEntry {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            raw_fields: BTreeMap::new(),
        }
    }
}

/// A ranked title with its score on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleMatch {
    pub title: String,
    pub score: f64,
    /// Position of the entry in [`CatalogIndex::entries`].
    #[serde(skip)]
    pub position: usize,
}

/// Individual signals behind a composite score, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub overlap: f64,
    pub whole: f64,
    pub token_set: f64,
    pub bonus: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: Vec<CatalogEntry>,
    normalized_titles: Vec<String>,
    title_tokens: Vec<BTreeSet<String>>,
    document_frequency: HashMap<String, usize>,
    idf: HashMap<String, f64>,
}

impl CatalogIndex {
    /// Build the index. Entries whose title normalizes to nothing are skipped.
    pub fn build(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut kept = Vec::new();
        let mut normalized_titles = Vec::new();
        let mut title_tokens = Vec::new();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        let mut skipped = 0usize;

        for entry in entries {
            let normalized = normalize(&entry.title);
            if normalized.is_empty() {
                skipped += 1;
                tracing::debug!(title = %entry.title, "skipping catalog entry without usable title");
                continue;
            }

            let tokens: BTreeSet<String> =
                token_set(&normalized).into_iter().map(str::to_string).collect();
            for token in &tokens {
                *document_frequency.entry(token.clone()).or_default() += 1;
            }

            kept.push(entry);
            normalized_titles.push(normalized);
            title_tokens.push(tokens);
        }

        let n = kept.len();
        let idf = document_frequency
            .iter()
            .map(|(token, df)| (token.clone(), idf_weight(n, *df)))
            .collect();

        tracing::debug!(
            entries = n,
            skipped,
            vocabulary = document_frequency.len(),
            "built catalog index"
        );

        Self {
            entries: kept,
            normalized_titles,
            title_tokens,
            document_frequency,
            idf,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn normalized_title(&self, position: usize) -> Option<&str> {
        self.normalized_titles.get(position).map(String::as_str)
    }

    pub fn document_frequency(&self, token: &str) -> usize {
        self.document_frequency.get(token).copied().unwrap_or(0)
    }

    /// IDF weight of a token; tokens outside the vocabulary weigh as df = 0.
    pub fn idf(&self, token: &str) -> f64 {
        self.idf
            .get(token)
            .copied()
            .unwrap_or_else(|| idf_weight(self.len(), 0))
    }

    /// Composite score in `[0, 1]` of the entry at `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position >= self.len()`.
    pub fn score(&self, query: &str, query_tokens: &BTreeSet<&str>, position: usize) -> f64 {
        self.score_breakdown(query, query_tokens, position).total
    }

    /// The signals behind [`score`](Self::score).
    ///
    /// # Panics
    ///
    /// Panics if `position >= self.len()`.
    pub fn score_breakdown(
        &self,
        query: &str,
        query_tokens: &BTreeSet<&str>,
        position: usize,
    ) -> ScoreBreakdown {
        let title = &self.normalized_titles[position];
        let title_tokens = &self.title_tokens[position];

        let overlap = self.weighted_overlap(query_tokens, title_tokens);
        let whole = weighted_ratio(query, title);
        let token_set = token_set_ratio(query, title);
        let bonus = if numerals_present(query_tokens, title_tokens) {
            NUMERIC_BONUS
        } else {
            0.0
        };

        let total = (OVERLAP_WEIGHT * overlap
            + WHOLE_WEIGHT * whole
            + TOKEN_SET_WEIGHT * token_set
            + bonus)
            .clamp(0.0, 1.0);

        ScoreBreakdown {
            overlap,
            whole,
            token_set,
            bonus,
            total,
        }
    }

    fn weighted_overlap(&self, query: &BTreeSet<&str>, title: &BTreeSet<String>) -> f64 {
        if query.is_empty() || title.is_empty() {
            return 0.0;
        }

        let mut shared = 0.0;
        let mut union = 0.0;
        for token in query {
            let weight = self.idf(token);
            union += weight;
            if title.contains(*token) {
                shared += weight;
            }
        }
        for token in title {
            if !query.contains(token.as_str()) {
                union += self.idf(token);
            }
        }

        if union > 0.0 {
            shared / union
        } else {
            0.0
        }
    }

    /// Every entry scored against `text`, best first. Ties keep catalog order.
    fn ranked(&self, text: &str) -> Vec<(usize, f64)> {
        let query = normalize(text);
        if query.is_empty() || self.is_empty() {
            return Vec::new();
        }

        let query_tokens = token_set(&query);
        let mut scored: Vec<(usize, f64)> = (0..self.len())
            .map(|position| (position, self.score(&query, &query_tokens, position)))
            .collect();

        // `sort_by` is stable, so equal scores stay in load order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
    }

    /// Highest scoring title, or `None` for an empty query or catalog.
    pub fn best_match(&self, text: &str) -> Option<TitleMatch> {
        self.top_matches(text, 1).into_iter().next()
    }

    /// Up to `limit` titles ordered by descending score.
    pub fn top_matches(&self, text: &str, limit: usize) -> Vec<TitleMatch> {
        if limit == 0 {
            return Vec::new();
        }

        self.ranked(text)
            .into_iter()
            .take(limit)
            .map(|(position, score)| TitleMatch {
                title: self.entries[position].title.clone(),
                score: to_percent(score),
                position,
            })
            .collect()
    }

    /// Rank against several readings of the same text (for instance each OCR
    /// line plus the whole text). A title keeps its best score over all
    /// queries; ties fall back to catalog order.
    pub fn top_matches_across<'q>(
        &self,
        queries: impl IntoIterator<Item = &'q str>,
        limit: usize,
    ) -> Vec<TitleMatch> {
        let mut best: BTreeMap<usize, TitleMatch> = BTreeMap::new();
        for query in queries {
            for candidate in self.top_matches(query, limit) {
                match best.get(&candidate.position) {
                    Some(current) if current.score >= candidate.score => {}
                    _ => {
                        best.insert(candidate.position, candidate);
                    }
                }
            }
        }

        // BTreeMap iteration is in position order, so the stable sort keeps
        // catalog order among equal scores.
        let mut merged: Vec<TitleMatch> = best.into_values().collect();
        merged.sort_by(|a, b| b.score.total_cmp(&a.score));
        merged.truncate(limit);
        merged
    }
}

/// Best title for `text` in `index`.
pub fn match_title(text: &str, index: &CatalogIndex) -> Option<TitleMatch> {
    index.best_match(text)
}

/// Top `limit` titles for `text` in `index`; possibly empty.
pub fn match_titles(text: &str, index: &CatalogIndex, limit: usize) -> Vec<TitleMatch> {
    index.top_matches(text, limit)
}

fn idf_weight(total_entries: usize, document_frequency: usize) -> f64 {
    let n = total_entries as f64;
    let df = document_frequency as f64;
    (1.0 + n / (1.0 + df)).ln()
}

fn numerals_present(query: &BTreeSet<&str>, title: &BTreeSet<String>) -> bool {
    let mut numerals = query.iter().filter(|t| is_numeric_token(t)).peekable();
    numerals.peek().is_some() && numerals.all(|t| title.contains(*t))
}

fn to_percent(score: f64) -> f64 {
    (score * 100.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(titles: &[&str]) -> CatalogIndex {
        CatalogIndex::build(titles.iter().map(|t| CatalogEntry::new(*t)))
    }

    fn ps2_sample() -> CatalogIndex {
        index_of(&[
            "God of War",
            "God of War II",
            "Soulcalibur II",
            "Soulcalibur III",
            "Thomas & Friends: A Day at the Races",
            "Tekken Tag Tournament",
            "Gran Turismo 3: A-Spec",
            "Gran Turismo 4",
            "Final Fantasy X",
            "Final Fantasy X-2",
        ])
    }

    #[test]
    fn test_build_document_frequency_and_idf() {
        let index = index_of(&["God of War 2", "God of War 3", "Halo"]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.document_frequency("GOD"), 2);
        assert_eq!(index.document_frequency("HALO"), 1);
        assert_eq!(index.document_frequency("ZELDA"), 0);

        let expected_common = (1.0_f64 + 3.0 / 3.0).ln();
        let expected_rare = (1.0_f64 + 3.0 / 2.0).ln();
        let expected_unknown = (1.0_f64 + 3.0).ln();
        assert!((index.idf("GOD") - expected_common).abs() < 1e-12);
        assert!((index.idf("HALO") - expected_rare).abs() < 1e-12);
        assert!((index.idf("ZELDA") - expected_unknown).abs() < 1e-12);
        assert!(index.idf("HALO") > index.idf("GOD"));
    }

    #[test]
    fn test_build_skips_unusable_titles() {
        let index = index_of(&["Halo", "", "???", "Tekken"]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.entries()[1].title, "Tekken");
        assert_eq!(index.normalized_title(0), Some("HALO"));
    }

    #[test]
    fn test_duplicate_tokens_count_once_per_title() {
        let index = index_of(&["Mega Man Mega"]);
        assert_eq!(index.document_frequency("MEGA"), 1);
    }

    #[test]
    fn test_exact_title_scores_100() {
        let index = ps2_sample();
        for entry in index.entries() {
            let best = index.best_match(&entry.title).expect("should match");
            assert_eq!(best.score, 100.0, "title {:?}", entry.title);
        }
    }

    #[test]
    fn test_numeric_bonus_prefers_matching_numeral() {
        let index = index_of(&["GOD OF WAR 2", "GOD OF WAR 3"]);
        let query = normalize("GOD OF WAR 3 GAME");
        let tokens = token_set(&query);

        let two = index.score_breakdown(&query, &tokens, 0);
        let three = index.score_breakdown(&query, &tokens, 1);
        assert_eq!(two.bonus, 0.0);
        assert_eq!(three.bonus, NUMERIC_BONUS);
        assert!(three.total > two.total);

        let best = index.best_match("GOD OF WAR 3 GAME").expect("should match");
        assert_eq!(best.title, "GOD OF WAR 3");
    }

    #[test]
    fn test_numeric_bonus_requires_every_numeral() {
        let index = index_of(&["Gran Turismo 3"]);
        let query = normalize("Gran Turismo 3 2001");
        let tokens = token_set(&query);
        assert_eq!(index.score_breakdown(&query, &tokens, 0).bonus, 0.0);

        let query = normalize("Gran Turismo");
        let tokens = token_set(&query);
        assert_eq!(index.score_breakdown(&query, &tokens, 0).bonus, 0.0);
    }

    #[test]
    #[should_panic]
    fn test_score_out_of_range_position_panics() {
        let index = index_of(&["Halo"]);
        let query = normalize("HALO");
        index.score(&query, &token_set(&query), 1);
    }

    #[test]
    fn test_breakdown_signals_are_bounded() {
        let index = ps2_sample();
        let query = normalize("PlayStation.2 SOULCALIBUR III namco");
        let tokens = token_set(&query);
        for position in 0..index.len() {
            let b = index.score_breakdown(&query, &tokens, position);
            for signal in [b.overlap, b.whole, b.token_set, b.total] {
                assert!((0.0..=1.0).contains(&signal), "{:?}", b);
            }
        }
    }

    #[test]
    fn test_noisy_ocr_text_finds_title() {
        let index = ps2_sample();
        let ocr = "PlayStation&2 PlayStation.2 THOMAS &FRIENDS Thomas & Friends:A Day at the Races \
                   ADAYATTHERACES THOMAS ADAYATTHERACES THOMAS &FRIENDS ADAY AT THERACES PlayStation.2";
        let best = index.best_match(ocr).expect("should match");
        assert_eq!(best.title, "Thomas & Friends: A Day at the Races");
    }

    #[test]
    fn test_rare_tokens_outweigh_common_ones() {
        let index = ps2_sample();
        let best = index.best_match("SOULCALIBUR III").expect("should match");
        assert_eq!(best.title, "Soulcalibur III");
        let best = index.best_match("FINAL FANTASY X 2").expect("should match");
        assert_eq!(best.title, "Final Fantasy X-2");
    }

    #[test]
    fn test_empty_query_is_no_match() {
        let index = ps2_sample();
        assert!(index.best_match("").is_none());
        assert!(index.best_match("  &&  \n").is_none());
        assert!(index.top_matches("", 5).is_empty());
    }

    #[test]
    fn test_empty_catalog_is_no_match() {
        let index = CatalogIndex::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.best_match("ANYTHING").is_none());
        assert!(index.top_matches("ANYTHING", 3).is_empty());
    }

    #[test]
    fn test_top_matches_length_and_order() {
        let index = ps2_sample();
        for limit in [0, 1, 3, index.len(), index.len() + 5] {
            let matches = index.top_matches("GRAN TURISMO", limit);
            assert_eq!(matches.len(), limit.min(index.len()));
            for pair in matches.windows(2) {
                assert!(pair[0].score >= pair[1].score, "{:?}", matches);
            }
        }
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let mut first = CatalogEntry::new("Halo");
        first.raw_fields.insert("Region".into(), "NTSC".into());
        let mut second = CatalogEntry::new("Halo");
        second.raw_fields.insert("Region".into(), "PAL".into());
        let index = CatalogIndex::build(vec![first, second]);

        let matches = index.top_matches("HALO", 2);
        assert_eq!(matches[0].score, matches[1].score);
        assert_eq!(matches[0].position, 0);
        assert_eq!(matches[1].position, 1);
        assert_eq!(index.entries()[matches[0].position].raw_fields["Region"], "NTSC");
    }

    #[test]
    fn test_scores_rounded_to_two_decimals() {
        let index = ps2_sample();
        for m in index.top_matches("GOD OF WAR II GREATEST HITS", 5) {
            let scaled = m.score * 100.0;
            assert!((scaled - scaled.round()).abs() < 1e-6, "{}", m.score);
            assert!((0.0..=100.0).contains(&m.score));
        }
    }

    #[test]
    fn test_free_functions_match_methods() {
        let index = ps2_sample();
        assert_eq!(match_title("tekken tag", &index), index.best_match("tekken tag"));
        assert_eq!(match_titles("tekken tag", &index, 3), index.top_matches("tekken tag", 3));
    }

    #[test]
    fn test_top_matches_across_keeps_best_score_per_title() {
        let index = ps2_sample();
        let whole = "SONY PLAYSTATION 2 NTSC\nGRAN TURISMO 4\nTHE REAL DRIVING SIMULATOR";
        let lines = ["SONY PLAYSTATION 2 NTSC", "GRAN TURISMO 4", "THE REAL DRIVING SIMULATOR"];

        let merged = index.top_matches_across(std::iter::once(whole).chain(lines), 3);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].title, "Gran Turismo 4");
        assert_eq!(merged[0].score, 100.0);

        let positions: BTreeSet<usize> = merged.iter().map(|m| m.position).collect();
        assert_eq!(positions.len(), merged.len(), "titles must not repeat");
        for pair in merged.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_top_matches_across_empty_inputs() {
        let index = ps2_sample();
        assert!(index.top_matches_across(Vec::<&str>::new(), 3).is_empty());
        assert!(index.top_matches_across(["", "  "], 3).is_empty());
        assert!(index.top_matches_across(["HALO"], 0).is_empty());
    }

    #[test]
    fn test_deterministic_across_threads() {
        let index = ps2_sample();
        let expected = index.top_matches("SOUL CALIBUR 2 namco", 4);

        let index = &index;
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(move || index.top_matches("SOUL CALIBUR 2 namco", 4)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_index_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CatalogIndex>();
    }
}
