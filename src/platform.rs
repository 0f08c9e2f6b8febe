//! Platform resolution from free text through an alias table.
//!
//! Resolution runs in two phases. Any alias found verbatim in the text wins,
//! the longest one first, so "XBOX ONE" beats "XBOX". Only when no alias
//! occurs verbatim does the fuzzy phase compare every alias against the text
//! with [`partial_ratio`] and accept the best one above the threshold.

use serde::Serialize;

use crate::similarity::partial_ratio;
use crate::text::normalize;

pub const DEFAULT_THRESHOLD: f64 = 80.0;

/// Canonical platform name with its alternate spellings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformAliases {
    pub platform: String,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Substring,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformMatch {
    pub platform: String,
    /// The alias that matched, as written in the table.
    pub alias: String,
    /// 100 for substring matches, the partial ratio (0-100) otherwise.
    pub score: f64,
    pub kind: MatchKind,
}

#[derive(Debug, Clone)]
struct Alias {
    raw: String,
    normalized: String,
}

#[derive(Debug, Clone)]
struct PlatformRow {
    platform: String,
    aliases: Vec<Alias>,
}

/// Immutable alias table; aliases are normalized once at construction.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    rows: Vec<PlatformRow>,
}

impl AliasTable {
    /// Aliases that normalize to nothing are dropped, as are platforms left
    /// without any alias. Table order is preserved.
    pub fn new(platforms: impl IntoIterator<Item = PlatformAliases>) -> Self {
        let mut rows = Vec::new();

        for entry in platforms {
            let mut aliases: Vec<Alias> = Vec::new();
            for raw in entry.aliases {
                let normalized = normalize(&raw);
                if normalized.is_empty() || aliases.iter().any(|a| a.normalized == normalized) {
                    continue;
                }
                aliases.push(Alias { raw, normalized });
            }

            if aliases.is_empty() {
                tracing::debug!(platform = %entry.platform, "dropping platform without usable aliases");
                continue;
            }

            rows.push(PlatformRow {
                platform: entry.platform,
                aliases,
            });
        }

        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn platforms(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.platform.as_str())
    }

    /// Best platform for `text`, or `None` when nothing clears `threshold`.
    ///
    /// `threshold` is on the 0-100 scale and only applies to the fuzzy phase.
    pub fn resolve(&self, text: &str, threshold: f64) -> Option<PlatformMatch> {
        let query = normalize(text);
        if query.is_empty() || self.is_empty() {
            return None;
        }

        if let Some((row, alias)) = self.longest_contained(&query) {
            return Some(PlatformMatch {
                platform: row.platform.clone(),
                alias: alias.raw.clone(),
                score: 100.0,
                kind: MatchKind::Substring,
            });
        }

        let (row, alias, score) = self.closest_fuzzy(&query)?;
        if score < threshold {
            tracing::debug!(alias = %alias.raw, score, threshold, "closest alias below threshold");
            return None;
        }

        Some(PlatformMatch {
            platform: row.platform.clone(),
            alias: alias.raw.clone(),
            score,
            kind: MatchKind::Fuzzy,
        })
    }

    fn longest_contained(&self, query: &str) -> Option<(&PlatformRow, &Alias)> {
        let mut best: Option<(&PlatformRow, &Alias)> = None;
        for row in &self.rows {
            for alias in &row.aliases {
                if !query.contains(alias.normalized.as_str()) {
                    continue;
                }
                let longer = best.map_or(true, |(_, current)| {
                    alias.normalized.len() > current.normalized.len()
                });
                if longer {
                    best = Some((row, alias));
                }
            }
        }
        best
    }

    fn closest_fuzzy(&self, query: &str) -> Option<(&PlatformRow, &Alias, f64)> {
        let mut best: Option<(&PlatformRow, &Alias, f64)> = None;
        for row in &self.rows {
            for alias in &row.aliases {
                let score = partial_ratio(&alias.normalized, query) * 100.0;
                if best.map_or(true, |(_, _, current)| score > current) {
                    best = Some((row, alias, score));
                }
            }
        }
        best
    }
}

/// Platform name for `text`, or `None`.
pub fn resolve_platform(text: &str, table: &AliasTable, threshold: f64) -> Option<String> {
    table.resolve(text, threshold).map(|m| m.platform)
}

pub fn is_valid_threshold(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(platform: &str, aliases: &[&str]) -> PlatformAliases {
        PlatformAliases {
            platform: platform.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn consoles() -> AliasTable {
        AliasTable::new(vec![
            row("PlayStation 2", &["PlayStation 2", "PS2"]),
            row("Xbox", &["Xbox"]),
            row("Xbox One", &["Xbox One"]),
            row("Xbox 360", &["X-Box 360", "Xbox 360"]),
        ])
    }

    #[test]
    fn test_longest_alias_wins() {
        let table = consoles();
        assert_eq!(
            resolve_platform("XBOX ONE CONSOLE", &table, DEFAULT_THRESHOLD),
            Some("Xbox One".to_string())
        );
        assert_eq!(
            resolve_platform("xbox 360 platinum hits", &table, DEFAULT_THRESHOLD),
            Some("Xbox 360".to_string())
        );
        assert_eq!(
            resolve_platform("XBOX", &table, DEFAULT_THRESHOLD),
            Some("Xbox".to_string())
        );
    }

    #[test]
    fn test_substring_match_details() {
        let table = consoles();
        let m = table.resolve("PlayStation.2 SOULCALIBUR III", DEFAULT_THRESHOLD).unwrap();
        assert_eq!(m.platform, "PlayStation 2");
        assert_eq!(m.alias, "PlayStation 2");
        assert_eq!(m.kind, MatchKind::Substring);
        assert_eq!(m.score, 100.0);
    }

    #[test]
    fn test_equal_length_aliases_resolve_in_table_order() {
        let table = AliasTable::new(vec![row("Nintendo DS", &["DS"]), row("Dreamcast", &["DC", "DS"])]);
        assert_eq!(
            resolve_platform("DS DC", &table, DEFAULT_THRESHOLD),
            Some("Nintendo DS".to_string())
        );
    }

    #[test]
    fn test_substring_outranks_fuzzy() {
        // "PLAYSTATIO 3" is a near miss for PS3 but "PS2" occurs verbatim.
        let table = AliasTable::new(vec![
            row("PlayStation 3", &["PlayStation 3"]),
            row("PlayStation 2", &["PS2"]),
        ]);
        let m = table.resolve("PLAYSTATIO 3 PS2", DEFAULT_THRESHOLD).unwrap();
        assert_eq!(m.platform, "PlayStation 2");
        assert_eq!(m.kind, MatchKind::Substring);
    }

    #[test]
    fn test_fuzzy_fallback_respects_threshold() {
        let table = consoles();

        let m = table.resolve("PLEYSTASHUN2", 50.0).unwrap();
        assert_eq!(m.platform, "PlayStation 2");
        assert_eq!(m.alias, "PlayStation 2");
        assert_eq!(m.kind, MatchKind::Fuzzy);
        assert!(m.score >= 50.0 && m.score < 80.0, "got {}", m.score);

        assert_eq!(resolve_platform("PLEYSTASHUN2", &table, DEFAULT_THRESHOLD), None);
    }

    #[test]
    fn test_fuzzy_accepts_close_spelling_at_default_threshold() {
        let table = consoles();
        let m = table.resolve("PLAYSTATON 2 GREATEST HITS", DEFAULT_THRESHOLD).unwrap();
        assert_eq!(m.platform, "PlayStation 2");
        assert_eq!(m.kind, MatchKind::Fuzzy);
        assert!(m.score >= DEFAULT_THRESHOLD, "got {}", m.score);
    }

    #[test]
    fn test_empty_text_or_table_is_none() {
        let table = consoles();
        assert_eq!(resolve_platform("", &table, DEFAULT_THRESHOLD), None);
        assert_eq!(resolve_platform(" !? ", &table, DEFAULT_THRESHOLD), None);
        assert_eq!(
            resolve_platform("XBOX ONE", &AliasTable::default(), DEFAULT_THRESHOLD),
            None
        );
    }

    #[test]
    fn test_unusable_aliases_are_dropped() {
        let table = AliasTable::new(vec![
            row("Broken", &["", "***"]),
            row("Wii", &["Wii", "WII", "wii!"]),
        ]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.platforms().collect::<Vec<_>>(), vec!["Wii"]);
        assert_eq!(table.rows[0].aliases.len(), 1);
    }

    #[test]
    fn test_threshold_validation() {
        assert!(is_valid_threshold(0.0));
        assert!(is_valid_threshold(80.0));
        assert!(is_valid_threshold(100.0));
        assert!(!is_valid_threshold(-1.0));
        assert!(!is_valid_threshold(100.5));
        assert!(!is_valid_threshold(f64::NAN));
    }
}
