use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::Config;
use retrosniffer::catalog::{CatalogIndex, ScoreBreakdown, TitleMatch};
use retrosniffer::loader::load_catalog_index;
use retrosniffer::store::CatalogStore;
use retrosniffer::text::{normalize, token_set};

/// Where the titles are ranked from.
pub enum Source<'a> {
    File(&'a Path),
    Platform(&'a str),
}

#[derive(Serialize)]
pub(crate) struct TitleRow {
    rank: usize,
    title: String,
    score: f64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    breakdown: Option<ScoreBreakdown>,
}

pub fn rank(
    config: &Config,
    text: &str,
    source: Source<'_>,
    limit: usize,
    explain: bool,
    json: bool,
) -> Result<()> {
    let owned;
    let store;
    let index: &CatalogIndex = match source {
        Source::File(path) => {
            owned = load_catalog_index(path)?;
            &owned
        }
        Source::Platform(platform) => {
            // "ps2" and "PlayStation 2" should pick the same catalog.
            let table = super::alias_table(config, None)?;
            let canonical = table
                .resolve(platform, config.matching.threshold)
                .map(|m| m.platform)
                .unwrap_or_else(|| platform.to_string());
            store = CatalogStore::new(
                config.datasets_dir(),
                &config.datasets.catalogs,
                [canonical.as_str()],
            );
            store
                .index(&canonical)
                .with_context(|| format!("Failed to load catalog for {}", canonical))?
        }
    };

    let matches = index.top_matches(text, limit);
    let rows = title_rows(index, text, &matches, explain);
    print_rows(&rows, json)
}

pub(crate) fn title_rows(
    index: &CatalogIndex,
    text: &str,
    matches: &[TitleMatch],
    explain: bool,
) -> Vec<TitleRow> {
    let query = normalize(text);
    let tokens = token_set(&query);

    matches
        .iter()
        .enumerate()
        .map(|(i, m)| TitleRow {
            rank: i + 1,
            title: m.title.clone(),
            score: m.score,
            fields: index.entries()[m.position].raw_fields.clone(),
            breakdown: explain.then(|| index.score_breakdown(&query, &tokens, m.position)),
        })
        .collect()
}

pub(crate) fn print_rows(rows: &[TitleRow], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No matching title");
        return Ok(());
    }

    let explain = rows.iter().any(|r| r.breakdown.is_some());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    let mut header = vec!["#", "Title", "Score"];
    if explain {
        header.extend(["Overlap", "Whole", "Token set", "Bonus"]);
    }
    table.set_header(header);

    for row in rows {
        let mut cells = vec![
            row.rank.to_string(),
            row.title.clone(),
            format!("{:.2}", row.score),
        ];
        if let Some(b) = &row.breakdown {
            cells.extend([
                format!("{:.3}", b.overlap),
                format!("{:.3}", b.whole),
                format!("{:.3}", b.token_set),
                format!("{:.2}", b.bonus),
            ]);
        }
        table.add_row(cells);
    }

    println!("{table}");
    Ok(())
}
