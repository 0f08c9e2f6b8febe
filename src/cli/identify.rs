use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use super::title::{print_rows, title_rows, TitleRow};
use crate::config::Config;
use retrosniffer::ocr::query_variations;
use retrosniffer::platform::PlatformMatch;
use retrosniffer::store::CatalogStore;

#[derive(Serialize)]
struct Identification {
    platform: Option<PlatformMatch>,
    matches: Vec<TitleRow>,
}

pub struct Options<'a> {
    pub aliases: Option<&'a Path>,
    pub threshold: f64,
    pub limit: usize,
    pub by_line: bool,
    pub json: bool,
}

/// Resolve the platform, then rank titles from that platform's catalog.
pub fn run(config: &Config, text: &str, opts: Options<'_>) -> Result<()> {
    let table = super::alias_table(config, opts.aliases)?;

    let Some(platform) = table.resolve(text, opts.threshold) else {
        if opts.json {
            let empty = Identification {
                platform: None,
                matches: Vec::new(),
            };
            println!("{}", serde_json::to_string_pretty(&empty)?);
        } else {
            println!("No platform recognized (threshold {})", opts.threshold);
        }
        return Ok(());
    };

    tracing::info!(platform = %platform.platform, alias = %platform.alias, "resolved platform");

    let store = CatalogStore::new(
        config.datasets_dir(),
        &config.datasets.catalogs,
        table.platforms(),
    );
    let index = store
        .index(&platform.platform)
        .with_context(|| format!("Failed to load catalog for {}", platform.platform))?;

    let matches = if opts.by_line {
        let variations = query_variations(text);
        tracing::debug!(?variations, "ranking cleaned readings");
        let queries = std::iter::once(text).chain(variations.iter().map(String::as_str));
        index.top_matches_across(queries, opts.limit)
    } else {
        index.top_matches(text, opts.limit)
    };

    let rows = title_rows(index, text, &matches, false);

    if opts.json {
        let result = Identification {
            platform: Some(platform),
            matches: rows,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Platform: {} (matched '{}')", platform.platform, platform.alias);
    print_rows(&rows, false)
}
