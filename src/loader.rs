//! Catalog and alias table loading from JSON datasets.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::{CatalogEntry, CatalogIndex};
use crate::platform::{AliasTable, PlatformAliases};

const EMBEDDED_PLATFORMS: &str = include_str!("../data/platforms.json");
const EMBEDDED_ORIGIN: &str = "<embedded platforms.json>";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse dataset {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("dataset {} is not a JSON array", path.display())]
    NotAnArray { path: PathBuf },
    #[error("no catalog configured for platform '{platform}'")]
    NoCatalog { platform: String },
}

#[derive(Debug, Deserialize)]
struct TitleRecord {
    #[serde(rename = "Title")]
    title: String,
    #[serde(flatten)]
    rest: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct AliasRecord {
    #[serde(rename = "Platform", default)]
    platform: Option<String>,
    #[serde(rename = "Alias")]
    aliases: Vec<String>,
}

pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>, LoadError> {
    parse_catalog(&read_dataset(path)?, path)
}

pub fn load_catalog_index(path: &Path) -> Result<CatalogIndex, LoadError> {
    Ok(CatalogIndex::build(load_catalog(path)?))
}

pub fn load_alias_table(path: &Path) -> Result<AliasTable, LoadError> {
    parse_alias_table(&read_dataset(path)?, path)
}

/// Alias table compiled into the binary.
pub fn embedded_alias_table() -> Result<AliasTable, LoadError> {
    parse_alias_table(EMBEDDED_PLATFORMS, Path::new(EMBEDDED_ORIGIN))
}

/// Parse a catalog document. Records without a string `Title` are skipped.
pub fn parse_catalog(json: &str, origin: &Path) -> Result<Vec<CatalogEntry>, LoadError> {
    let records = parse_array(json, origin)?;
    let total = records.len();

    let entries: Vec<CatalogEntry> = records
        .into_iter()
        .filter_map(|value| serde_json::from_value::<TitleRecord>(value).ok())
        .map(|record| CatalogEntry {
            title: record.title,
            raw_fields: record
                .rest
                .into_iter()
                .filter_map(|(key, value)| field_text(value).map(|text| (key, text)))
                .collect(),
        })
        .collect();

    report_skipped(origin, "catalog", total, entries.len());
    Ok(entries)
}

/// Parse an alias document. Records without a non-empty `Alias` list are
/// skipped; a missing `Platform` falls back to the first alias.
pub fn parse_alias_table(json: &str, origin: &Path) -> Result<AliasTable, LoadError> {
    let records = parse_array(json, origin)?;
    let total = records.len();

    let platforms: Vec<PlatformAliases> = records
        .into_iter()
        .filter_map(|value| serde_json::from_value::<AliasRecord>(value).ok())
        .filter_map(|record| {
            let platform = match record.platform {
                Some(name) => name,
                None => record.aliases.first()?.clone(),
            };
            if record.aliases.is_empty() {
                return None;
            }
            Some(PlatformAliases {
                platform,
                aliases: record.aliases,
            })
        })
        .collect();

    report_skipped(origin, "alias", total, platforms.len());
    Ok(AliasTable::new(platforms))
}

fn read_dataset(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_array(json: &str, origin: &Path) -> Result<Vec<Value>, LoadError> {
    let document: Value = serde_json::from_str(json).map_err(|source| LoadError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;

    match document {
        Value::Array(records) => Ok(records),
        _ => Err(LoadError::NotAnArray {
            path: origin.to_path_buf(),
        }),
    }
}

fn field_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn report_skipped(origin: &Path, kind: &str, total: usize, kept: usize) {
    let skipped = total - kept;
    if skipped > 0 {
        tracing::warn!(
            dataset = %origin.display(),
            skipped,
            kept,
            "skipped malformed {} records",
            kind
        );
    } else {
        tracing::debug!(dataset = %origin.display(), kept, "loaded {} records", kind);
    }
}
