pub mod candidates;
pub mod identify;
pub mod platform;
pub mod title;

use anyhow::{Context, Result};
use clap::Args;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::Config;
use retrosniffer::loader;
use retrosniffer::platform::{is_valid_threshold, AliasTable};

/// Where the OCR text comes from.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// OCR text; read from stdin when omitted or "-"
    pub text: Option<String>,
    /// Read the OCR text from a file
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
}

impl InputArgs {
    pub fn read(&self) -> Result<String> {
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input: {}", path.display()));
        }

        match self.text.as_deref() {
            Some(text) if text != "-" => Ok(text.to_string()),
            _ => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read text from stdin")?;
                Ok(buf)
            }
        }
    }
}

pub fn parse_threshold(value: &str) -> Result<f64, String> {
    let threshold: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !is_valid_threshold(threshold) {
        return Err(format!("threshold must be between 0 and 100, got {}", threshold));
    }
    Ok(threshold)
}

/// Alias table from `--aliases`, else the configured file, else the embedded one.
pub fn alias_table(config: &Config, path: Option<&Path>) -> Result<AliasTable> {
    let path = path.map(Path::to_path_buf).or_else(|| {
        config
            .datasets
            .aliases
            .as_ref()
            .map(|p| config.datasets_dir().join(p))
    });

    let table = match path {
        Some(path) => loader::load_alias_table(&path)?,
        None => loader::embedded_alias_table()?,
    };

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("80"), Ok(80.0));
        assert_eq!(parse_threshold("0"), Ok(0.0));
        assert_eq!(parse_threshold("100"), Ok(100.0));
        assert!(parse_threshold("101").is_err());
        assert!(parse_threshold("-1").is_err());
        assert!(parse_threshold("high").is_err());
    }

    #[test]
    fn test_input_args_prefers_text() {
        let args = InputArgs {
            text: Some("PS2 GOD OF WAR".to_string()),
            file: None,
        };
        assert_eq!(args.read().unwrap(), "PS2 GOD OF WAR");
    }

    #[test]
    fn test_input_args_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ocr.txt");
        std::fs::write(&path, "SOULCALIBUR III\nPlayStation 2\n").unwrap();

        let args = InputArgs {
            text: None,
            file: Some(path),
        };
        assert_eq!(args.read().unwrap(), "SOULCALIBUR III\nPlayStation 2\n");
    }

    #[test]
    fn test_alias_table_falls_back_to_embedded() {
        let table = alias_table(&Config::default(), None).unwrap();
        assert!(!table.is_empty());
    }

    #[test]
    fn test_alias_table_from_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("platform.json"),
            r#"[{"Platform": "Atari 2600", "Alias": ["Atari 2600", "VCS"]}]"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.datasets.dir = Some(dir.path().to_path_buf());
        config.datasets.aliases = Some(PathBuf::from("platform.json"));

        let table = alias_table(&config, None).unwrap();
        assert_eq!(table.platforms().collect::<Vec<_>>(), vec!["Atari 2600"]);
    }
}
