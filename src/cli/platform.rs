use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use retrosniffer::platform::MatchKind;

pub fn resolve(
    config: &Config,
    text: &str,
    aliases: Option<&Path>,
    threshold: f64,
    json: bool,
) -> Result<()> {
    let table = super::alias_table(config, aliases)?;
    let found = table.resolve(text, threshold);

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    match found {
        Some(m) => {
            let how = match m.kind {
                MatchKind::Substring => "exact alias".to_string(),
                MatchKind::Fuzzy => format!("fuzzy, {:.1}%", m.score),
            };
            println!("{}", m.platform);
            println!("  matched '{}' ({})", m.alias, how);
        }
        None => println!("No platform recognized (threshold {})", threshold),
    }

    Ok(())
}
