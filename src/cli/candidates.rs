use anyhow::Result;
use serde::Serialize;

use retrosniffer::ocr::{candidate_lines, is_plausible_title};
use retrosniffer::text::normalize;

#[derive(Serialize)]
struct Candidate {
    line: String,
    normalized: String,
    plausible: bool,
}

pub fn list(text: &str, json: bool) -> Result<()> {
    let candidates: Vec<Candidate> = candidate_lines(text)
        .into_iter()
        .map(|line| Candidate {
            line: line.to_string(),
            normalized: normalize(line),
            plausible: is_plausible_title(line),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
        return Ok(());
    }

    if candidates.is_empty() {
        println!("No candidate lines");
        return Ok(());
    }

    for c in candidates {
        let marker = if c.plausible { "+" } else { "-" };
        println!("{} {}", marker, c.normalized);
    }

    Ok(())
}
