mod cli;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cli::InputArgs;
use config::Config;

#[derive(Parser)]
#[command(name = "retrosniffer")]
#[command(about = "Identify game titles and platforms from OCR text of product photos")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the platform named in the text
    Platform {
        #[command(flatten)]
        input: InputArgs,
        /// Alias table (JSON) instead of the configured one
        #[arg(long)]
        aliases: Option<PathBuf>,
        /// Minimum fuzzy similarity (0-100)
        #[arg(long, value_parser = cli::parse_threshold)]
        threshold: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rank catalog titles against the text
    Title {
        #[command(flatten)]
        input: InputArgs,
        /// Catalog file (JSON array of {"Title": ...})
        #[arg(long, conflicts_with = "platform", required_unless_present = "platform")]
        catalog: Option<PathBuf>,
        /// Platform whose configured catalog to use
        #[arg(long)]
        platform: Option<String>,
        /// Number of titles to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Show the individual score signals
        #[arg(long)]
        explain: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve the platform, then rank titles from its catalog
    Identify {
        #[command(flatten)]
        input: InputArgs,
        /// Alias table (JSON) instead of the configured one
        #[arg(long)]
        aliases: Option<PathBuf>,
        /// Minimum fuzzy similarity for the platform (0-100)
        #[arg(long, value_parser = cli::parse_threshold)]
        threshold: Option<f64>,
        /// Number of titles to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Also rank cleaned readings of the text (lines, trimmed words)
        #[arg(long)]
        by_line: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the OCR lines that look like titles
    Candidates {
        #[command(flatten)]
        input: InputArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = Config::load()?;

    match cli.command {
        Commands::Platform {
            input,
            aliases,
            threshold,
            json,
        } => cli::platform::resolve(
            &config,
            &input.read()?,
            aliases.as_deref(),
            threshold.unwrap_or(config.matching.threshold),
            json,
        )?,
        Commands::Title {
            input,
            catalog,
            platform,
            limit,
            explain,
            json,
        } => {
            // clap guarantees exactly one of the two is present.
            let source = match catalog.as_deref() {
                Some(path) => cli::title::Source::File(path),
                None => cli::title::Source::Platform(platform.as_deref().unwrap_or_default()),
            };
            cli::title::rank(
                &config,
                &input.read()?,
                source,
                limit.unwrap_or(config.matching.limit),
                explain,
                json,
            )?
        }
        Commands::Identify {
            input,
            aliases,
            threshold,
            limit,
            by_line,
            json,
        } => cli::identify::run(
            &config,
            &input.read()?,
            cli::identify::Options {
                aliases: aliases.as_deref(),
                threshold: threshold.unwrap_or(config.matching.threshold),
                limit: limit.unwrap_or(config.matching.limit),
                by_line,
                json,
            },
        )?,
        Commands::Candidates { input, json } => cli::candidates::list(&input.read()?, json)?,
    }

    Ok(())
}
