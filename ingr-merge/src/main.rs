//! ingr-merge - Ingredient parse reconciliation
//!
//! Reads one ingredient description per line (from FILE or stdin), runs both
//! parsers, and prints the merged records as a JSON array on stdout. Logs go
//! to stderr.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ingr_common::config::{ConfigResolver, TomlConfig};
use ingr_merge::{CommandGrammarParser, CommandStatisticalParser, ReconcileError, Reconciler};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for ingr-merge
#[derive(Parser, Debug)]
#[command(name = "ingr-merge")]
#[command(about = "Merge statistical and grammar ingredient parses into canonical records")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ", ", env!("BUILD_PROFILE"), ")"))]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "INGR_CONFIG")]
    config: Option<PathBuf>,

    /// Report unit failures per line instead of aborting the batch
    #[arg(short, long)]
    keep_going: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Input file, one description per line (stdin if omitted)
    file: Option<PathBuf>,
}

fn init_tracing(config: &TomlConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn read_descriptions(file: Option<&PathBuf>) -> Result<Vec<String>> {
    let reader: Box<dyn BufRead> = match file {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut descriptions = Vec::new();
    for line in reader.lines() {
        let line = line.context("Failed to read input")?;
        if !line.trim().is_empty() {
            descriptions.push(line);
        }
    }
    Ok(descriptions)
}

fn build_reconciler(config: &TomlConfig) -> Reconciler {
    Reconciler::new(
        Box::new(CommandStatisticalParser::from_config(&config.statistical)),
        Box::new(CommandGrammarParser::from_config(&config.grammar)),
    )
    .with_normalizer_tag(config.normalizer.tag.clone())
}

fn run(args: &Args, reconciler: &Reconciler, descriptions: &[String]) -> Result<Vec<Value>> {
    if !args.keep_going {
        let records = reconciler
            .reconcile_all(descriptions)
            .context("Reconciliation failed")?;
        return records
            .iter()
            .map(|record| serde_json::to_value(record).context("Failed to serialize record"))
            .collect();
    }

    let results = reconciler
        .reconcile_each(descriptions)
        .context("Reconciliation failed")?;
    results
        .into_iter()
        .map(|result| match result {
            Ok(record) => serde_json::to_value(&record).context("Failed to serialize record"),
            Err(ReconcileError::NoBaseUnit {
                description,
                source,
            }) => {
                warn!(%description, error = %source, "Skipping record");
                Ok(json!({ "description": description, "error": source.to_string() }))
            }
            Err(other) => Err(other).context("Reconciliation failed"),
        })
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigResolver::new()
        .load(args.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&config);
    debug!(
        "ingr-merge {} ({}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE")
    );

    let descriptions = read_descriptions(args.file.as_ref())?;
    info!("Read {} descriptions", descriptions.len());

    let reconciler = build_reconciler(&config);
    let output = run(&args, &reconciler, &descriptions)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.pretty {
        serde_json::to_writer_pretty(&mut out, &output)?;
    } else {
        serde_json::to_writer(&mut out, &output)?;
    }
    writeln!(out)?;

    info!("Wrote {} records", output.len());
    Ok(())
}
