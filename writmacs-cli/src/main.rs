//! # writmacs CLI
//!
//! Reads macro source from stdin and writes the expanded document to stdout.

mod commands;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "writmacs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output target: html, md or txt (unknown names use the configured default)
    target: Option<String>,

    /// Path to configuration file
    #[arg(long, default_value = "writmacs.yml", env = "WRITMACS_CONFIG")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print extracted metadata as JSON on stderr
    #[arg(long)]
    metadata: bool,

    /// Print the node tree instead of expanding
    #[arg(long)]
    tree: bool,

    /// Seed for the randomized macros
    #[arg(long)]
    seed: Option<u64>,

    /// Fail on unknown macros and snippets
    #[arg(long)]
    strict: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with the document
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::WARN.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let opts = commands::ExpandOptions {
        target: cli.target,
        metadata: cli.metadata,
        tree: cli.tree,
        seed: cli.seed,
        strict: cli.strict,
    };
    commands::expand_stdin(&cli.config, opts)
}
