//! colmd CLI - multi-column markdown converter.
//!
//! Provides commands for:
//! - `parse`: Convert markdown to a JSON block snapshot
//! - `render`: Convert a JSON block snapshot back to markdown
//! - `roundtrip`: Check that markdown survives parse, render, parse

mod commands;
mod error;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ParseArgs, RenderArgs, RoundtripArgs};
use output::Output;

/// colmd - Markdown with multi-column layout directives.
#[derive(Parser)]
#[command(name = "colmd", version, about)]
struct Cli {
    /// Path to configuration file (default: auto-discover colmd.toml).
    #[arg(short, long, global = true, env = "COLMD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output (conversion logs and diagnostics).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert markdown to a JSON block snapshot.
    Parse(ParseArgs),
    /// Convert a JSON block snapshot to markdown.
    Render(RenderArgs),
    /// Parse, render and parse again, comparing both trees.
    Roundtrip(RoundtripArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Parse(args) => args.execute(config),
        Commands::Render(args) => args.execute(config),
        Commands::Roundtrip(args) => args.execute(config),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
