//! `colmd parse` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use colmd_blocks::{IdStrategy, snapshot};
use colmd_config::{CliSettings, Config};
use colmd_markdown::Diagnostic;
use serde_json::Value;

use super::{TrackingArg, write_result};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the parse command.
#[derive(Args)]
pub(crate) struct ParseArgs {
    /// Path to the markdown file.
    input: PathBuf,

    /// Write the snapshot to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Split into notes on `<!-- note:split -->` markers.
    #[arg(long)]
    split: bool,

    /// Fail when any warning is reported.
    #[arg(long)]
    strict: bool,

    /// How layout regions nest (overrides config).
    #[arg(long, value_enum)]
    region_tracking: Option<TrackingArg>,

    /// Use `block-N` ids instead of UUIDs.
    #[arg(long)]
    sequential_ids: bool,
}

impl ParseArgs {
    /// Execute the parse command.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read, the output cannot be
    /// written, or `--strict` is set and warnings were reported.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            region_tracking: self.region_tracking.map(Into::into),
            ids: self.sequential_ids.then_some(IdStrategy::Sequential),
            split: self.split.then_some(true),
            ..Default::default()
        };
        let config = Config::load(config_path, Some(&cli_settings))?;

        let markdown = std::fs::read_to_string(&self.input)?;
        output.info(&format!("Converting {}...", self.input.display()));

        let (snapshot, diagnostics) = parse_markdown(&config, &markdown);
        output.diagnostics(&diagnostics);

        let json = serde_json::to_string_pretty(&snapshot)?;
        write_result(&output, self.output.as_deref(), &json)?;

        check_strict(self.strict, &diagnostics)
    }
}

/// Convert markdown to a snapshot value: one note, or an array with `split`.
pub(crate) fn parse_markdown(config: &Config, markdown: &str) -> (Value, Vec<Diagnostic>) {
    let converter = config.converter();
    if config.note.split {
        let conversion = converter.convert_split(markdown);
        (
            snapshot::to_snapshots(&conversion.notes),
            conversion.diagnostics,
        )
    } else {
        let conversion = converter.convert(markdown);
        (
            snapshot::to_snapshot(&conversion.root),
            conversion.diagnostics,
        )
    }
}

/// Turn warnings into an error when running in strict mode.
pub(crate) fn check_strict(strict: bool, diagnostics: &[Diagnostic]) -> Result<(), CliError> {
    let warnings = diagnostics
        .iter()
        .filter(|d| d.severity == colmd_markdown::Severity::Warning)
        .count();
    if strict && warnings > 0 {
        return Err(CliError::Strict(warnings));
    }
    Ok(())
}
