//! `colmd roundtrip` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use colmd_blocks::BlockNode;
use colmd_config::Config;
use colmd_markdown::MarkdownRenderer;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the roundtrip command.
#[derive(Args)]
pub(crate) struct RoundtripArgs {
    /// Path to the markdown file.
    input: PathBuf,
}

/// Notes and markdown produced by one round trip.
///
/// Without note splitting each side holds a single note.
pub(crate) struct RoundtripReport {
    pub(crate) rendered: String,
    pub(crate) first: Vec<BlockNode>,
    pub(crate) second: Vec<BlockNode>,
}

impl RoundtripReport {
    pub(crate) fn is_stable(&self) -> bool {
        self.first.len() == self.second.len()
            && self
                .first
                .iter()
                .zip(&self.second)
                .all(|(a, b)| a.same_structure(b))
    }
}

impl RoundtripArgs {
    /// Execute the roundtrip command.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or the structure changed.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(config_path, None)?;

        let markdown = std::fs::read_to_string(&self.input)?;
        let report = roundtrip(&config, &markdown);
        output.document(&report.rendered)?;

        if report.is_stable() {
            output.success("Structure preserved");
            Ok(())
        } else {
            Err(CliError::Validation(format!(
                "structure of {} changed after render",
                self.input.display()
            )))
        }
    }
}

/// Parse, render and parse again.
///
/// With `note.split` set the document is split into notes and the note
/// settings are written back into the split markers.
pub(crate) fn roundtrip(config: &Config, markdown: &str) -> RoundtripReport {
    let converter = config.converter();
    if config.note.split {
        let first = converter.convert_split(markdown).notes;
        let rendered = MarkdownRenderer::new()
            .with_note_settings()
            .render_notes(&first);
        let second = converter.convert_split(&rendered).notes;
        return RoundtripReport {
            rendered,
            first,
            second,
        };
    }

    let first = converter.convert(markdown).root;
    let rendered = MarkdownRenderer::new().render(&first);
    let second = converter.convert(&rendered).root;
    RoundtripReport {
        rendered,
        first: vec![first],
        second: vec![second],
    }
}
