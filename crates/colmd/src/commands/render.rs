//! `colmd render` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use colmd_blocks::{Decoded, snapshot};
use colmd_markdown::MarkdownRenderer;
use serde_json::Value;

use super::write_result;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Path to the JSON snapshot (a note or an array of notes).
    input: PathBuf,

    /// Write the markdown to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write note titles and backgrounds into split markers.
    #[arg(long)]
    note_settings: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be read or decoded.
    pub(crate) fn execute(self, _config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();

        let content = std::fs::read_to_string(&self.input)?;
        let value: Value = serde_json::from_str(&content)?;

        let mut renderer = MarkdownRenderer::new();
        if self.note_settings {
            renderer = renderer.with_note_settings();
        }
        let markdown = render_snapshot(&renderer, value)?;
        for warning in &markdown.warnings {
            output.warning(warning);
        }

        write_result(&output, self.output.as_deref(), &markdown.value)?;
        Ok(())
    }
}

/// Render a snapshot holding one note or an array of notes.
///
/// Blocks the decoder could only partly read are rendered anyway and
/// reported in the returned warnings.
pub(crate) fn render_snapshot(
    renderer: &MarkdownRenderer,
    value: Value,
) -> Result<Decoded<String>, CliError> {
    if value.is_array() {
        let notes = snapshot::from_snapshots(value)?;
        tracing::info!(notes = notes.value.len(), "Rendering notes");
        Ok(Decoded {
            value: renderer.render_notes(&notes.value),
            warnings: notes.warnings,
        })
    } else {
        let root = snapshot::from_snapshot(value)?;
        Ok(Decoded {
            value: renderer.render(&root.value),
            warnings: root.warnings,
        })
    }
}
