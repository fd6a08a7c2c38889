//! CLI command implementations.

pub(crate) mod parse;
pub(crate) mod render;
pub(crate) mod roundtrip;

use std::path::Path;

use clap::ValueEnum;
use colmd_markdown::RegionTracking;

use crate::output::Output;

pub(crate) use parse::ParseArgs;
pub(crate) use render::RenderArgs;
pub(crate) use roundtrip::RoundtripArgs;

/// `--region-tracking` values.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum TrackingArg {
    Stack,
    SingleSlot,
}

impl From<TrackingArg> for RegionTracking {
    fn from(arg: TrackingArg) -> Self {
        match arg {
            TrackingArg::Stack => Self::Stack,
            TrackingArg::SingleSlot => Self::SingleSlot,
        }
    }
}

/// Write `content` to `path`, or to stdout when no path is given.
fn write_result(output: &Output, path: Option<&Path>, content: &str) -> std::io::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)?;
            output.success(&format!("Wrote {}", path.display()));
            Ok(())
        }
        None => output.document(content),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_write_result_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.md");

        write_result(&Output::new(), Some(&path), "# Title\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Title\n");
    }

    #[test]
    fn test_write_result_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.md");

        assert!(write_result(&Output::new(), Some(&path), "x").is_err());
    }
}
