//! CLI error types.

use colmd_blocks::SnapshotError;
use colmd_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Snapshot(#[from] SnapshotError),

    #[error("{0} warning(s) reported in strict mode")]
    Strict(usize),

    #[error("{0}")]
    Validation(String),
}
