//! Error types for the CLI.

use std::path::PathBuf;

use crm_core::CoreError;

/// CLI errors.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot format {value:?} as {kind}")]
    Unformattable { kind: &'static str, value: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}
