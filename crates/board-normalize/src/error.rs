use std::path::PathBuf;
use thiserror::Error;

/// Conditions that abort board assembly. No partial document is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("no board outline found: draw the outline on Edge.Cuts before extracting")]
    MissingOutline,

    #[error("extra fields were requested but the field source {0} could not be read")]
    FieldSourceUnavailable(PathBuf),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractError {
    /// True for the typed assembly failures, as opposed to I/O or parse faults.
    pub fn is_hard_failure(&self) -> bool {
        matches!(self, ExtractError::Assembly(_))
    }
}
