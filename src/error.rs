//! Error types for schema lineage extraction

use thiserror::Error;

/// Result type for lineage operations
pub type Result<T> = std::result::Result<T, LineageError>;

/// Lineage extraction errors
#[derive(Error, Debug)]
pub enum LineageError {
    #[error("Invalid version tag: {0}")]
    InvalidVersion(String),

    #[error("Tracked file absent at {version}")]
    ContentMissing { version: String },

    #[error("Schema generation failed for {version}: {message}")]
    Generation { version: String, message: String },

    #[error("Structural inconsistency: {0}")]
    StructuralInconsistency(String),

    #[error("Invalid schema document: {0}")]
    InvalidSchema(String),

    #[error("No stored schema for version {version}")]
    NotFound { version: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl LineageError {
    /// True for the expected "file predates its introduction" case,
    /// which deduplication skips silently.
    pub fn is_content_missing(&self) -> bool {
        matches!(self, LineageError::ContentMissing { .. })
    }
}
