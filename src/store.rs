//! Persistence of generated schema artifacts
//!
//! One directory per stored revision:
//!
//! ```text
//! <root>/<name>/
//! ├── v3.24.0/
//! │   ├── schema.json
//! │   └── metadata.json
//! ├── v3.35.0/
//! └── ...
//! ```
//!
//! The store holds derived output; regenerating a version overwrites
//! its artifacts. The git history remains the source of truth.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;
use crate::error::{LineageError, Result};
use crate::version::TagVersion;

/// Metadata sidecar written next to each schema document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionMetadata {
    /// Tag this revision represents
    pub version: String,
    /// Digest of the tracked file at that tag
    pub content_hash: Checksum,
    /// When the artifact was written
    pub generated_at: DateTime<Utc>,
}

/// Filesystem store for per-revision schema documents
pub struct SchemaStore {
    root: PathBuf,
    name: String,
}

impl SchemaStore {
    /// Open the store, creating its directory tree if needed
    pub fn open(root: impl AsRef<Path>, name: impl Into<String>) -> Result<Self> {
        let store = Self {
            root: root.as_ref().to_path_buf(),
            name: name.into(),
        };
        fs::create_dir_all(store.schema_dir())?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn schema_dir(&self) -> PathBuf {
        self.root.join(&self.name)
    }

    fn version_dir(&self, tag: &str) -> PathBuf {
        self.schema_dir().join(tag)
    }

    /// Write a revision's schema document and metadata sidecar.
    ///
    /// The version must carry its content digest (attached during
    /// deduplication). Existing artifacts for the tag are overwritten.
    pub fn write(&self, version: &TagVersion, schema: &serde_json::Value) -> Result<PathBuf> {
        let digest = version.digest.as_ref().ok_or_else(|| {
            LineageError::InvalidVersion(format!("{version} has no content digest"))
        })?;

        let dir = self.version_dir(version.as_str());
        fs::create_dir_all(&dir)?;

        let schema_path = dir.join("schema.json");
        let mut content = serde_json::to_string_pretty(schema)?;
        content.push('\n');
        fs::write(&schema_path, content)?;

        let metadata = RevisionMetadata {
            version: version.as_str().to_string(),
            content_hash: digest.clone(),
            generated_at: Utc::now(),
        };
        let metadata_content = serde_json::to_string_pretty(&metadata)?;
        fs::write(dir.join("metadata.json"), metadata_content)?;

        Ok(schema_path)
    }

    /// Load a stored schema document by tag
    pub fn load_schema(&self, tag: &str) -> Result<serde_json::Value> {
        let path = self.version_dir(tag).join("schema.json");
        if !path.exists() {
            return Err(LineageError::NotFound {
                version: tag.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load a stored revision's metadata by tag
    pub fn load_metadata(&self, tag: &str) -> Result<RevisionMetadata> {
        let path = self.version_dir(tag).join("metadata.json");
        if !path.exists() {
            return Err(LineageError::NotFound {
                version: tag.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// All stored versions, ascending
    pub fn versions(&self) -> Result<Vec<TagVersion>> {
        let dir = self.schema_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name();
            if let Ok(version) = TagVersion::parse(&name.to_string_lossy()) {
                versions.push(version);
            }
        }

        versions.sort();
        Ok(versions)
    }
}
