//! Generation pipeline
//!
//! Drives one end-to-end run: tag discovery → revision deduplication →
//! external generation → root-reference flattening → persistence. Every
//! per-version failure is isolated; one bad version never stops the
//! rest of the stream.

use serde_json::Value;

use crate::dedup::{dedup_revisions, ContentSource, DedupReport};
use crate::error::{LineageError, Result};
use crate::flatten::flatten_root_ref;
use crate::generate::SchemaGenerator;
use crate::store::SchemaStore;
use crate::version::{select_versions, TagVersion};

/// Aggregate outcome of one run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Distinct content revisions found
    pub unique: usize,
    /// Tags dropped as re-tags of an already-represented content state
    pub duplicates: usize,
    /// Tags predating the tracked file
    pub missing: usize,
    /// Revisions whose schema was generated and stored
    pub generated: usize,
    /// Per-version failures as (tag, error) pairs
    pub failed: Vec<(String, String)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One configured end-to-end run over a tag stream
pub struct GenerationRun<'a, S, G> {
    source: &'a S,
    generator: &'a G,
    store: &'a SchemaStore,
    major: u64,
    validate: bool,
}

impl<'a, S: ContentSource, G: SchemaGenerator> GenerationRun<'a, S, G> {
    pub fn new(source: &'a S, generator: &'a G, store: &'a SchemaStore, major: u64) -> Self {
        Self {
            source,
            generator,
            store,
            major,
            validate: true,
        }
    }

    /// Toggle the compile check on flattened output (on by default)
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Deduplicate the tag stream without generating anything
    pub fn unique_versions(&self, tags: Vec<String>) -> DedupReport {
        let versions = select_versions(tags, self.major);
        dedup_revisions(versions, self.source)
    }

    /// Run the full pipeline over the given tags
    pub fn execute(&self, tags: Vec<String>) -> RunReport {
        let dedup = self.unique_versions(tags);

        let mut report = RunReport {
            unique: dedup.unique.len(),
            duplicates: dedup.duplicates,
            missing: dedup.missing,
            generated: 0,
            failed: dedup
                .failures
                .iter()
                .map(|(tag, err)| (tag.clone(), err.to_string()))
                .collect(),
        };

        tracing::info!(
            unique = report.unique,
            duplicates = report.duplicates,
            missing = report.missing,
            "deduplicated tag stream"
        );

        for version in dedup.unique {
            match self.process_version(&version) {
                Ok(()) => {
                    report.generated += 1;
                    tracing::info!(version = %version, "schema stored");
                }
                Err(err) => {
                    tracing::warn!(version = %version, error = %err, "version failed");
                    report.failed.push((version.as_str().to_string(), err.to_string()));
                }
            }
        }

        report
    }

    fn process_version(&self, version: &TagVersion) -> Result<()> {
        let raw = self.generator.generate(version)?;
        let document: Value = serde_json::from_slice(&raw)?;
        let flattened = flatten_root_ref(document)?;

        if self.validate {
            compile_check(&flattened)?;
        }

        self.store.write(version, &flattened)?;
        Ok(())
    }
}

/// Reject documents the JSON Schema compiler cannot make sense of
fn compile_check(document: &Value) -> Result<()> {
    jsonschema::JSONSchema::compile(document)
        .map(|_| ())
        .map_err(|err| LineageError::InvalidSchema(err.to_string()))
}
