//! Revision deduplication
//!
//! Many tags of a release line carry an identical copy of the tracked
//! file, because most releases touch other code entirely.
//! Deduplication collapses the ordered tag stream onto the
//! minimal subsequence whose tracked-file content differs from all
//! predecessors, so schema generation runs once per distinct content
//! state.

use std::collections::HashSet;

use crate::checksum::Checksum;
use crate::error::{LineageError, Result};
use crate::version::TagVersion;

/// Content-at-version capability, implemented by the git collaborator
/// and by in-memory fakes in tests.
pub trait ContentSource {
    /// Raw bytes of the tracked file at this version.
    ///
    /// Fails with [`LineageError::ContentMissing`] when the file does
    /// not exist at that revision (it predates the file's introduction);
    /// any other error is a hard failure for that version alone.
    fn fetch(&self, version: &TagVersion) -> Result<Vec<u8>>;
}

/// Outcome of one deduplication pass
#[derive(Debug, Default)]
pub struct DedupReport {
    /// Distinct-content versions in ascending order, digests attached.
    /// The earliest version exhibiting a given content state is its
    /// representative.
    pub unique: Vec<TagVersion>,
    /// Versions dropped because their content was already represented
    pub duplicates: usize,
    /// Versions where the tracked file did not exist yet
    pub missing: usize,
    /// Versions whose fetch failed for an unexpected reason
    pub failures: Vec<(String, LineageError)>,
}

impl DedupReport {
    /// Number of versions that were considered at all
    pub fn total_seen(&self) -> usize {
        self.unique.len() + self.duplicates + self.missing + self.failures.len()
    }
}

/// Collapse a pre-sorted version stream to its distinct content states.
///
/// `versions` must already be filtered to one major line and sorted
/// ascending (see [`crate::version::select_versions`]); first-seen-wins
/// only picks the earliest representative under that precondition. A
/// single version's failure never aborts the rest of the stream.
pub fn dedup_revisions<S: ContentSource>(versions: Vec<TagVersion>, source: &S) -> DedupReport {
    let mut seen: HashSet<Checksum> = HashSet::new();
    let mut report = DedupReport::default();

    for version in versions {
        let bytes = match source.fetch(&version) {
            Ok(bytes) => bytes,
            Err(err) if err.is_content_missing() => {
                tracing::debug!(version = %version, "tracked file absent, skipping");
                report.missing += 1;
                continue;
            }
            Err(err) => {
                tracing::warn!(version = %version, error = %err, "content fetch failed");
                report.failures.push((version.as_str().to_string(), err));
                continue;
            }
        };

        let digest = Checksum::from_bytes(&bytes);
        if seen.insert(digest.clone()) {
            tracing::debug!(version = %version, digest = digest.short(), "new content state");
            report.unique.push(version.with_digest(digest));
        } else {
            tracing::debug!(version = %version, digest = digest.short(), "content already represented");
            report.duplicates += 1;
        }
    }

    report
}
