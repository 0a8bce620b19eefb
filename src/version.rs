//! Version tag parsing and ordering

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use crate::checksum::Checksum;
use crate::error::{LineageError, Result};

/// A version tag with a leading `v<major>.<minor>.<patch>` component.
///
/// Trailing suffixes (pre-release, build metadata) are retained in the
/// original string but carry no weight: parsing ignores them and two
/// tags with equal numeric triples compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagVersion {
    /// The tag exactly as it appeared in the repository
    pub original: String,
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Digest of the tracked file at this tag, attached by deduplication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<Checksum>,
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^v(\d+)\.(\d+)\.(\d+)").expect("valid tag pattern"))
}

impl TagVersion {
    /// Parse a tag string like "v3.112.0" or "v3.112.0-beta.1".
    pub fn parse(raw: &str) -> Result<Self> {
        let captures = tag_pattern()
            .captures(raw)
            .ok_or_else(|| LineageError::InvalidVersion(raw.to_string()))?;

        let component = |i: usize| -> Result<u64> {
            captures[i]
                .parse()
                .map_err(|_| LineageError::InvalidVersion(raw.to_string()))
        };

        Ok(Self {
            original: raw.to_string(),
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
            digest: None,
        })
    }

    /// The tag exactly as listed by the repository
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Attach the content digest computed during deduplication
    pub fn with_digest(mut self, digest: Checksum) -> Self {
        self.digest = Some(digest);
        self
    }
}

impl fmt::Display for TagVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

impl PartialEq for TagVersion {
    fn eq(&self, other: &Self) -> bool {
        (self.major, self.minor, self.patch) == (other.major, other.minor, other.patch)
    }
}

impl Eq for TagVersion {}

impl PartialOrd for TagVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TagVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

/// Parse a raw tag list down to the sorted versions of one major line.
///
/// Malformed tags are skipped, not surfaced: repositories carry tags
/// like "nightly" or "docs-v2" that simply are not release versions.
pub fn select_versions<I, S>(tags: I, major: u64) -> Vec<TagVersion>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut versions: Vec<TagVersion> = tags
        .into_iter()
        .filter_map(|raw| match TagVersion::parse(raw.as_ref()) {
            Ok(version) => Some(version),
            Err(_) => {
                tracing::debug!(tag = raw.as_ref(), "skipping non-version tag");
                None
            }
        })
        .filter(|v| v.major == major)
        .collect();

    versions.sort();
    versions
}
