//! Textual diffing between stored schema revisions

use similar::{ChangeTag, TextDiff};

use crate::error::Result;

/// Line-level difference between two revisions' schema documents
#[derive(Debug)]
pub struct SchemaDiff {
    pub added: usize,
    pub removed: usize,
    /// Unified-diff rendering with the revision tags as headers
    pub unified: String,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Diff two schema documents, labelled by their revision tags.
pub fn diff_schemas(
    old_tag: &str,
    old: &serde_json::Value,
    new_tag: &str,
    new: &serde_json::Value,
) -> Result<SchemaDiff> {
    let old_text = serde_json::to_string_pretty(old)?;
    let new_text = serde_json::to_string_pretty(new)?;

    let diff = TextDiff::from_lines(&old_text, &new_text);

    let mut added = 0;
    let mut removed = 0;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => removed += 1,
            ChangeTag::Equal => {}
        }
    }

    let unified = diff
        .unified_diff()
        .context_radius(3)
        .header(old_tag, new_tag)
        .to_string();

    Ok(SchemaDiff {
        added,
        removed,
        unified,
    })
}
