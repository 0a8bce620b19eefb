//! Schema Lineage
//!
//! Extracts one normalized JSON Schema document per historically
//! distinct revision of a data-type definition tracked in a git
//! repository. Tags are deduplicated by content hash of the tracked
//! file, so schema generation runs once per semantically distinct
//! version, not once per tag.
//!
//! ## Pipeline
//!
//! ```text
//! git tags ──► select ──► dedup ──► generate ──► flatten ──► store
//! v3.24.0     (major      (hash      (external    (root $ref   schemas/plan/v3.24.0/
//! v3.24.1      filter,     content,   program      inlining)     schema.json
//! v3.35.0      sort)       first      per unique                 metadata.json
//! ...                      wins)      version)
//! ```
//!
//! ## Features
//!
//! - **Content-hash deduplication**: re-tags and metadata-only releases
//!   collapse onto their earliest representative
//! - **Root reference flattening**: a root `$ref` into `$defs` is
//!   inlined, and the definition is dropped only when nothing else
//!   references it
//! - **Per-version failure isolation**: one bad version never aborts
//!   the rest of a run

pub mod checksum;
pub mod config;
pub mod dedup;
pub mod diff;
pub mod error;
pub mod flatten;
pub mod generate;
pub mod pipeline;
pub mod repo;
pub mod store;
pub mod version;

pub use checksum::Checksum;
pub use config::LineageConfig;
pub use dedup::{dedup_revisions, ContentSource, DedupReport};
pub use diff::{diff_schemas, SchemaDiff};
pub use error::{LineageError, Result};
pub use flatten::{flatten_root_ref, is_definition_referenced};
pub use generate::{CommandGenerator, SchemaGenerator};
pub use pipeline::{GenerationRun, RunReport};
pub use repo::{ensure_repository, GitSource};
pub use store::{RevisionMetadata, SchemaStore};
pub use version::{select_versions, TagVersion};
