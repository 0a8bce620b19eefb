//! End-to-end pipeline tests
//!
//! Runs the full dedup → generate → flatten → store flow against
//! in-memory collaborators; no network, subprocesses, or real clones.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Value};
use tempfile::tempdir;

use schema_lineage::{
    Checksum, ContentSource, GenerationRun, LineageError, Result, SchemaGenerator, SchemaStore,
    TagVersion,
};

/// Tag-addressed file contents, standing in for the git collaborator
#[derive(Default)]
struct FakeSource {
    contents: HashMap<String, Vec<u8>>,
}

impl FakeSource {
    fn with(mut self, tag: &str, content: &[u8]) -> Self {
        self.contents.insert(tag.to_string(), content.to_vec());
        self
    }
}

impl ContentSource for FakeSource {
    fn fetch(&self, version: &TagVersion) -> Result<Vec<u8>> {
        self.contents
            .get(version.as_str())
            .cloned()
            .ok_or_else(|| LineageError::ContentMissing {
                version: version.as_str().to_string(),
            })
    }
}

/// Canned schema documents per tag, standing in for the external generator
#[derive(Default)]
struct FakeGenerator {
    documents: HashMap<String, Value>,
    failing: HashSet<String>,
}

impl FakeGenerator {
    fn with(mut self, tag: &str, document: Value) -> Self {
        self.documents.insert(tag.to_string(), document);
        self
    }

    fn failing_at(mut self, tag: &str) -> Self {
        self.failing.insert(tag.to_string());
        self
    }
}

impl SchemaGenerator for FakeGenerator {
    fn generate(&self, version: &TagVersion) -> Result<Vec<u8>> {
        if self.failing.contains(version.as_str()) {
            return Err(LineageError::Generation {
                version: version.as_str().to_string(),
                message: "simulated toolchain failure".to_string(),
            });
        }
        let document = self
            .documents
            .get(version.as_str())
            .unwrap_or_else(|| panic!("no canned document for {version}"));
        Ok(serde_json::to_vec(document).expect("canned document serializes"))
    }
}

/// The usual reflected shape: root $ref into $defs, nested refs inside
fn reflected_document(title: &str) -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": title,
        "$ref": "#/$defs/Plan",
        "$defs": {
            "Plan": {
                "type": "object",
                "properties": {
                    "resources": {
                        "type": "array",
                        "items": { "$ref": "#/$defs/Resource" }
                    }
                }
            },
            "Resource": {
                "type": "object",
                "properties": { "urn": { "type": "string" } }
            }
        }
    })
}

#[test]
fn end_to_end_generates_one_schema_per_content_state() {
    let source = FakeSource::default()
        .with("v3.100.0", b"X")
        .with("v3.101.0", b"X")
        .with("v3.102.0", b"Y");
    let generator = FakeGenerator::default()
        .with("v3.100.0", reflected_document("first shape"))
        .with("v3.102.0", reflected_document("second shape"));

    let dir = tempdir().unwrap();
    let store = SchemaStore::open(dir.path(), "plan").unwrap();

    let run = GenerationRun::new(&source, &generator, &store, 3);
    let report = run.execute(vec![
        "v3.100.0".to_string(),
        "v3.101.0".to_string(),
        "v3.102.0".to_string(),
    ]);

    assert_eq!(report.unique, 2);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.generated, 2);
    assert!(report.is_success());

    // v3.101.0 was a re-tag of v3.100.0's content and produced nothing.
    let stored: Vec<String> = store
        .versions()
        .unwrap()
        .iter()
        .map(|v| v.as_str().to_string())
        .collect();
    assert_eq!(stored, ["v3.100.0", "v3.102.0"]);

    // Metadata records the tracked-file digest, not the schema digest.
    let metadata = store.load_metadata("v3.100.0").unwrap();
    assert_eq!(metadata.content_hash, Checksum::from_bytes(b"X"));
    let metadata = store.load_metadata("v3.102.0").unwrap();
    assert_eq!(metadata.content_hash, Checksum::from_bytes(b"Y"));
}

#[test]
fn end_to_end_flattens_the_root_reference() {
    let source = FakeSource::default().with("v3.1.0", b"content");
    let generator = FakeGenerator::default().with("v3.1.0", reflected_document("shape"));

    let dir = tempdir().unwrap();
    let store = SchemaStore::open(dir.path(), "plan").unwrap();

    let report =
        GenerationRun::new(&source, &generator, &store, 3).execute(vec!["v3.1.0".to_string()]);
    assert!(report.is_success());

    let schema = store.load_schema("v3.1.0").unwrap();
    assert!(schema.get("$ref").is_none());
    assert_eq!(schema["type"], "object");
    assert_eq!(
        schema["properties"]["resources"]["items"]["$ref"],
        "#/$defs/Resource"
    );

    let defs = schema["$defs"].as_object().unwrap();
    assert!(!defs.contains_key("Plan"));
    assert!(defs.contains_key("Resource"));
}

#[test]
fn generator_failure_is_isolated_per_version() {
    let source = FakeSource::default()
        .with("v3.1.0", b"A")
        .with("v3.2.0", b"B")
        .with("v3.3.0", b"C");
    let generator = FakeGenerator::default()
        .with("v3.1.0", reflected_document("a"))
        .failing_at("v3.2.0")
        .with("v3.3.0", reflected_document("c"));

    let dir = tempdir().unwrap();
    let store = SchemaStore::open(dir.path(), "plan").unwrap();

    let report = GenerationRun::new(&source, &generator, &store, 3).execute(vec![
        "v3.1.0".to_string(),
        "v3.2.0".to_string(),
        "v3.3.0".to_string(),
    ]);

    assert_eq!(report.generated, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "v3.2.0");

    // The versions around the failure were stored anyway.
    assert!(store.load_schema("v3.1.0").is_ok());
    assert!(store.load_schema("v3.2.0").is_err());
    assert!(store.load_schema("v3.3.0").is_ok());
}

#[test]
fn malformed_generator_output_is_isolated_per_version() {
    let source = FakeSource::default()
        .with("v3.1.0", b"A")
        .with("v3.2.0", b"B");
    // v3.2.0's document points at a definition that does not exist.
    let generator = FakeGenerator::default()
        .with("v3.1.0", reflected_document("good"))
        .with(
            "v3.2.0",
            json!({
                "$ref": "#/$defs/Missing",
                "$defs": { "Present": { "type": "object" } }
            }),
        );

    let dir = tempdir().unwrap();
    let store = SchemaStore::open(dir.path(), "plan").unwrap();

    let report = GenerationRun::new(&source, &generator, &store, 3)
        .execute(vec!["v3.1.0".to_string(), "v3.2.0".to_string()]);

    assert_eq!(report.generated, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "v3.2.0");
    assert!(store.load_schema("v3.1.0").is_ok());
}

#[test]
fn documents_without_a_root_ref_pass_through() {
    let source = FakeSource::default().with("v3.1.0", b"A");
    let plain = json!({
        "type": "object",
        "properties": { "name": { "type": "string" } }
    });
    let generator = FakeGenerator::default().with("v3.1.0", plain.clone());

    let dir = tempdir().unwrap();
    let store = SchemaStore::open(dir.path(), "plan").unwrap();

    let report =
        GenerationRun::new(&source, &generator, &store, 3).execute(vec!["v3.1.0".to_string()]);
    assert!(report.is_success());
    assert_eq!(store.load_schema("v3.1.0").unwrap(), plain);
}

#[test]
fn tags_outside_the_major_line_are_ignored() {
    let source = FakeSource::default()
        .with("v2.9.0", b"old line")
        .with("v3.1.0", b"current line");
    let generator = FakeGenerator::default().with("v3.1.0", reflected_document("shape"));

    let dir = tempdir().unwrap();
    let store = SchemaStore::open(dir.path(), "plan").unwrap();

    let report = GenerationRun::new(&source, &generator, &store, 3)
        .execute(vec!["v2.9.0".to_string(), "v3.1.0".to_string(), "not-a-tag".to_string()]);

    assert_eq!(report.unique, 1);
    assert_eq!(report.generated, 1);
    let stored: Vec<String> = store
        .versions()
        .unwrap()
        .iter()
        .map(|v| v.as_str().to_string())
        .collect();
    assert_eq!(stored, ["v3.1.0"]);
}
