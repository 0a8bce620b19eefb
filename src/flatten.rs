//! Root reference flattening for generated schema documents
//!
//! Reflection-based generators emit every type into `$defs` and leave
//! the document root as a single `$ref` into that table. Downstream
//! type generation mishandles that shape when the referenced definition
//! itself contains nested `$ref`s, so the root definition is inlined:
//! its fields are merged into the document root, the root `$ref` is
//! removed, and the definition entry is dropped from `$defs` unless
//! something else in the document still references it.

use serde_json::{Map, Value};

use crate::error::{LineageError, Result};

/// Local definition reference prefix, the only shape this transform handles
const DEFS_PREFIX: &str = "#/$defs/";

/// Inline a root-level `$ref` to a local definition.
///
/// Documents without a root `$ref`, or whose root `$ref` does not point
/// directly into `$defs`, pass through unchanged. A root `$ref` whose
/// target is missing or not an object is a malformed document and fails
/// with [`LineageError::StructuralInconsistency`].
///
/// The transform is idempotent: its output never carries a root `$ref`.
pub fn flatten_root_ref(mut schema: Value) -> Result<Value> {
    let Some(def_name) = root_def_target(&schema) else {
        return Ok(schema);
    };

    let definition = lookup_definition(&schema, &def_name)?;

    if let Some(root) = schema.as_object_mut() {
        // Definition fields overwrite colliding root fields; well-formed
        // generator output has no collisions.
        for (key, value) in definition {
            root.insert(key, value);
        }
        root.remove("$ref");
    }

    if !is_definition_referenced(&schema, &def_name, "") {
        if let Some(defs) = schema
            .as_object_mut()
            .and_then(|root| root.get_mut("$defs"))
            .and_then(Value::as_object_mut)
        {
            defs.remove(&def_name);
        }
    }

    Ok(schema)
}

/// Extract the definition name from a root `$ref` of the exact shape
/// `#/$defs/<name>`, if present.
fn root_def_target(schema: &Value) -> Option<String> {
    schema
        .as_object()?
        .get("$ref")?
        .as_str()?
        .strip_prefix(DEFS_PREFIX)
        .map(str::to_string)
}

fn lookup_definition(schema: &Value, def_name: &str) -> Result<Map<String, Value>> {
    let defs = schema
        .as_object()
        .and_then(|root| root.get("$defs"))
        .and_then(Value::as_object)
        .ok_or_else(|| {
            LineageError::StructuralInconsistency(
                "document has a root $ref but no $defs table".to_string(),
            )
        })?;

    let definition = defs.get(def_name).ok_or_else(|| {
        LineageError::StructuralInconsistency(format!(
            "referenced definition \"{def_name}\" not found in $defs"
        ))
    })?;

    definition.as_object().cloned().ok_or_else(|| {
        LineageError::StructuralInconsistency(format!(
            "definition \"{def_name}\" is not an object"
        ))
    })
}

/// Check whether `#/$defs/<def_name>` is referenced anywhere in the
/// tree outside the root position.
///
/// `path` is the JSON-pointer-like location of `value` within the
/// document; pass `""` when scanning from the root. A `$ref` found
/// directly at the document root (or at the root's own `$ref` slot) is
/// the pointer being flattened and does not count.
///
/// References are plain string values, not live links, so this is a
/// finite tree walk; no cycle detection is needed.
pub fn is_definition_referenced(value: &Value, def_name: &str, path: &str) -> bool {
    let target = format!("{DEFS_PREFIX}{def_name}");
    scan(value, &target, path)
}

fn scan(value: &Value, target: &str, path: &str) -> bool {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "$ref" {
                    if let Some(ref_str) = child.as_str() {
                        if ref_str == target && !path.is_empty() && path != "/$ref" {
                            return true;
                        }
                    }
                }

                let child_path = format!("{path}/{key}");
                if scan(child, target, &child_path) {
                    return true;
                }
            }
            false
        }
        Value::Array(items) => items.iter().enumerate().any(|(index, item)| {
            let child_path = format!("{path}[{index}]");
            scan(item, target, &child_path)
        }),
        _ => false,
    }
}
