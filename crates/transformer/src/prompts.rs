//! System prompts for both phases.
//!
//! The transform prompt only shows the part of the target schema reached by
//! the mappings, so the code generator is not distracted by fields nothing
//! maps to.

use expertkit_core::message::Message;
use serde_json::{Map, Value};

use crate::models::FieldMapping;
use crate::task::{MappingTask, TransformTask};

const MAPPING_TEMPLATE: &str = r#"You are an AI assistant specialized in analyzing JSON data structures and identifying field mappings.

Your goal is to identify all meaningful field mappings between a source JSON document and a target schema.

<guidelines>
- Analyze the source JSON carefully to understand its structure and semantics
- Identify ALL fields in the source that can map to fields in the target schema
- Provide clear rationale for each mapping explaining the semantic relationship
- Use exact dot-delimited paths (e.g., "user.email", "metadata.timestamp")
- Be thorough - don't skip fields that have valid mappings
</guidelines>

<source_json>
{source_json}
</source_json>

<target_schema>
{target_schema}
</target_schema>

Analyze the source JSON and target schema, then create a comprehensive mapping report."#;

const TRANSFORM_TEMPLATE: &str = r#"You are an AI assistant specialized in generating WebAssembly text modules for JSON transformations.

Your goal is to generate a small, valid WebAssembly text (WAT) module that transforms source JSON to match a target schema.

<guidelines>
- The module must be valid WAT and must not import anything
- Export the linear memory as "memory"
- Export "alloc": (param $len i32) (result i32), returning a pointer to $len writable bytes
- Export "{entry_point}": (param $ptr i32) (param $len i32) (result i32)
  - ($ptr, $len) is the UTF-8 source JSON written into memory by the host
  - the result is a pointer to a NUL-terminated UTF-8 JSON object matching the target schema
- Put memory, data segments, globals and helpers in dependency_setup; put the "{entry_point}" function in transform_logic
- Handle missing source fields gracefully
- Follow the identified field mappings exactly
</guidelines>

<source_json>
{source_json}
</source_json>

<target_schema_filtered>
The target schema has been filtered to include only the fields you identified in the mapping phase:
{target_schema_filtered}
</target_schema_filtered>

<field_mappings>
{field_mappings}
</field_mappings>

Generate the transformation module that implements these mappings."#;

pub fn mapping_prompt(task: &MappingTask) -> Message {
    Message::system(render(MAPPING_TEMPLATE, |name| match name {
        "source_json" => Some(task.source_json.clone()),
        "target_schema" => Some(task.target_schema.clone()),
        _ => None,
    }))
}

/// Prompt factory for the transform expert, naming `entry_point` as the
/// export to generate.
pub fn transform_prompt(entry_point: impl Into<String>) -> impl Fn(&TransformTask) -> Message + Send + Sync + 'static {
    let entry_point = entry_point.into();
    move |task: &TransformTask| {
        Message::system(render(TRANSFORM_TEMPLATE, |name| match name {
            "entry_point" => Some(entry_point.clone()),
            "source_json" => Some(task.source_json.clone()),
            "target_schema_filtered" => Some(filter_schema(&task.target_schema, &task.mappings)),
            "field_mappings" => Some(render_mappings(&task.mappings)),
            _ => None,
        }))
    }
}

/// Fill `{name}` placeholders in one pass over `template`.
///
/// Inserted values are never scanned again, so placeholder-like text inside
/// them is kept verbatim. Unknown placeholders are left as they are.
fn render(template: &str, value: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let filled = after
            .find('}')
            .map(|close| &after[..close])
            .filter(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_lowercase() || b == b'_'))
            .and_then(|name| value(name).map(|v| (name.len(), v)));

        match filled {
            Some((len, v)) => {
                out.push_str(&v);
                rest = &after[len + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn render_mappings(mappings: &[FieldMapping]) -> String {
    if mappings.is_empty() {
        return "(no mappings identified)".into();
    }
    mappings
        .iter()
        .map(|m| format!("- {} -> {}: {}", m.source_path, m.target_path, m.rationale))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reduce `target_schema` to the parts reached by the mappings' target paths.
///
/// Understands JSON Schema (`properties`, `required`, `items`) as well as a
/// plain example object. `[]` suffixes and numeric segments address array
/// items. A path that goes deeper than the schema describes keeps the whole
/// node it stops at. The full schema is returned unchanged when it is not
/// JSON or when there are no mappings.
pub fn filter_schema(target_schema: &str, mappings: &[FieldMapping]) -> String {
    let Ok(schema) = serde_json::from_str::<Value>(target_schema) else {
        return target_schema.to_string();
    };

    let paths: Vec<Vec<&str>> = mappings
        .iter()
        .map(|m| split_path(&m.target_path))
        .filter(|p| !p.is_empty())
        .collect();
    if paths.is_empty() {
        return target_schema.to_string();
    }

    let refs: Vec<&[&str]> = paths.iter().map(Vec::as_slice).collect();
    serde_json::to_string_pretty(&filter_node(&schema, &refs)).unwrap_or_else(|_| target_schema.to_string())
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('.')
        .map(|seg| seg.trim().trim_end_matches("[]"))
        .filter(|seg| !seg.is_empty())
        .collect()
}

fn is_index(segment: &str) -> bool {
    segment.bytes().all(|b| b.is_ascii_digit())
}

fn filter_node(node: &Value, paths: &[&[&str]]) -> Value {
    if paths.iter().any(|p| p.is_empty()) {
        return node.clone();
    }
    let Value::Object(obj) = node else {
        return node.clone();
    };

    if let Some(Value::Object(properties)) = obj.get("properties") {
        let kept = filter_children(properties, paths);
        if kept.is_empty() {
            return node.clone();
        }

        let mut out = obj.clone();
        if let Some(Value::Array(required)) = obj.get("required") {
            let required: Vec<Value> = required
                .iter()
                .filter(|r| r.as_str().is_some_and(|name| kept.contains_key(name)))
                .cloned()
                .collect();
            if required.is_empty() {
                out.remove("required");
            } else {
                out.insert("required".into(), Value::Array(required));
            }
        }
        out.insert("properties".into(), Value::Object(kept));
        return Value::Object(out);
    }

    if let Some(items) = obj.get("items") {
        let inner: Vec<&[&str]> = paths
            .iter()
            .map(|&p| if is_index(p[0]) { &p[1..] } else { p })
            .collect();
        let mut out = obj.clone();
        out.insert("items".into(), filter_node(items, &inner));
        return Value::Object(out);
    }

    if obj.contains_key("type") {
        return node.clone();
    }

    let kept = filter_children(obj, paths);
    if kept.is_empty() {
        node.clone()
    } else {
        Value::Object(kept)
    }
}

/// Children of `parent` named by the first segment of any path, each filtered
/// by the remaining segments.
fn filter_children(parent: &Map<String, Value>, paths: &[&[&str]]) -> Map<String, Value> {
    let mut kept = Map::new();
    for (key, child) in parent {
        let rest: Vec<&[&str]> = paths
            .iter()
            .filter(|p| p[0] == key.as_str())
            .map(|&p| &p[1..])
            .collect();
        if !rest.is_empty() {
            kept.insert(key.clone(), filter_node(child, &rest));
        }
    }
    kept
}
