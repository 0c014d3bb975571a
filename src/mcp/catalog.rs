use crate::errors::{ErrorCode, McpError};
use crate::utils::suggest::suggest;
use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tool_catalog.json"));
    serde_json::from_str(raw).expect("tool_catalog.json must be valid JSON")
});

static TOOL_MAP: Lazy<HashMap<String, ToolDef>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .cloned()
        .map(|tool| (tool.name.clone(), tool))
        .collect()
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tool in TOOL_CATALOG.iter() {
        if let Ok(schema) = JSONSchema::compile(&tool.input_schema) {
            map.insert(tool.name.clone(), schema);
        }
    }
    map
});

pub fn tool_catalog() -> &'static Vec<ToolDef> {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_MAP.get(name)
}

pub fn tool_names() -> Vec<String> {
    TOOL_CATALOG.iter().map(|tool| tool.name.clone()).collect()
}

/// Tools as advertised by `tools/list`, in catalog order.
pub fn list_tools() -> Vec<ToolDef> {
    TOOL_CATALOG.clone()
}

pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), McpError> {
    let (Some(tool), Some(schema)) = (tool_by_name(tool_name), TOOL_VALIDATORS.get(tool_name))
    else {
        return Ok(());
    };
    if let Err(errors) = schema.validate(args) {
        let message = format_schema_errors(tool_name, args, errors, &tool.input_schema);
        return Err(McpError::new(ErrorCode::InvalidParams, message));
    }
    Ok(())
}

fn format_schema_errors(
    tool_name: &str,
    args: &Value,
    errors: jsonschema::ErrorIterator,
    schema: &Value,
) -> String {
    let mut rendered = Vec::new();
    let mut did_you_means = Vec::new();

    for err in errors.take(10) {
        let pointer = err.instance_path.to_string();
        let location = if pointer.is_empty() {
            "(root)".to_string()
        } else {
            pointer.clone()
        };
        match &err.kind {
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                let schema_path = err.schema_path.to_string();
                let parent = schema_path
                    .strip_suffix("/additionalProperties")
                    .unwrap_or(&schema_path);
                let known: Vec<String> = schema_node_at(schema, parent)
                    .get("properties")
                    .and_then(|v| v.as_object())
                    .map(|map| map.keys().cloned().collect())
                    .unwrap_or_default();
                for unknown in unexpected {
                    rendered.push(format!("{}: unknown field '{}'", location, unknown));
                    let suggestions = suggest(unknown, &known, 3);
                    if !suggestions.is_empty() {
                        did_you_means.push(format!(
                            "field '{}': {}",
                            unknown,
                            suggestions.join(", ")
                        ));
                    }
                }
            }
            ValidationErrorKind::Enum { options } => {
                let allowed: Vec<String> = options
                    .as_array()
                    .map(|arr| {
                        arr.iter()
                            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                            .collect()
                    })
                    .unwrap_or_default();
                rendered.push(format!("{}: expected one of {}", location, allowed.join(", ")));
                let received = schema_node_at(args, &pointer);
                let suggestions = suggest(received.as_str().unwrap_or(""), &allowed, 3);
                if !suggestions.is_empty() {
                    did_you_means.push(format!("{}: {}", location, suggestions.join(", ")));
                }
            }
            ValidationErrorKind::Required { property } => {
                let prop = property
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| property.to_string());
                rendered.push(format!("{}: missing required field '{}'", location, prop));
            }
            ValidationErrorKind::Type { kind } => {
                rendered.push(format!("{}: expected {}", location, format_type_kind(kind)));
            }
            _ => rendered.push(format!("{}: {}", location, err)),
        }
    }

    let mut lines = vec![format!("Invalid arguments for {}", tool_name)];
    lines.extend(rendered.iter().map(|line| format!("- {}", line)));
    if !did_you_means.is_empty() {
        lines.push(format!(
            "Did you mean: {}",
            did_you_means.into_iter().take(3).collect::<Vec<_>>().join(" | ")
        ));
    }
    lines.push(format!(
        "Hint: tools/list shows the input schema for '{}'",
        tool_name
    ));
    lines.join("\n")
}

fn format_type_kind(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Single(primitive) => primitive.to_string(),
        TypeKind::Multiple(types) => {
            let list: Vec<String> = (*types).into_iter().map(|t| t.to_string()).collect();
            if list.is_empty() {
                "unknown".to_string()
            } else {
                list.join(" | ")
            }
        }
    }
}

/// Walks a JSON pointer, stopping at the deepest node it can reach.
fn schema_node_at(root: &Value, pointer: &str) -> Value {
    let mut current = root;
    for segment in pointer.trim_start_matches('/').split('/') {
        if segment.is_empty() {
            continue;
        }
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|idx| items.get(idx)),
            _ => None,
        };
        match next {
            Some(node) => current = node,
            None => break,
        }
    }
    current.clone()
}
