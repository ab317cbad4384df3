//! Loading JSON inputs from disk.

use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use fieldwright_core::FieldDescriptor;
use serde_json::{Map, Value};

pub fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Field descriptors from a JSON array, or from a create-metadata object
/// whose `fields` is an array or a map of id → descriptor.
pub fn load_descriptors(path: &Path) -> anyhow::Result<Vec<FieldDescriptor>> {
    let value = read_json(path)?;
    descriptors_from_value(value).with_context(|| format!("reading fields from {}", path.display()))
}

pub fn descriptors_from_value(value: Value) -> anyhow::Result<Vec<FieldDescriptor>> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut obj) => match obj.remove("fields") {
            Some(Value::Array(entries)) => entries,
            Some(Value::Object(by_id)) => by_id
                .into_iter()
                .map(|(id, mut entry)| {
                    if let Value::Object(fields) = &mut entry {
                        fields.entry("fieldId").or_insert(Value::String(id));
                    }
                    entry
                })
                .collect(),
            _ => bail!("expected a \"fields\" array or object"),
        },
        _ => bail!("expected an array of field descriptors"),
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            serde_json::from_value(entry).with_context(|| format!("field descriptor #{idx}"))
        })
        .collect()
}

/// A JSON object of field name or id → raw value.
pub fn load_input(path: &Path) -> anyhow::Result<Map<String, Value>> {
    match read_json(path)? {
        Value::Object(obj) => Ok(obj),
        _ => bail!("{} must contain a JSON object of field values", path.display()),
    }
}
