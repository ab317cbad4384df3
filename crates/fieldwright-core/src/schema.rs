//! Raw schema descriptors as reported by the tracker's field metadata.
//!
//! The shape varies by server version and vendor, so deserialisation is
//! lenient: unexpected value kinds are dropped rather than rejected, and the
//! classifier decides what the remaining keys mean.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A field's `schema` object: `type`, `custom`, `system`, `items`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct SchemaDescriptor {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<ItemsDescriptor>,
}

/// Array item descriptor. Servers disagree on the encoding: some send the
/// bare item type name, others a nested schema object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ItemsDescriptor {
    Primitive(String),
    Object(Box<SchemaDescriptor>),
    /// Anything else the server sent, kept for diagnostics.
    Invalid(Value),
}

impl SchemaDescriptor {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    /// `{ "type": "array", "items": "<item>" }`
    pub fn array_of(item: impl Into<String>) -> Self {
        Self {
            kind: Some("array".into()),
            items: Some(ItemsDescriptor::Primitive(item.into())),
            ..Self::default()
        }
    }

    /// `{ "type": "array", "items": { ...item } }`
    pub fn array_of_object(item: SchemaDescriptor) -> Self {
        Self {
            kind: Some("array".into()),
            items: Some(ItemsDescriptor::Object(Box::new(item))),
            ..Self::default()
        }
    }

    pub fn with_custom(mut self, custom: impl Into<String>) -> Self {
        self.custom = Some(custom.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// True when none of the recognised keys is present.
    pub fn is_blank(&self) -> bool {
        self.kind.is_none() && self.custom.is_none() && self.system.is_none() && self.items.is_none()
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        // Create-metadata entries wrap the schema: { "name": ..., "schema": { ... } }.
        if !obj.contains_key("type")
            && let Some(Value::Object(inner)) = obj.get("schema")
        {
            return Self::from_object(inner);
        }

        let items = match obj.get("items") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(ItemsDescriptor::Primitive(s.clone())),
            Some(Value::Object(inner)) => {
                Some(ItemsDescriptor::Object(Box::new(Self::from_object(inner))))
            }
            Some(other) => Some(ItemsDescriptor::Invalid(other.clone())),
        };

        Self {
            kind: string_key(obj, "type"),
            custom: string_key(obj, "custom"),
            system: string_key(obj, "system"),
            items,
        }
    }
}

impl From<Value> for SchemaDescriptor {
    fn from(value: Value) -> Self {
        Self::from(&value)
    }
}

impl From<&Value> for SchemaDescriptor {
    fn from(value: &Value) -> Self {
        match value {
            Value::Object(obj) => Self::from_object(obj),
            _ => Self::default(),
        }
    }
}

fn string_key(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// JSON kind name used in diagnostics.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
