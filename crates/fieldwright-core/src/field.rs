//! A tracker field bound to its classified type.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classifier::{
    ClassificationOutcome, ClassificationResult, SchemaClassifier, classify,
};
use crate::error::{ClassifyResult, FormatResult};
use crate::field_type::FieldType;
use crate::formatter::format_value;
use crate::schema::SchemaDescriptor;
use crate::validation::{self, ValidationResult, validate_value_for_field_type};

/// One entry of the tracker's field metadata.
///
/// Create-metadata responses carry the identifier as `fieldId`, `key` or
/// `id` depending on endpoint and version, often more than one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptor")]
pub struct FieldDescriptor {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub required: bool,
    /// Shared so every field built from this entry hits the classifier memo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Arc<SchemaDescriptor>>,
}

#[derive(Deserialize)]
struct RawDescriptor {
    #[serde(rename = "fieldId")]
    field_id: Option<String>,
    key: Option<String>,
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    required: bool,
    schema: Option<Arc<SchemaDescriptor>>,
}

impl TryFrom<RawDescriptor> for FieldDescriptor {
    type Error = String;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        let id = raw
            .field_id
            .or(raw.key)
            .or(raw.id)
            .ok_or_else(|| "field descriptor needs one of fieldId, key or id".to_string())?;
        Ok(Self {
            id,
            name: raw.name,
            required: raw.required,
            schema: raw.schema,
        })
    }
}

/// A field with its resolved type. Immutable once built.
///
/// Construction never fails: a schema no rule recognises yields an `any`
/// field whose [`outcome`](Field::outcome) carries the classification error.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key: String,
    name: String,
    required: bool,
    raw_schema: Option<Arc<SchemaDescriptor>>,
    classification: ClassificationResult,
    outcome: ClassificationOutcome,
}

impl Field {
    /// Classify `schema` with the built-in rules, without memoisation.
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        required: bool,
        schema: Option<SchemaDescriptor>,
    ) -> Self {
        let schema = schema.map(Arc::new);
        let (classification, outcome) = resolve(schema.as_deref(), classify);
        Self {
            key: key.into(),
            name: name.into(),
            required,
            raw_schema: schema,
            classification,
            outcome,
        }
    }

    /// Classify through `classifier`, sharing its memo for reused schemas.
    pub fn classified_with(
        classifier: &SchemaClassifier,
        key: impl Into<String>,
        name: impl Into<String>,
        required: bool,
        schema: Option<Arc<SchemaDescriptor>>,
    ) -> Self {
        let (classification, outcome) = match &schema {
            Some(shared) if !shared.is_blank() => outcome_of(classifier.classify_shared(shared)),
            _ => (ClassificationResult::any(), ClassificationOutcome::Defaulted),
        };
        Self {
            key: key.into(),
            name: name.into(),
            required,
            raw_schema: schema,
            classification,
            outcome,
        }
    }

    /// Build from a metadata entry. A missing name falls back to the id.
    pub fn from_descriptor(classifier: &SchemaClassifier, descriptor: &FieldDescriptor) -> Self {
        let name = descriptor
            .name
            .clone()
            .unwrap_or_else(|| descriptor.id.clone());
        Self::classified_with(
            classifier,
            descriptor.id.clone(),
            name,
            descriptor.required,
            descriptor.schema.clone(),
        )
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required(&self) -> bool {
        self.required
    }

    /// The schema as received; never re-classified.
    pub fn raw_schema(&self) -> Option<&SchemaDescriptor> {
        self.raw_schema.as_deref()
    }

    pub fn field_type(&self) -> FieldType {
        self.classification.field_type()
    }

    pub fn array_item_type(&self) -> Option<FieldType> {
        self.classification.array_item_type()
    }

    pub fn classification(&self) -> ClassificationResult {
        self.classification
    }

    pub fn outcome(&self) -> &ClassificationOutcome {
        &self.outcome
    }

    /// Format `value` for this field's type.
    pub fn format(&self, value: &Value) -> FormatResult<Value> {
        format_value(value, self.field_type(), self.array_item_type())
    }

    /// Required/empty check plus the per-type acceptance check.
    pub fn validate(&self, value: &Value) -> ValidationResult {
        if self.is_empty(value) {
            return if self.required {
                ValidationResult::invalid("Value is required")
            } else {
                ValidationResult::valid()
            };
        }
        match validate_value_for_field_type(value, self.field_type()).into_result() {
            Ok(()) => ValidationResult::valid(),
            Err(error) => ValidationResult::invalid(error),
        }
    }

    pub fn is_empty(&self, value: &Value) -> bool {
        validation::is_empty(value)
    }
}

fn resolve(
    schema: Option<&SchemaDescriptor>,
    classify: impl FnOnce(&SchemaDescriptor) -> ClassifyResult<ClassificationResult>,
) -> (ClassificationResult, ClassificationOutcome) {
    match schema {
        Some(schema) if !schema.is_blank() => outcome_of(classify(schema)),
        _ => (ClassificationResult::any(), ClassificationOutcome::Defaulted),
    }
}

fn outcome_of(
    result: ClassifyResult<ClassificationResult>,
) -> (ClassificationResult, ClassificationOutcome) {
    match result {
        Ok(classification) => (classification, ClassificationOutcome::Classified),
        Err(error) => (
            ClassificationResult::any(),
            ClassificationOutcome::Fallback(error),
        ),
    }
}
