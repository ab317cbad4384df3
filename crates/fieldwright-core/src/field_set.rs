//! Batch formatting and validation over a project's fields.
//!
//! Every input entry is handled on its own: a structural error or an
//! unconvertible value in one field is reported in that field's summary and
//! never stops the rest of the batch.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::classifier::{ClassificationOutcome, SchemaClassifier};
use crate::field::{Field, FieldDescriptor};
use crate::field_type::FieldType;
use crate::validation::ValidationResult;

/// The fields of one project / issue type pairing.
#[derive(Debug, Clone)]
pub struct FieldSet {
    fields: Vec<Field>,
    by_id: HashMap<String, usize>,
    by_lower: HashMap<String, usize>,
}

/// What happened to one input entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldStatus {
    Formatted,
    /// Empty input, or a value that could not be converted (`null`).
    Empty,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    /// Input key as given (name or id).
    pub input: String,
    pub field_id: String,
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_item_type: Option<FieldType>,
    #[serde(flatten)]
    pub status: FieldStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormatReport {
    /// Formatted values keyed by field id.
    pub fields: Map<String, Value>,
    pub summaries: Vec<FieldSummary>,
    /// Input keys that match no field.
    pub unknown: Vec<String>,
    pub formatted_count: usize,
    pub skipped_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    /// Per-field results keyed by field id.
    pub field_results: BTreeMap<String, ValidationResult>,
    pub errors: Vec<String>,
}

impl FieldSet {
    pub fn new(fields: Vec<Field>) -> Self {
        let mut by_id = HashMap::with_capacity(fields.len());
        let mut by_lower = HashMap::with_capacity(fields.len() * 2);
        for (idx, field) in fields.iter().enumerate() {
            by_id.insert(field.key().to_string(), idx);
            by_lower.entry(field.key().to_lowercase()).or_insert(idx);
            by_lower.entry(field.name().to_lowercase()).or_insert(idx);
        }

        let set = Self {
            fields,
            by_id,
            by_lower,
        };
        set.report_fallbacks();
        debug!(count = set.fields.len(), "field set built");
        set
    }

    /// Build from metadata entries, classifying through `classifier`.
    pub fn from_descriptors(classifier: &SchemaClassifier, descriptors: &[FieldDescriptor]) -> Self {
        Self::new(
            descriptors
                .iter()
                .map(|d| Field::from_descriptor(classifier, d))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Look a field up by exact id, then by case-insensitive id or name.
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.by_id
            .get(key)
            .or_else(|| self.by_lower.get(&key.to_lowercase()))
            .map(|&idx| &self.fields[idx])
    }

    /// Fields whose schema was not recognised and fell back to `any`.
    pub fn fallbacks(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.outcome().is_fallback())
    }

    /// Format every entry of `input`. When two keys name the same field,
    /// the first (in map order) wins and the later one is reported as failed.
    pub fn format_input(&self, input: &Map<String, Value>) -> FormatReport {
        let mut report = FormatReport::default();
        let mut seen: HashMap<&str, &str> = HashMap::new();

        for (key, value) in input {
            let Some(field) = self.get(key) else {
                report.unknown.push(key.clone());
                continue;
            };

            if let Some(first) = seen.get(field.key()) {
                report.skipped_count += 1;
                report.summaries.push(summary(
                    key,
                    field,
                    FieldStatus::Failed {
                        error: duplicate_message(first),
                    },
                ));
                continue;
            }
            seen.insert(field.key(), key);

            let status = match field.format(value) {
                Ok(Value::Null) => FieldStatus::Empty,
                Ok(formatted) => {
                    report.fields.insert(field.key().to_string(), formatted);
                    FieldStatus::Formatted
                }
                Err(e) => {
                    debug!(field = field.key(), error = %e, "field skipped");
                    FieldStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };

            if status == FieldStatus::Formatted {
                report.formatted_count += 1;
            } else {
                report.skipped_count += 1;
            }
            report.summaries.push(summary(key, field, status));
        }

        report
    }

    pub fn validate_input(&self, input: &Map<String, Value>) -> ValidationReport {
        let mut report = ValidationReport::default();
        let mut seen: HashMap<&str, &str> = HashMap::new();

        for (key, value) in input {
            let Some(field) = self.get(key) else {
                report.errors.push(format!("Unknown field: {key}"));
                continue;
            };

            if let Some(first) = seen.get(field.key()) {
                let message = duplicate_message(first);
                report.errors.push(format!("{}: {message}", field.name()));
                if let Some(result) = report.field_results.get_mut(field.key()) {
                    result.valid = false;
                    result.errors.push(message);
                }
                continue;
            }
            seen.insert(field.key(), key);

            let result = field.validate(value);
            report
                .errors
                .extend(result.errors.iter().map(|e| format!("{}: {e}", field.name())));
            report.field_results.insert(field.key().to_string(), result);
        }

        for field in self.fields.iter().filter(|f| f.required()) {
            if report.field_results.contains_key(field.key()) {
                continue;
            }
            let message = format!("Missing required field: {}", field.name());
            report.errors.push(message.clone());
            report
                .field_results
                .insert(field.key().to_string(), ValidationResult::invalid(message));
        }

        report.valid = report.errors.is_empty();
        report
    }

    fn report_fallbacks(&self) {
        let mut fallbacks = self.fallbacks();
        let Some(first) = fallbacks.next() else {
            return;
        };
        let ClassificationOutcome::Fallback(reason) = first.outcome() else {
            return;
        };
        warn!(
            count = 1 + fallbacks.count(),
            first = first.key(),
            %reason,
            "unrecognised field schemas treated as any"
        );
    }
}

fn summary(input: &str, field: &Field, status: FieldStatus) -> FieldSummary {
    FieldSummary {
        input: input.to_string(),
        field_id: field.key().to_string(),
        field_type: field.field_type(),
        array_item_type: field.array_item_type(),
        status,
    }
}

fn duplicate_message(first: &str) -> String {
    format!("Duplicate input for this field (already given as \"{first}\")")
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
