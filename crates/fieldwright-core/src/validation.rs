//! Checks that gate formatting.
//!
//! Two layers: [`validate_field_types`] checks the type configuration (cheap,
//! runs first), [`validate_value_for_field_type`] checks one input value.
//! Neither throws; callers batch the results.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::field_type::FieldType;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid regex"));
static ISO_DATETIME_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}").expect("valid regex")
});

/// Outcome of a structural check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCheck {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TypeCheck {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
        }
    }

    pub fn into_result(self) -> Result<(), String> {
        match self.error {
            Some(error) if !self.is_valid => Err(error),
            _ => Ok(()),
        }
    }
}

/// Per-value validation result of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors: vec![error.into()],
        }
    }
}

/// `null`, or a string that is blank after trimming.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Check the field type / array item type pairing.
pub fn validate_field_types(field_type: FieldType, array_item_type: Option<FieldType>) -> TypeCheck {
    if !field_type.is_top_level() {
        return TypeCheck::invalid(format!("Invalid field type: {field_type}"));
    }

    match (field_type, array_item_type) {
        (FieldType::Array, None) => {
            TypeCheck::invalid("Array field type is required when field type is \"array\"")
        }
        (FieldType::Array, Some(item)) if !item.is_array_item_eligible() => {
            TypeCheck::invalid(format!("Invalid array field type: {item}"))
        }
        (FieldType::Array, Some(_)) => TypeCheck::ok(),
        (other, Some(item)) => TypeCheck::invalid(format!(
            "Array field type {item} is only allowed when field type is \"array\" (got \"{other}\")"
        )),
        (_, None) => TypeCheck::ok(),
    }
}

/// Same as [`validate_field_types`] for raw tags, reporting unknown tags.
pub fn validate_field_type_tags(field_type: &str, array_item_type: Option<&str>) -> TypeCheck {
    let Some(parsed) = FieldType::from_tag(field_type).filter(FieldType::is_top_level) else {
        return TypeCheck::invalid(format!("Invalid field type: {field_type}"));
    };

    let item = match array_item_type {
        None => None,
        Some(tag) => match FieldType::from_tag(tag) {
            Some(item) => Some(item),
            None => return TypeCheck::invalid(format!("Invalid array field type: {tag}")),
        },
    };

    validate_field_types(parsed, item)
}

/// Light acceptance check for one value.
///
/// Scalars are always accepted; deeper checks belong to the formatter, which
/// turns unconvertible dates and numbers into `null`. Structured values are
/// accepted only when they already have the shape the field expects.
pub fn validate_value_for_field_type(value: &Value, field_type: FieldType) -> TypeCheck {
    if is_empty(value) {
        return TypeCheck::ok();
    }
    match value {
        Value::Object(_) | Value::Array(_) if !is_already_formatted(value, field_type) => {
            TypeCheck::invalid(format!(
                "Value for field type \"{field_type}\" must be a string, a number or an already formatted {}",
                expected_shape(field_type)
            ))
        }
        _ => TypeCheck::ok(),
    }
}

/// Whether `value` already has the JSON shape the tracker expects for
/// `field_type`, so it can be sent as-is.
pub fn is_already_formatted(value: &Value, field_type: FieldType) -> bool {
    if is_empty(value) {
        return false;
    }
    let has_any = |keys: &[&str]| {
        value
            .as_object()
            .is_some_and(|obj| keys.iter().any(|k| obj.contains_key(*k)))
    };

    match field_type {
        FieldType::OptionWithChild => has_any(&["value", "id"]),
        FieldType::IssueType
        | FieldType::Assignee
        | FieldType::Reporter
        | FieldType::Priority
        | FieldType::Resolution
        | FieldType::Status
        | FieldType::SecurityLevel
        | FieldType::User
        | FieldType::Option
        | FieldType::Version
        | FieldType::Component
        | FieldType::Attachment
        | FieldType::SdServiceLevelAgreement
        | FieldType::SdApprovals
        | FieldType::SdCustomerRequestType => has_any(&["name", "id"]),
        FieldType::IssueLink | FieldType::IssueLinks | FieldType::Project => has_any(&["key", "id"]),
        FieldType::Array => value.is_array(),
        FieldType::Date => value.as_str().is_some_and(|s| ISO_DATE.is_match(s)),
        FieldType::DateTime => value
            .as_str()
            .is_some_and(|s| ISO_DATETIME_PREFIX.is_match(s)),
        FieldType::TimeTracking => has_any(&["originalEstimate", "remainingEstimate"]),
        FieldType::Watches => has_any(&["watchers"]),
        FieldType::String | FieldType::Number | FieldType::Any | FieldType::ChecklistItem => true,
    }
}

fn expected_shape(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::OptionWithChild => "object with \"value\" or \"id\"",
        FieldType::IssueLink | FieldType::IssueLinks | FieldType::Project => {
            "object with \"key\" or \"id\""
        }
        FieldType::TimeTracking => "object with \"originalEstimate\" or \"remainingEstimate\"",
        FieldType::Watches => "object with \"watchers\"",
        FieldType::Date => "YYYY-MM-DD string",
        FieldType::DateTime => "ISO-8601 string",
        FieldType::Array => "array",
        _ => "object with \"name\" or \"id\"",
    }
}

pub(crate) fn is_iso_date(s: &str) -> bool {
    ISO_DATE.is_match(s)
}

pub(crate) fn is_iso_datetime_prefix(s: &str) -> bool {
    ISO_DATETIME_PREFIX.is_match(s)
}
