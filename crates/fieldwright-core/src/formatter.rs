//! Raw input → tracker JSON for one field type.
//!
//! [`format_value`] validates the type configuration first, then the value,
//! then dispatches on the field type. Empty input formats to `null` (watchers
//! to `{ "watchers": [] }`, since the tracker rejects `null` there).
//! Unconvertible dates and numbers also format to `null`.

use serde_json::{Number, Value, json};
use tracing::debug;

use crate::dates::{format_date_value, format_datetime_value};
use crate::error::{FormatError, FormatResult};
use crate::field_type::FieldType;
use crate::time_tracking::parse_time_tracking;
use crate::validation::{
    is_empty, validate_field_type_tags, validate_field_types, validate_value_for_field_type,
};

/// Largest integer an `f64` holds exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Format `value` for a field of `field_type` (and `array_item_type` for arrays).
pub fn format_value(
    value: &Value,
    field_type: FieldType,
    array_item_type: Option<FieldType>,
) -> FormatResult<Value> {
    validate_field_types(field_type, array_item_type)
        .into_result()
        .map_err(FormatError::InvalidFieldTypes)?;

    if is_empty(value) {
        return Ok(match field_type {
            FieldType::Watches => json!({ "watchers": [] }),
            _ => Value::Null,
        });
    }

    validate_value_for_field_type(value, field_type)
        .into_result()
        .map_err(FormatError::InvalidValue)?;

    // Structured input passed the shape check above: send it as-is.
    if value.is_object() || value.is_array() {
        return Ok(value.clone());
    }

    let text = value_text(value);
    let formatted = match field_type {
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
        | FieldType::SdCustomerRequestType => json!({ "name": text }),
        FieldType::IssueLink | FieldType::IssueLinks | FieldType::Project => json!({ "key": text }),
        FieldType::OptionWithChild => parse_option_with_child(&text),
        FieldType::Watches => parse_watches(&text),
        FieldType::Date => format_date_value(value).map_or(Value::Null, Value::String),
        FieldType::DateTime => format_datetime_value(value).map_or(Value::Null, Value::String),
        FieldType::TimeTracking => parse_time_tracking(&text),
        FieldType::Array => match array_item_type {
            Some(item) => format_array(&text, item)?,
            None => {
                return Err(FormatError::InvalidFieldTypes(
                    "Array field type is required for array fields".into(),
                ));
            }
        },
        FieldType::Number => parse_number(&text),
        FieldType::String | FieldType::Any => Value::String(text),
        FieldType::ChecklistItem => {
            return Err(FormatError::InvalidFieldTypes(format!(
                "Invalid field type: {field_type}"
            )));
        }
    };
    Ok(formatted)
}

/// [`format_value`] for raw tags; unknown tags are reported before formatting.
pub fn format_tagged(
    value: &Value,
    field_type: &str,
    array_item_type: Option<&str>,
) -> FormatResult<Value> {
    validate_field_type_tags(field_type, array_item_type)
        .into_result()
        .map_err(FormatError::InvalidFieldTypes)?;

    let parsed = field_type
        .parse::<FieldType>()
        .map_err(|e| FormatError::InvalidFieldTypes(e.to_string()))?;
    let item = array_item_type
        .map(str::parse::<FieldType>)
        .transpose()
        .map_err(|e| FormatError::InvalidFieldTypes(e.to_string()))?;

    format_value(value, parsed, item)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn format_array(text: &str, item: FieldType) -> FormatResult<Value> {
    if item == FieldType::ChecklistItem {
        let parsed: Value =
            serde_json::from_str(text).map_err(|e| FormatError::ChecklistJson(e.to_string()))?;
        if !parsed.is_array() {
            return Err(FormatError::ChecklistNotArray);
        }
        return Ok(parsed);
    }

    text.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| format_value(&Value::String(token.to_string()), item, None))
        .collect::<FormatResult<Vec<_>>>()
        .map(Value::Array)
}

/// `"Parent -> Child"` → `{ value, child: { value } }`. Levels past the
/// second are dropped.
fn parse_option_with_child(text: &str) -> Value {
    let mut parts = text.split("->").map(str::trim);
    let parent = parts.next().unwrap_or_default();
    let Some(child) = parts.next() else {
        return json!({ "value": parent });
    };

    let dropped: Vec<&str> = parts.collect();
    if !dropped.is_empty() {
        debug!(input = text, ?dropped, "cascading value deeper than two levels");
    }
    json!({ "value": parent, "child": { "value": child } })
}

fn parse_watches(text: &str) -> Value {
    let watchers: Vec<Value> = text
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| json!({ "name": name }))
        .collect();
    json!({ "watchers": watchers })
}

/// Float parse; integral results are emitted as JSON integers. Non-numeric
/// and non-finite input is `null`.
fn parse_number(text: &str) -> Value {
    let Ok(n) = text.parse::<f64>() else {
        return Value::Null;
    };
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        return Value::from(n as i64);
    }
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_type::{KEY_FORMAT_TYPES, NAME_FORMAT_TYPES};

    fn fmt(value: Value, field_type: FieldType) -> Value {
        format_value(&value, field_type, None).unwrap()
    }

    fn fmt_array(value: &str, item: FieldType) -> Value {
        format_value(&json!(value), FieldType::Array, Some(item)).unwrap()
    }

    #[test]
    fn name_family_wraps_trimmed_name() {
        for t in NAME_FORMAT_TYPES {
            assert_eq!(fmt(json!("  Bug  "), *t), json!({ "name": "Bug" }), "{t}");
        }
    }

    #[test]
    fn key_family_wraps_trimmed_key() {
        for t in KEY_FORMAT_TYPES {
            assert_eq!(fmt(json!(" PROJ-123 "), *t), json!({ "key": "PROJ-123" }), "{t}");
        }
    }

    #[test]
    fn empty_is_null_except_watches() {
        for t in FieldType::ALL {
            if !t.is_top_level() {
                continue;
            }
            let item = (t == FieldType::Array).then_some(FieldType::String);
            for empty in [Value::Null, json!(""), json!("   ")] {
                let out = format_value(&empty, t, item).unwrap();
                if t == FieldType::Watches {
                    assert_eq!(out, json!({ "watchers": [] }));
                } else {
                    assert_eq!(out, Value::Null, "{t}");
                }
            }
        }
    }

    #[test]
    fn cascading_option() {
        assert_eq!(
            fmt(json!("Hardware -> Laptop"), FieldType::OptionWithChild),
            json!({ "value": "Hardware", "child": { "value": "Laptop" } })
        );
        assert_eq!(
            fmt(json!("Hardware"), FieldType::OptionWithChild),
            json!({ "value": "Hardware" })
        );
        assert_eq!(
            fmt(json!("Parent  ->  Child"), FieldType::OptionWithChild),
            json!({ "value": "Parent", "child": { "value": "Child" } })
        );
    }

    #[test]
    fn cascading_option_keeps_first_two_levels() {
        assert_eq!(
            fmt(json!("A -> B -> C"), FieldType::OptionWithChild),
            json!({ "value": "A", "child": { "value": "B" } })
        );
    }

    #[test]
    fn watches() {
        assert_eq!(
            fmt(json!(" user1 , user2 ,, user3, "), FieldType::Watches),
            json!({ "watchers": [{ "name": "user1" }, { "name": "user2" }, { "name": "user3" }] })
        );
        assert_eq!(
            fmt(json!(","), FieldType::Watches),
            json!({ "watchers": [] })
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(fmt(json!("123"), FieldType::Number), json!(123));
        assert_eq!(fmt(json!("123.45"), FieldType::Number), json!(123.45));
        assert_eq!(fmt(json!(" -7 "), FieldType::Number), json!(-7));
        assert_eq!(fmt(json!(2.5), FieldType::Number), json!(2.5));
        assert_eq!(fmt(json!("not-a-number"), FieldType::Number), Value::Null);
        assert_eq!(fmt(json!("NaN"), FieldType::Number), Value::Null);
        assert_eq!(fmt(json!("inf"), FieldType::Number), Value::Null);
    }

    #[test]
    fn strings_and_any_are_trimmed() {
        assert_eq!(fmt(json!("  Hello World  "), FieldType::String), json!("Hello World"));
        assert_eq!(fmt(json!(" value "), FieldType::Any), json!("value"));
        assert_eq!(fmt(json!(42), FieldType::String), json!("42"));
    }

    #[test]
    fn dates_go_through_date_rules() {
        assert_eq!(fmt(json!("2023-12-25"), FieldType::Date), json!("2023-12-25"));
        assert_eq!(fmt(json!(45290), FieldType::Date), json!("2023-12-30"));
        assert_eq!(fmt(json!("1800-01-01"), FieldType::Date), Value::Null);
        assert_eq!(fmt(json!("2300-01-01"), FieldType::Date), Value::Null);
        assert_eq!(
            fmt(json!(45290.5), FieldType::DateTime),
            json!("2023-12-30T12:00:00.000Z")
        );
    }

    #[test]
    fn time_tracking() {
        assert_eq!(
            fmt(json!(" 2w 3d 4h 30m "), FieldType::TimeTracking),
            json!({ "originalEstimate": "2w 3d 4h 30m" })
        );
    }

    #[test]
    fn array_splits_trims_and_drops_empty_tokens() {
        assert_eq!(fmt_array("a, ,b,", FieldType::String), json!(["a", "b"]));
        assert_eq!(
            fmt_array("csv,style,testing", FieldType::String),
            json!(["csv", "style", "testing"])
        );
    }

    #[test]
    fn array_formats_each_item() {
        assert_eq!(
            fmt_array("v1.0, v2.0", FieldType::Version),
            json!([{ "name": "v1.0" }, { "name": "v2.0" }])
        );
        assert_eq!(
            fmt_array("PROJ-1,PROJ-2", FieldType::IssueLinks),
            json!([{ "key": "PROJ-1" }, { "key": "PROJ-2" }])
        );
        assert_eq!(fmt_array("1, 2.5, x", FieldType::Number), json!([1, 2.5, null]));
    }

    #[test]
    fn array_keeps_input_order() {
        assert_eq!(fmt_array("c,a,b", FieldType::String), json!(["c", "a", "b"]));
    }

    #[test]
    fn checklist_items_parse_json() {
        let input = r#"[{"name":"Item 1","completed":false}]"#;
        assert_eq!(
            fmt_array(input, FieldType::ChecklistItem),
            json!([{ "name": "Item 1", "completed": false }])
        );
    }

    #[test]
    fn checklist_items_reject_bad_json() {
        let err = format_value(&json!("invalid-json"), FieldType::Array, Some(FieldType::ChecklistItem))
            .unwrap_err();
        assert!(matches!(err, FormatError::ChecklistJson(_)));
        assert!(err.to_string().starts_with("Invalid JSON format for checklist-item"));

        let err = format_value(&json!("{\"a\":1}"), FieldType::Array, Some(FieldType::ChecklistItem))
            .unwrap_err();
        assert_eq!(err, FormatError::ChecklistNotArray);
    }

    #[test]
    fn array_without_item_type_fails() {
        let err = format_value(&json!("a,b"), FieldType::Array, None).unwrap_err();
        assert!(matches!(err, FormatError::InvalidFieldTypes(_)));
    }

    #[test]
    fn type_errors_reported_before_empty_check() {
        assert!(format_value(&json!(""), FieldType::Array, None).is_err());
        assert!(format_value(&Value::Null, FieldType::String, Some(FieldType::String)).is_err());
    }

    #[test]
    fn preformatted_values_pass_through() {
        let priority = json!({ "id": "3" });
        assert_eq!(fmt(priority.clone(), FieldType::Priority), priority);

        let labels = json!(["a", "b"]);
        assert_eq!(
            format_value(&labels, FieldType::Array, Some(FieldType::String)).unwrap(),
            labels
        );
    }

    #[test]
    fn misshapen_structured_values_fail() {
        let err = format_value(&json!({ "label": "x" }), FieldType::Project, None).unwrap_err();
        assert!(matches!(err, FormatError::InvalidValue(_)));
    }

    #[test]
    fn tagged_formatting() {
        assert_eq!(format_tagged(&json!("Bug"), "issuetype", None).unwrap(), json!({ "name": "Bug" }));
        assert_eq!(format_tagged(&json!("PROJ"), "project", None).unwrap(), json!({ "key": "PROJ" }));
        assert_eq!(format_tagged(&json!("42"), "number", None).unwrap(), json!(42));
        assert_eq!(
            format_tagged(&json!("Red,Green"), "array", Some("option")).unwrap(),
            json!([{ "name": "Red" }, { "name": "Green" }])
        );
        assert_eq!(
            format_tagged(&json!("SLA Level 1"), "sd-servicelevelagreement", None).unwrap(),
            json!({ "name": "SLA Level 1" })
        );
    }

    #[test]
    fn tagged_formatting_reports_unknown_tags() {
        assert_eq!(
            format_tagged(&json!("test"), "invalid-type", None).unwrap_err().to_string(),
            "Invalid field type: invalid-type"
        );
        assert_eq!(
            format_tagged(&json!("test"), "array", Some("invalid-array-type"))
                .unwrap_err()
                .to_string(),
            "Invalid array field type: invalid-array-type"
        );
        assert_eq!(
            format_tagged(&json!("test"), "array", None).unwrap_err().to_string(),
            "Array field type is required when field type is \"array\""
        );
    }
}
