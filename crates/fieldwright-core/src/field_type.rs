//! The closed field-type taxonomy and its format families.
//!
//! Every field the tracker can describe is reduced to one [`FieldType`]. The
//! type decides the JSON shape of the formatted value:
//!
//! - name family: `{ "name": "<value>" }`
//! - key family: `{ "key": "<value>" }`
//! - object family: a bespoke object (dates, cascading options, time
//!   tracking, watchers)
//! - array: a list of formatted items of a single item type
//! - primitive: strings, numbers and untyped values pass through

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownFieldType;

/// Internal field type tag. Serialises as the tracker's wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "issuetype")]
    IssueType,
    #[serde(rename = "assignee")]
    Assignee,
    #[serde(rename = "reporter")]
    Reporter,
    #[serde(rename = "priority")]
    Priority,
    #[serde(rename = "resolution")]
    Resolution,
    #[serde(rename = "status")]
    Status,
    #[serde(rename = "securitylevel")]
    SecurityLevel,
    #[serde(rename = "user")]
    User,
    #[serde(rename = "option")]
    Option,
    #[serde(rename = "version")]
    Version,
    #[serde(rename = "component")]
    Component,
    #[serde(rename = "issuelink")]
    IssueLink,
    #[serde(rename = "issuelinks")]
    IssueLinks,
    #[serde(rename = "project")]
    Project,
    /// Cascading select: parent option with an optional child.
    #[serde(rename = "option-with-child")]
    OptionWithChild,
    #[serde(rename = "timetracking")]
    TimeTracking,
    #[serde(rename = "attachment")]
    Attachment,
    #[serde(rename = "watches")]
    Watches,
    #[serde(rename = "sd-servicelevelagreement")]
    SdServiceLevelAgreement,
    #[serde(rename = "sd-approvals")]
    SdApprovals,
    #[serde(rename = "sd-customerrequesttype")]
    SdCustomerRequestType,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    #[serde(rename = "array")]
    Array,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "any")]
    Any,
    /// Array-only pseudo type: the raw input is a JSON array literal.
    #[serde(rename = "checklist-item")]
    ChecklistItem,
}

/// How a field type serialises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldFormat {
    Name,
    Key,
    Object,
    Array,
    Primitive,
}

impl FieldFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Key => "key",
            Self::Object => "object",
            Self::Array => "array",
            Self::Primitive => "primitive",
        }
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Types serialised as `{ "name": ... }`.
pub const NAME_FORMAT_TYPES: &[FieldType] = &[
    FieldType::IssueType,
    FieldType::Assignee,
    FieldType::Reporter,
    FieldType::Priority,
    FieldType::Resolution,
    FieldType::Status,
    FieldType::SecurityLevel,
    FieldType::User,
    FieldType::Option,
    FieldType::Version,
    FieldType::Component,
    FieldType::Attachment,
    FieldType::SdServiceLevelAgreement,
    FieldType::SdApprovals,
    FieldType::SdCustomerRequestType,
];

/// Types serialised as `{ "key": ... }`.
pub const KEY_FORMAT_TYPES: &[FieldType] = &[
    FieldType::IssueLink,
    FieldType::IssueLinks,
    FieldType::Project,
];

/// Types with a bespoke object (or date string) shape.
pub const OBJECT_FORMAT_TYPES: &[FieldType] = &[
    FieldType::Date,
    FieldType::DateTime,
    FieldType::OptionWithChild,
    FieldType::TimeTracking,
    FieldType::Watches,
];

impl FieldType {
    /// Every tag in the taxonomy, including the array-only `checklist-item`.
    pub const ALL: [FieldType; 28] = [
        Self::IssueType,
        Self::Assignee,
        Self::Reporter,
        Self::Priority,
        Self::Resolution,
        Self::Status,
        Self::SecurityLevel,
        Self::User,
        Self::Option,
        Self::Version,
        Self::Component,
        Self::IssueLink,
        Self::IssueLinks,
        Self::Project,
        Self::OptionWithChild,
        Self::TimeTracking,
        Self::Attachment,
        Self::Watches,
        Self::SdServiceLevelAgreement,
        Self::SdApprovals,
        Self::SdCustomerRequestType,
        Self::Date,
        Self::DateTime,
        Self::Array,
        Self::String,
        Self::Number,
        Self::Any,
        Self::ChecklistItem,
    ];

    /// Wire name of the tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::IssueType => "issuetype",
            Self::Assignee => "assignee",
            Self::Reporter => "reporter",
            Self::Priority => "priority",
            Self::Resolution => "resolution",
            Self::Status => "status",
            Self::SecurityLevel => "securitylevel",
            Self::User => "user",
            Self::Option => "option",
            Self::Version => "version",
            Self::Component => "component",
            Self::IssueLink => "issuelink",
            Self::IssueLinks => "issuelinks",
            Self::Project => "project",
            Self::OptionWithChild => "option-with-child",
            Self::TimeTracking => "timetracking",
            Self::Attachment => "attachment",
            Self::Watches => "watches",
            Self::SdServiceLevelAgreement => "sd-servicelevelagreement",
            Self::SdApprovals => "sd-approvals",
            Self::SdCustomerRequestType => "sd-customerrequesttype",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Any => "any",
            Self::ChecklistItem => "checklist-item",
        }
    }

    /// Look up a tag by its exact wire name.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.tag() == tag)
    }

    /// Whether the tag may be a field's own type (everything but `checklist-item`).
    pub fn is_top_level(&self) -> bool {
        *self != Self::ChecklistItem
    }

    /// Whether the tag may appear as an array item type (everything but `array`).
    pub fn is_array_item_eligible(&self) -> bool {
        *self != Self::Array
    }

    pub fn format(&self) -> FieldFormat {
        field_format(*self)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::IssueType => "Issue type (e.g., \"Bug\", \"Story\")",
            Self::Assignee => "User assigned to the issue",
            Self::Reporter => "User who reported the issue",
            Self::Priority => "Issue priority (e.g., \"High\", \"Low\")",
            Self::Resolution => "Issue resolution (e.g., \"Done\")",
            Self::Status => "Workflow status",
            Self::SecurityLevel => "Issue security level",
            Self::User => "Generic user field",
            Self::Option => "Single select option",
            Self::Version => "Version field",
            Self::Component => "Component field",
            Self::IssueLink => "Link to another issue",
            Self::IssueLinks => "Multiple links to other issues",
            Self::Project => "Project reference",
            Self::OptionWithChild => "Cascading select field (Parent -> Child)",
            Self::TimeTracking => "Time tracking (e.g., \"2w 3d 4h 30m\")",
            Self::Attachment => "File attachment reference",
            Self::Watches => "Comma-separated list of watchers",
            Self::SdServiceLevelAgreement => "Service desk SLA",
            Self::SdApprovals => "Service desk approvals",
            Self::SdCustomerRequestType => "Service desk customer request type",
            Self::Date => "Date field (YYYY-MM-DD)",
            Self::DateTime => "DateTime field (ISO format)",
            Self::Array => "Array of values",
            Self::String => "Text string",
            Self::Number => "Numeric value",
            Self::Any => "Any value type",
            Self::ChecklistItem => "Checklist items given as a JSON array",
        }
    }

    pub fn info(&self) -> FieldTypeInfo {
        FieldTypeInfo {
            field_type: *self,
            format: self.format(),
            is_array: *self == Self::Array,
            requires_array_type: *self == Self::Array,
            description: self.description(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownFieldType(s.to_string()))
    }
}

/// Summary of one tag, as listed by tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldTypeInfo {
    pub field_type: FieldType,
    pub format: FieldFormat,
    pub is_array: bool,
    pub requires_array_type: bool,
    pub description: &'static str,
}

/// Whether `tag` names a field type usable at the top level of a field.
pub fn is_valid_field_type(tag: &str) -> bool {
    FieldType::from_tag(tag).is_some_and(|t| t.is_top_level())
}

/// Whether `tag` names a type usable as an array item.
pub fn is_valid_array_field_type(tag: &str) -> bool {
    FieldType::from_tag(tag).is_some_and(|t| t.is_array_item_eligible())
}

/// Resolve a tag to its format family.
pub fn field_format(field_type: FieldType) -> FieldFormat {
    if NAME_FORMAT_TYPES.contains(&field_type) {
        return FieldFormat::Name;
    }
    if KEY_FORMAT_TYPES.contains(&field_type) {
        return FieldFormat::Key;
    }
    if OBJECT_FORMAT_TYPES.contains(&field_type) {
        return FieldFormat::Object;
    }
    if field_type == FieldType::Array {
        return FieldFormat::Array;
    }
    FieldFormat::Primitive
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_from_tag() {
        for t in FieldType::ALL {
            assert_eq!(FieldType::from_tag(t.tag()), Some(t));
            assert_eq!(t.tag().parse::<FieldType>(), Ok(t));
        }
    }

    #[test]
    fn tags_are_unique() {
        let mut tags: Vec<&str> = FieldType::ALL.iter().map(|t| t.tag()).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), FieldType::ALL.len());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&FieldType::OptionWithChild).unwrap();
        assert_eq!(json, "\"option-with-child\"");
        let parsed: FieldType = serde_json::from_str("\"sd-approvals\"").unwrap();
        assert_eq!(parsed, FieldType::SdApprovals);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "invalid-type".parse::<FieldType>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid field type: invalid-type");
        assert!(!is_valid_field_type(""));
    }

    #[test]
    fn checklist_item_is_array_only() {
        assert!(!is_valid_field_type("checklist-item"));
        assert!(is_valid_array_field_type("checklist-item"));
    }

    #[test]
    fn array_is_not_an_item_type() {
        assert!(is_valid_field_type("array"));
        assert!(!is_valid_array_field_type("array"));
    }

    #[test]
    fn every_other_type_is_item_eligible() {
        for t in FieldType::ALL {
            if t != FieldType::Array {
                assert!(is_valid_array_field_type(t.tag()), "{t} should be item eligible");
            }
        }
    }

    #[test]
    fn format_families() {
        assert_eq!(field_format(FieldType::Assignee), FieldFormat::Name);
        assert_eq!(field_format(FieldType::SdApprovals), FieldFormat::Name);
        assert_eq!(field_format(FieldType::Project), FieldFormat::Key);
        assert_eq!(field_format(FieldType::IssueLinks), FieldFormat::Key);
        assert_eq!(field_format(FieldType::Date), FieldFormat::Object);
        assert_eq!(field_format(FieldType::Watches), FieldFormat::Object);
        assert_eq!(field_format(FieldType::Array), FieldFormat::Array);
        assert_eq!(field_format(FieldType::String), FieldFormat::Primitive);
        assert_eq!(field_format(FieldType::Any), FieldFormat::Primitive);
    }

    #[test]
    fn format_sets_are_disjoint() {
        for t in NAME_FORMAT_TYPES {
            assert!(!KEY_FORMAT_TYPES.contains(t));
            assert!(!OBJECT_FORMAT_TYPES.contains(t));
        }
        for t in KEY_FORMAT_TYPES {
            assert!(!OBJECT_FORMAT_TYPES.contains(t));
        }
    }

    #[test]
    fn info_for_array_and_scalar() {
        let info = FieldType::Array.info();
        assert_eq!(info.format, FieldFormat::Array);
        assert!(info.is_array);
        assert!(info.requires_array_type);

        let info = FieldType::Assignee.info();
        assert_eq!(info.format, FieldFormat::Name);
        assert!(!info.is_array);
        assert!(!info.requires_array_type);
        assert!(!info.description.is_empty());
    }
}
