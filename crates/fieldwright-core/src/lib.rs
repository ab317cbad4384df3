//! Issue-tracker field handling: classify field schemas, format raw input
//! into the JSON the tracker's create endpoint expects.

pub mod classifier;
pub mod dates;
mod error;
pub mod field;
pub mod field_set;
pub mod field_type;
pub mod formatter;
pub mod schema;
pub mod time_tracking;
pub mod validation;

pub use classifier::{
    ClassificationOutcome, ClassificationResult, Rule, SchemaClassifier, classify,
};
pub use error::{ClassifyError, ClassifyResult, FormatError, FormatResult, UnknownFieldType};
pub use field::{Field, FieldDescriptor};
pub use field_set::{FieldSet, FieldStatus, FieldSummary, FormatReport, ValidationReport};
pub use field_type::{
    FieldFormat, FieldType, FieldTypeInfo, field_format, is_valid_array_field_type,
    is_valid_field_type,
};
pub use formatter::{format_tagged, format_value};
pub use schema::{ItemsDescriptor, SchemaDescriptor};
pub use validation::{
    TypeCheck, ValidationResult, is_already_formatted, validate_field_type_tags,
    validate_field_types, validate_value_for_field_type,
};
