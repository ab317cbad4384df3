use thiserror::Error;

/// Why a schema descriptor could not be mapped onto the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("array schema missing items definition")]
    MissingItems,

    #[error("invalid array items type: {0}")]
    InvalidItems(&'static str),

    #[error("nested array schemas are not supported")]
    NestedArray,

    #[error("Failed to map array item schema: {0}")]
    ArrayItem(Box<ClassifyError>),

    #[error("unsupported schema mapping (type={kind}, custom={custom})")]
    Unsupported { kind: String, custom: String },

    #[error("invalid classification: {0}")]
    InvalidResult(String),
}

impl ClassifyError {
    pub(crate) fn unsupported(kind: Option<&str>, custom: Option<&str>) -> Self {
        Self::Unsupported {
            kind: kind.unwrap_or("n/a").to_string(),
            custom: custom.unwrap_or("n/a").to_string(),
        }
    }
}

/// Hard formatting failures. Unconvertible user data is not an error: it
/// formats to `null`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("{0}")]
    InvalidFieldTypes(String),

    #[error("Invalid JSON format for checklist-item: {0}")]
    ChecklistJson(String),

    #[error("checklist-item input must be a JSON array")]
    ChecklistNotArray,

    #[error("{0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid field type: {0}")]
pub struct UnknownFieldType(pub String);

pub type ClassifyResult<T> = Result<T, ClassifyError>;
pub type FormatResult<T> = Result<T, FormatError>;
