//! Schema classification: raw [`SchemaDescriptor`] → [`FieldType`].
//!
//! Classification runs an ordered rule chain; the first rule that matches
//! decides. Two rules can match the same schema, so the order is part of the
//! contract:
//!
//! 1. [`Rule::DirectType`]: `type` names a taxonomy tag.
//! 2. [`Rule::ArrayItems`]: `type == "array"`; the item descriptor is
//!    classified recursively (bare-string and nested-object encodings both
//!    accepted). Item failures are wrapped and surfaced, never defaulted.
//! 3. [`Rule::SystemName`]: `system` names a taxonomy tag.
//! 4. [`Rule::CustomIdentifier`]: substring match on the vendor `custom`
//!    identifier (`cascadingselect`, then `select`, then `userpicker`).
//!
//! Nothing matched → [`ClassifyError::Unsupported`]. Callers that need a
//! total answer (see [`crate::Field`]) downgrade that to `any` and keep the
//! error in a [`ClassificationOutcome`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use serde::Serialize;

use crate::error::{ClassifyError, ClassifyResult};
use crate::field_type::FieldType;
use crate::schema::{ItemsDescriptor, SchemaDescriptor, json_kind};

/// Resolved type of a field. `array_item_type` is set exactly when
/// `field_type` is [`FieldType::Array`], and is never `Array` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    array_item_type: Option<FieldType>,
}

impl ClassificationResult {
    /// Build a result, enforcing the array/item pairing.
    pub fn new(field_type: FieldType, array_item_type: Option<FieldType>) -> ClassifyResult<Self> {
        match (field_type, array_item_type) {
            (FieldType::Array, Some(FieldType::Array)) => Err(ClassifyError::NestedArray),
            (FieldType::Array, Some(item)) => Ok(Self::array(item)),
            (FieldType::Array, None) => Err(ClassifyError::InvalidResult(
                "array classification requires an item type".into(),
            )),
            (FieldType::ChecklistItem, _) => Err(ClassifyError::InvalidResult(
                "checklist-item is only valid as an array item type".into(),
            )),
            (scalar, None) => Ok(Self::scalar(scalar)),
            (scalar, Some(item)) => Err(ClassifyError::InvalidResult(format!(
                "item type {item} given for non-array type {scalar}"
            ))),
        }
    }

    pub(crate) fn scalar(field_type: FieldType) -> Self {
        Self {
            field_type,
            array_item_type: None,
        }
    }

    pub(crate) fn array(item: FieldType) -> Self {
        Self {
            field_type: FieldType::Array,
            array_item_type: Some(item),
        }
    }

    /// The `any` sentinel used when nothing else can be said.
    pub fn any() -> Self {
        Self::scalar(FieldType::Any)
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn array_item_type(&self) -> Option<FieldType> {
        self.array_item_type
    }

    pub fn is_array(&self) -> bool {
        self.field_type == FieldType::Array
    }
}

/// How a field's type was decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationOutcome {
    /// A rule matched.
    Classified,
    /// No schema was supplied; the field is `any`.
    Defaulted,
    /// The schema was not recognised; the field fell back to `any`.
    Fallback(ClassifyError),
}

impl ClassificationOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Where in a schema a descriptor sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    TopLevel,
    ArrayItem,
}

/// One link of the classification chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// `type` is a taxonomy tag (other than `array`).
    DirectType,
    /// `type` is `array`; classify `items`.
    ArrayItems,
    /// `system` is a taxonomy tag (other than `array`).
    SystemName,
    /// Case-insensitive substring match on `custom`.
    CustomIdentifier { needle: String, field_type: FieldType },
}

impl Rule {
    pub fn custom(needle: impl Into<String>, field_type: FieldType) -> Self {
        Self::CustomIdentifier {
            needle: needle.into().to_ascii_lowercase(),
            field_type,
        }
    }

    /// `None` when the rule does not apply to `schema`.
    fn apply(
        &self,
        schema: &SchemaDescriptor,
        position: Position,
        chain: &SchemaClassifier,
    ) -> Option<ClassifyResult<ClassificationResult>> {
        match self {
            Self::DirectType => {
                let tag = schema.kind.as_deref()?;
                direct_tag(tag, position).map(|t| Ok(ClassificationResult::scalar(t)))
            }
            Self::ArrayItems => {
                if schema.kind.as_deref() != Some("array") {
                    return None;
                }
                if position == Position::ArrayItem {
                    return Some(Err(ClassifyError::NestedArray));
                }
                Some(chain.classify_items(schema.items.as_ref()))
            }
            Self::SystemName => {
                let tag = schema.system.as_deref()?;
                direct_tag(tag, position).map(|t| Ok(ClassificationResult::scalar(t)))
            }
            Self::CustomIdentifier { needle, field_type } => {
                let custom = schema.custom.as_deref()?.to_ascii_lowercase();
                if !custom.contains(needle.as_str()) {
                    return None;
                }
                if position == Position::ArrayItem && *field_type == FieldType::ChecklistItem {
                    return Some(Ok(ClassificationResult::scalar(FieldType::ChecklistItem)));
                }
                Some(ClassificationResult::new(*field_type, None))
            }
        }
    }
}

/// A tag accepted by the direct rules at `position`.
fn direct_tag(tag: &str, position: Position) -> Option<FieldType> {
    let t = FieldType::from_tag(tag)?;
    match (t, position) {
        (FieldType::Array, _) => None,
        (FieldType::ChecklistItem, Position::TopLevel) => None,
        _ => Some(t),
    }
}

fn default_rules() -> Vec<Rule> {
    vec![
        Rule::DirectType,
        Rule::ArrayItems,
        Rule::SystemName,
        // cascadingselect also contains "select": it must come first.
        Rule::custom("cascadingselect", FieldType::OptionWithChild),
        Rule::custom("select", FieldType::Option),
        Rule::custom("userpicker", FieldType::User),
    ]
}

struct CacheEntry {
    schema: Weak<SchemaDescriptor>,
    result: ClassifyResult<ClassificationResult>,
}

/// Rule chain plus a memo of results keyed by schema identity.
///
/// The memo only applies to [`SchemaClassifier::classify_shared`]: the same
/// `Arc` classified twice is evaluated once. Two structurally equal schemas
/// in different allocations are evaluated separately.
pub struct SchemaClassifier {
    rules: Vec<Rule>,
    cache: Mutex<HashMap<usize, CacheEntry>>,
}

impl Default for SchemaClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaClassifier")
            .field("rules", &self.rules)
            .field("cached", &self.cached_len())
            .finish()
    }
}

impl SchemaClassifier {
    /// Classifier with the built-in rule chain.
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Append a rule after the built-in rules, before the fallback.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify without touching the memo.
    pub fn classify(&self, schema: &SchemaDescriptor) -> ClassifyResult<ClassificationResult> {
        self.classify_at(schema, Position::TopLevel)
    }

    /// Classify, reusing an earlier result for the same `Arc`.
    pub fn classify_shared(
        &self,
        schema: &Arc<SchemaDescriptor>,
    ) -> ClassifyResult<ClassificationResult> {
        let key = Arc::as_ptr(schema) as usize;

        if let Ok(cache) = self.cache.lock()
            && let Some(entry) = cache.get(&key)
            && entry.schema.strong_count() > 0
        {
            return entry.result.clone();
        }

        // Computed outside the lock; a racing writer stores the same answer.
        let result = self.classify(schema);

        if let Ok(mut cache) = self.cache.lock() {
            cache.retain(|_, entry| entry.schema.strong_count() > 0);
            cache.insert(
                key,
                CacheEntry {
                    schema: Arc::downgrade(schema),
                    result: result.clone(),
                },
            );
        }
        result
    }

    /// Number of live memo entries.
    pub fn cached_len(&self) -> usize {
        self.cache
            .lock()
            .map(|cache| {
                cache
                    .values()
                    .filter(|entry| entry.schema.strong_count() > 0)
                    .count()
            })
            .unwrap_or(0)
    }

    fn classify_at(
        &self,
        schema: &SchemaDescriptor,
        position: Position,
    ) -> ClassifyResult<ClassificationResult> {
        for rule in &self.rules {
            if let Some(result) = rule.apply(schema, position, self) {
                return result;
            }
        }
        Err(ClassifyError::unsupported(
            schema.kind.as_deref(),
            schema.custom.as_deref(),
        ))
    }

    fn classify_items(
        &self,
        items: Option<&ItemsDescriptor>,
    ) -> ClassifyResult<ClassificationResult> {
        let item = match items {
            None => return Err(ClassifyError::MissingItems),
            Some(ItemsDescriptor::Primitive(tag)) => {
                match direct_tag(tag, Position::ArrayItem) {
                    Some(t) => Ok(t),
                    None if tag == "array" => Err(ClassifyError::NestedArray),
                    None => Err(ClassifyError::unsupported(Some(tag), None)),
                }
            }
            Some(ItemsDescriptor::Object(inner)) => self
                .classify_at(inner, Position::ArrayItem)
                .map(|r| r.field_type()),
            Some(ItemsDescriptor::Invalid(value)) => Err(ClassifyError::InvalidItems(json_kind(value))),
        };

        item.map(ClassificationResult::array)
            .map_err(|e| ClassifyError::ArrayItem(Box::new(e)))
    }
}

/// Classify with the built-in rule chain.
pub fn classify(schema: &SchemaDescriptor) -> ClassifyResult<ClassificationResult> {
    SchemaClassifier::new().classify(schema)
}
