//! Parser module - Classify module exports and normalize them
//!
//! Each export is classified exactly once into an [`ExportShape`]; the
//! matching [`Normalizer`] then turns it into a [`CanonicalSchema`].

use crate::Result;
use crate::schema::CanonicalSchema;
use serde_json::{Map, Value};

pub mod legacy;
pub mod schema;

pub use legacy::{LegacyMachineAdapter, adapt_legacy};
pub use schema::{SchemaNormalizer, normalize_schema};

/// Classified shape of a module export
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportShape<'a> {
    /// Carries `logic` or `models`
    Schema(&'a Map<String, Value>),

    /// Carries `states` or `id`, but neither `logic` nor `models`
    LegacyMachine(&'a Map<String, Value>),

    /// Anything else, ignored
    Unrecognized,
}

impl ExportShape<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            ExportShape::Schema(_) => "schema",
            ExportShape::LegacyMachine(_) => "legacy machine",
            ExportShape::Unrecognized => "unrecognized",
        }
    }
}

/// Classify an export value by the properties it carries
pub fn classify(value: &Value) -> ExportShape<'_> {
    let Some(object) = value.as_object() else {
        return ExportShape::Unrecognized;
    };

    if has_property(object, "logic") || has_property(object, "models") {
        ExportShape::Schema(object)
    } else if has_property(object, "states") || has_property(object, "id") {
        ExportShape::LegacyMachine(object)
    } else {
        ExportShape::Unrecognized
    }
}

/// A property counts when it is present with a truthy value
fn has_property(object: &Map<String, Value>, key: &str) -> bool {
    match object.get(key) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Number(number)) => number.as_f64() != Some(0.0),
        Some(_) => true,
    }
}

/// Normalizer trait for turning a classified export into a canonical schema
pub trait Normalizer {
    fn normalize(
        &self,
        export: &Map<String, Value>,
        fallback_name: &str,
    ) -> Result<CanonicalSchema>;
}

/// Classify and normalize one export.
///
/// Returns `Ok(None)` for unrecognized exports.
pub fn normalize_export(value: &Value, export_name: &str) -> Result<Option<CanonicalSchema>> {
    let (normalizer, object): (&dyn Normalizer, _) = match classify(value) {
        ExportShape::Schema(object) => (&SchemaNormalizer, object),
        ExportShape::LegacyMachine(object) => (&LegacyMachineAdapter, object),
        ExportShape::Unrecognized => return Ok(None),
    };

    normalizer.normalize(object, export_name).map(Some)
}

/// Non-empty string property
pub(crate) fn string_prop(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Array property, `None` when absent or not an array
pub(crate) fn array_prop<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Vec<Value>> {
    object.get(key).and_then(Value::as_array)
}
