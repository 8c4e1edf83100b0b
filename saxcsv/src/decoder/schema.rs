// SPDX-License-Identifier: Apache-2.0

//! Declarative description of a target record type.

use serde_json::{Map, Number, Value};

use super::{CsvRecord, DEFAULTED_FIELDS_HEADER, DEFAULT_FALSE_STRINGS, RECORD_NUMBER_HEADER};
use crate::SchemaError;

/// Primitive kind of a property, fixed by its default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Signed,
    Unsigned,
    Float,
    Bool,
}

impl core::fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            PropertyKind::String => "string",
            PropertyKind::Signed => "signed integer",
            PropertyKind::Unsigned => "unsigned integer",
            PropertyKind::Float => "floating point number",
            PropertyKind::Bool => "boolean",
        };
        f.write_str(name)
    }
}

/// A property's default value. Its variant is the property's [`PropertyKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Bool(bool),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::String(_) => PropertyKind::String,
            PropertyValue::Signed(_) => PropertyKind::Signed,
            PropertyValue::Unsigned(_) => PropertyKind::Unsigned,
            PropertyValue::Float(_) => PropertyKind::Float,
            PropertyValue::Bool(_) => PropertyKind::Bool,
        }
    }

    pub(crate) fn to_json(&self) -> Value {
        match self {
            PropertyValue::String(s) => Value::String(s.clone()),
            PropertyValue::Signed(i) => Value::from(*i),
            PropertyValue::Unsigned(u) => Value::from(*u),
            PropertyValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            PropertyValue::Bool(b) => Value::Bool(*b),
        }
    }

    /// Classifies an encoded default. Integers that fit `i64` are signed.
    pub(crate) fn from_json(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::String(s) => Ok(PropertyValue::String(s.clone())),
            Value::Bool(b) => Ok(PropertyValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(PropertyValue::Signed(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(PropertyValue::Unsigned(u))
                } else {
                    n.as_f64()
                        .map(PropertyValue::Float)
                        .ok_or("unrepresentable number")
                }
            }
            other => Err(json_type_name(other)),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Signed(i)
    }
}

impl From<u64> for PropertyValue {
    fn from(u: u64) -> Self {
        PropertyValue::Unsigned(u)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One property of the target type and the column that feeds it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    property: String,
    header: String,
    default: PropertyValue,
    optional: bool,
}

impl FieldDescriptor {
    pub fn new(
        property: impl Into<String>,
        header: impl Into<String>,
        default: impl Into<PropertyValue>,
    ) -> Self {
        Self {
            property: property.into(),
            header: header.into(),
            default: default.into(),
            optional: false,
        }
    }

    /// Marks the property as tolerating absence: a missing value is omitted
    /// instead of replaced by the default.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn default_value(&self) -> &PropertyValue {
        &self.default
    }

    pub fn kind(&self) -> PropertyKind {
        self.default.kind()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// The properties of a target type, their defaults and optionality, the two
/// reserved properties, and the literals that read as boolean `false`.
///
/// ```rust
/// use saxcsv::{FieldDescriptor, Schema};
///
/// let schema = Schema::new()
///     .field(FieldDescriptor::new("x", "xx", true))
///     .field(FieldDescriptor::new("y", "yy", "d").optional())
///     .field(FieldDescriptor::new("i", "ii", 0i64))
///     .record_number_property("record")
///     .defaulted_set_property("defaults");
/// assert_eq!(schema.fields().len(), 3);
/// assert!(schema.is_false("OFF"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
    record_number: Option<String>,
    defaulted_set: Option<String>,
    false_strings: Vec<String>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            record_number: None,
            defaulted_set: None,
            false_strings: DEFAULT_FALSE_STRINGS.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[must_use]
    pub fn field(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields.push(descriptor);
        self
    }

    /// Property that receives the originating data-record index.
    #[must_use]
    pub fn record_number_property(mut self, property: impl Into<String>) -> Self {
        self.record_number = Some(property.into());
        self
    }

    /// Property that receives the names of properties filled from defaults.
    #[must_use]
    pub fn defaulted_set_property(mut self, property: impl Into<String>) -> Self {
        self.defaulted_set = Some(property.into());
        self
    }

    /// Replaces the literals that coerce to `false`. Matching ignores case.
    #[must_use]
    pub fn bool_false_strings<I, S>(mut self, literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.false_strings = literals
            .into_iter()
            .map(|s| s.as_ref().to_lowercase())
            .collect();
        self
    }

    /// Derives the schema of `R` from its encoded default instance.
    pub fn for_record<R: CsvRecord>() -> Result<Self, SchemaError> {
        let encoded = R::default_values()
            .encode()
            .map_err(|e| SchemaError::Encode(e.to_string()))?;
        let defaults: Map<String, Value> = match encoded {
            Value::Object(map) => map,
            other => return Err(SchemaError::NotAnObject(json_type_name(&other))),
        };
        let optional = R::optional_properties();

        let mut schema = Schema::new().bool_false_strings(R::bool_false_strings());
        for &(property, header) in R::csv_coding_keys() {
            match header {
                RECORD_NUMBER_HEADER => schema.record_number = Some(property.to_owned()),
                DEFAULTED_FIELDS_HEADER => schema.defaulted_set = Some(property.to_owned()),
                _ => {
                    let encoded = defaults
                        .get(property)
                        .ok_or_else(|| SchemaError::MissingDefault(property.to_owned()))?;
                    let default = PropertyValue::from_json(encoded).map_err(|found| {
                        SchemaError::UnsupportedDefault {
                            property: property.to_owned(),
                            found,
                        }
                    })?;
                    let mut descriptor = FieldDescriptor::new(property, header, default);
                    descriptor.optional = optional.contains(&property);
                    schema.fields.push(descriptor);
                }
            }
        }
        log::debug!(
            "derived schema with {} properties, optional: {:?}",
            schema.fields.len(),
            optional
        );
        Ok(schema)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn record_number(&self) -> Option<&str> {
        self.record_number.as_deref()
    }

    pub fn defaulted_set(&self) -> Option<&str> {
        self.defaulted_set.as_deref()
    }

    pub fn is_false(&self, value: &str) -> bool {
        let lower = value.to_lowercase();
        self.false_strings.iter().any(|s| *s == lower)
    }

    pub(crate) fn field_for_header(&self, header: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.header == header)
    }

    pub(crate) fn field_for_property(&self, property: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.property == property)
    }

    /// Converts scanned text to the JSON value of `field`'s kind.
    pub(crate) fn coerce(&self, field: &FieldDescriptor, text: &str) -> Option<Value> {
        match field.kind() {
            PropertyKind::String => Some(Value::String(text.to_owned())),
            PropertyKind::Signed => text.trim().parse::<i64>().ok().map(Value::from),
            PropertyKind::Unsigned => text.trim().parse::<u64>().ok().map(Value::from),
            PropertyKind::Float => text
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            PropertyKind::Bool => Some(Value::Bool(!self.is_false(text))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_log::test;

    #[test]
    fn test_classify_defaults() {
        assert_eq!(
            PropertyValue::from_json(&json!("d")),
            Ok(PropertyValue::String("d".into()))
        );
        assert_eq!(
            PropertyValue::from_json(&json!(-3)),
            Ok(PropertyValue::Signed(-3))
        );
        assert_eq!(
            PropertyValue::from_json(&json!(u64::MAX)),
            Ok(PropertyValue::Unsigned(u64::MAX))
        );
        assert_eq!(
            PropertyValue::from_json(&json!(1.5)),
            Ok(PropertyValue::Float(1.5))
        );
        assert_eq!(
            PropertyValue::from_json(&json!(true)),
            Ok(PropertyValue::Bool(true))
        );
        assert_eq!(PropertyValue::from_json(&json!(null)), Err("null"));
        assert_eq!(PropertyValue::from_json(&json!([1])), Err("array"));
    }

    #[test]
    fn test_bool_coercion() {
        let schema = Schema::new();
        let field = FieldDescriptor::new("x", "xx", true);
        for literal in ["0", "0.0", "false", "F", "no", "N", "Disabled", "disable", "OFF"] {
            assert_eq!(
                schema.coerce(&field, literal),
                Some(Value::Bool(false)),
                "{literal}"
            );
        }
        for literal in ["1", "true", "YES", "on", "maybe", ""] {
            assert_eq!(
                schema.coerce(&field, literal),
                Some(Value::Bool(true)),
                "{literal}"
            );
        }
    }

    #[test]
    fn test_custom_false_strings() {
        let schema = Schema::new().bool_false_strings(["Nope"]);
        assert!(schema.is_false("NOPE"));
        assert!(!schema.is_false("0"));
    }

    #[test]
    fn test_numeric_coercion() {
        let schema = Schema::new();
        let signed = FieldDescriptor::new("i", "ii", 0i64);
        let unsigned = FieldDescriptor::new("u", "uu", 0u64);
        let float = FieldDescriptor::new("f", "ff", 0.5);

        assert_eq!(schema.coerce(&signed, " -20 "), Some(json!(-20)));
        assert_eq!(schema.coerce(&signed, "4.2"), None);
        assert_eq!(schema.coerce(&unsigned, "42"), Some(json!(42u64)));
        assert_eq!(schema.coerce(&unsigned, "-1"), None);
        assert_eq!(schema.coerce(&float, "2.25"), Some(json!(2.25)));
        assert_eq!(schema.coerce(&float, "NaN"), None);
        assert_eq!(schema.coerce(&float, "abc"), None);
    }

    #[test]
    fn test_string_passes_through() {
        let schema = Schema::new();
        let field = FieldDescriptor::new("y", "yy", "d");
        assert_eq!(
            schema.coerce(&field, r#"say "hi""#),
            Some(json!(r#"say "hi""#))
        );
    }
}
