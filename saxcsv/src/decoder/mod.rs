// SPDX-License-Identifier: Apache-2.0

//! Typed decoding of scanned records.
//!
//! A [`CsvDecoder`] binds a [`Schema`] to a header row and turns each record
//! (a map from property name to optional text) into a JSON object whose
//! values have the kinds of the schema's defaults. The object is then handed
//! to the target type's [`CsvRecord::decode`].

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{DecodeError, SchemaError};

mod schema;

pub use schema::{FieldDescriptor, PropertyKind, PropertyValue, Schema};

/// Coding-key header that marks the property receiving the record number.
pub const RECORD_NUMBER_HEADER: &str = "CSV_RECORD_NUM";
/// Coding-key header that marks the property receiving the defaulted set.
pub const DEFAULTED_FIELDS_HEADER: &str = "CSV_DEFAULTED_FIELDS";
/// Literals (compared case-insensitively) that coerce to `false`.
pub const DEFAULT_FALSE_STRINGS: &[&str] = &[
    "0", "0.0", "false", "f", "no", "n", "disabled", "disable", "off",
];

/// A scanned record keyed by property name, in column order.
pub type RecordMap = IndexMap<String, Option<String>>;

/// A type that records can be decoded into.
///
/// The default instance supplies each property's kind and fallback value, and
/// the coding keys pair each property with its column header. A property mapped
/// to [`RECORD_NUMBER_HEADER`] or [`DEFAULTED_FIELDS_HEADER`] receives the
/// record number or the list of defaulted properties instead of a column.
///
/// ```rust
/// use saxcsv::CsvRecord;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Point {
///     x: f64,
///     y: f64,
///     line: u64,
/// }
///
/// impl CsvRecord for Point {
///     fn default_values() -> Self {
///         Point { x: 0.0, y: 0.0, line: 0 }
///     }
///
///     fn csv_coding_keys() -> &'static [(&'static str, &'static str)] {
///         &[("x", "X"), ("y", "Y"), ("line", saxcsv::RECORD_NUMBER_HEADER)]
///     }
/// }
/// ```
pub trait CsvRecord: Serialize + DeserializeOwned {
    /// Instance holding every property's default.
    fn default_values() -> Self;

    /// `(property, header)` pairs.
    fn csv_coding_keys() -> &'static [(&'static str, &'static str)];

    /// Properties that are left out, rather than defaulted, when absent.
    fn optional_properties() -> &'static [&'static str] {
        &[]
    }

    fn bool_false_strings() -> &'static [&'static str] {
        DEFAULT_FALSE_STRINGS
    }

    fn encode(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn decode(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// A [`Schema`] bound to the columns of one document.
#[derive(Debug, Clone)]
pub struct CsvDecoder {
    schema: Schema,
    headers: Vec<String>,
    properties: Vec<String>,
}

impl CsvDecoder {
    /// Binds `schema` to `headers`. Every header must map to exactly one
    /// property; properties without a column are treated as absent.
    pub fn new(schema: Schema, headers: &[String]) -> Result<Self, SchemaError> {
        let mut seen = HashSet::with_capacity(headers.len());
        let mut properties = Vec::with_capacity(headers.len());
        for header in headers {
            if !seen.insert(header.as_str()) {
                return Err(SchemaError::DuplicateHeader(header.clone()));
            }
            let field = schema
                .field_for_header(header)
                .ok_or_else(|| SchemaError::UnmappedHeader(header.clone()))?;
            properties.push(field.property().to_owned());
        }
        log::debug!("bound {} columns: {:?}", properties.len(), properties);
        Ok(Self {
            schema,
            headers: headers.to_vec(),
            properties,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Property name of each column.
    pub fn property_names(&self) -> &[String] {
        &self.properties
    }

    pub fn property_for_header(&self, header: &str) -> Option<&str> {
        self.schema.field_for_header(header).map(|f| f.property())
    }

    pub fn header_for_property(&self, property: &str) -> Option<&str> {
        self.schema.field_for_property(property).map(|f| f.header())
    }

    /// Pairs scanned fields with the property names of their columns.
    pub fn record_map(&self, fields: &[Option<String>]) -> RecordMap {
        self.properties
            .iter()
            .cloned()
            .zip(fields.iter().cloned())
            .collect()
    }

    /// Assembles the JSON object for data record `record`.
    pub fn decode_value(&self, record: usize, values: &RecordMap) -> Result<Value, DecodeError> {
        let mut object = Map::with_capacity(self.schema.fields().len() + 2);
        let mut defaulted = Vec::new();

        for field in self.schema.fields() {
            let property = field.property();
            match values.get(property).and_then(Option::as_deref) {
                Some(text) => {
                    let value =
                        self.schema
                            .coerce(field, text)
                            .ok_or_else(|| DecodeError::Coercion {
                                record,
                                property: property.to_owned(),
                                value: text.to_owned(),
                                kind: field.kind(),
                            })?;
                    object.insert(property.to_owned(), value);
                }
                None if field.is_optional() => {}
                None => {
                    object.insert(property.to_owned(), field.default_value().to_json());
                    defaulted.push(Value::String(property.to_owned()));
                }
            }
        }

        if let Some(property) = self.schema.record_number() {
            object.insert(property.to_owned(), Value::from(record as u64));
        }
        if let Some(property) = self.schema.defaulted_set() {
            let set = if defaulted.is_empty() {
                Value::Null
            } else {
                Value::Array(defaulted)
            };
            object.insert(property.to_owned(), set);
        }
        Ok(Value::Object(object))
    }

    pub fn decode<R: CsvRecord>(&self, record: usize, values: &RecordMap) -> Result<R, DecodeError> {
        let value = self.decode_value(record, values)?;
        R::decode(value).map_err(|e| DecodeError::Rejected {
            record,
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use test_log::test;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        x: bool,
        y: Option<String>,
        i: i64,
        record: u64,
        defaults: Option<Vec<String>>,
    }

    impl CsvRecord for Sample {
        fn default_values() -> Self {
            Sample {
                x: true,
                y: Some("d".into()),
                i: 0,
                record: 0,
                defaults: None,
            }
        }

        fn csv_coding_keys() -> &'static [(&'static str, &'static str)] {
            &[
                ("x", "xx"),
                ("y", "yy"),
                ("i", "ii"),
                ("record", RECORD_NUMBER_HEADER),
                ("defaults", DEFAULTED_FIELDS_HEADER),
            ]
        }

        fn optional_properties() -> &'static [&'static str] {
            &["y"]
        }
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn values(pairs: &[(&str, Option<&str>)]) -> RecordMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn test_schema_from_record() {
        let schema = Schema::for_record::<Sample>().unwrap();
        let kinds: Vec<_> = schema.fields().iter().map(|f| (f.property(), f.kind())).collect();
        assert_eq!(
            kinds,
            [
                ("x", PropertyKind::Bool),
                ("y", PropertyKind::String),
                ("i", PropertyKind::Signed),
            ]
        );
        assert!(schema.fields()[1].is_optional());
        assert_eq!(schema.record_number(), Some("record"));
        assert_eq!(schema.defaulted_set(), Some("defaults"));
    }

    #[test]
    fn test_decode_with_defaults() {
        let decoder =
            CsvDecoder::new(Schema::for_record::<Sample>().unwrap(), &headers(&["xx", "yy", "ii"]))
                .unwrap();
        assert_eq!(decoder.property_names(), ["x", "y", "i"]);

        let record = values(&[("x", Some("0")), ("y", None), ("i", None)]);
        let sample: Sample = decoder.decode(1, &record).unwrap();
        assert_eq!(
            sample,
            Sample {
                x: false,
                y: None,
                i: 0,
                record: 1,
                defaults: Some(vec!["i".into()]),
            }
        );
    }

    #[test]
    fn test_decode_all_present() {
        let decoder =
            CsvDecoder::new(Schema::for_record::<Sample>().unwrap(), &headers(&["ii", "xx", "yy"]))
                .unwrap();
        let record = decoder.record_map(&[
            Some("-7".into()),
            Some("yes".into()),
            Some("text".into()),
        ]);
        let value = decoder.decode_value(4, &record).unwrap();
        assert_eq!(
            value,
            json!({"x": true, "y": "text", "i": -7, "record": 4, "defaults": null})
        );
    }

    #[test]
    fn test_missing_column_is_absent() {
        let decoder =
            CsvDecoder::new(Schema::for_record::<Sample>().unwrap(), &headers(&["xx"])).unwrap();
        let record = decoder.record_map(&[Some("on".into())]);
        let value = decoder.decode_value(0, &record).unwrap();
        assert_eq!(
            value,
            json!({"x": true, "i": 0, "record": 0, "defaults": ["i"]})
        );
    }

    #[test]
    fn test_coercion_failure() {
        let decoder =
            CsvDecoder::new(Schema::for_record::<Sample>().unwrap(), &headers(&["xx", "yy", "ii"]))
                .unwrap();
        let record = values(&[("x", Some("1")), ("y", None), ("i", Some("seven"))]);
        assert_eq!(
            decoder.decode_value(2, &record),
            Err(DecodeError::Coercion {
                record: 2,
                property: "i".into(),
                value: "seven".into(),
                kind: PropertyKind::Signed,
            })
        );
    }

    #[test]
    fn test_header_errors() {
        let schema = Schema::for_record::<Sample>().unwrap();
        assert_eq!(
            CsvDecoder::new(schema.clone(), &headers(&["xx", "zz"])).unwrap_err(),
            SchemaError::UnmappedHeader("zz".into())
        );
        assert_eq!(
            CsvDecoder::new(schema, &headers(&["xx", "ii", "xx"])).unwrap_err(),
            SchemaError::DuplicateHeader("xx".into())
        );
    }

    #[test]
    fn test_bidirectional_lookup() {
        let decoder =
            CsvDecoder::new(Schema::for_record::<Sample>().unwrap(), &headers(&["xx", "ii"]))
                .unwrap();
        assert_eq!(decoder.property_for_header("ii"), Some("i"));
        assert_eq!(decoder.header_for_property("y"), Some("yy"));
        assert_eq!(decoder.header_for_property("record"), None);
    }

    #[test]
    fn test_unknown_map_keys_ignored() {
        let decoder =
            CsvDecoder::new(Schema::for_record::<Sample>().unwrap(), &headers(&["xx"])).unwrap();
        let record = values(&[("x", Some("1")), ("extra", Some("zzz"))]);
        let value = decoder.decode_value(0, &record).unwrap();
        assert!(value.get("extra").is_none());
    }

    #[derive(Serialize, Deserialize)]
    struct NotAStruct(u8);

    impl CsvRecord for NotAStruct {
        fn default_values() -> Self {
            NotAStruct(0)
        }

        fn csv_coding_keys() -> &'static [(&'static str, &'static str)] {
            &[]
        }
    }

    #[derive(Serialize, Deserialize)]
    struct ListDefault {
        tags: Vec<String>,
    }

    impl CsvRecord for ListDefault {
        fn default_values() -> Self {
            ListDefault { tags: Vec::new() }
        }

        fn csv_coding_keys() -> &'static [(&'static str, &'static str)] {
            &[("tags", "Tags")]
        }
    }

    #[derive(Serialize, Deserialize)]
    struct MissingKey {
        a: i64,
    }

    impl CsvRecord for MissingKey {
        fn default_values() -> Self {
            MissingKey { a: 1 }
        }

        fn csv_coding_keys() -> &'static [(&'static str, &'static str)] {
            &[("a", "A"), ("b", "B")]
        }
    }

    #[test]
    fn test_schema_derivation_errors() {
        assert_eq!(
            Schema::for_record::<NotAStruct>(),
            Err(SchemaError::NotAnObject("number"))
        );
        assert_eq!(
            Schema::for_record::<ListDefault>(),
            Err(SchemaError::UnsupportedDefault {
                property: "tags".into(),
                found: "array",
            })
        );
        assert_eq!(
            Schema::for_record::<MissingKey>(),
            Err(SchemaError::MissingDefault("b".into()))
        );
    }

    #[test]
    fn test_declared_schema() {
        let schema = Schema::new()
            .field(FieldDescriptor::new("name", "Name", ""))
            .field(FieldDescriptor::new("count", "Count", 0u64))
            .field(FieldDescriptor::new("ratio", "Ratio", 1.0).optional());
        let decoder = CsvDecoder::new(schema, &headers(&["Count", "Name", "Ratio"])).unwrap();
        let record = decoder.record_map(&[Some("12".into()), None, Some("0.25".into())]);
        assert_eq!(
            decoder.decode_value(0, &record).unwrap(),
            json!({"name": "", "count": 12u64, "ratio": 0.25})
        );
    }
}
