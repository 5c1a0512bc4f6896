use std::collections::BTreeMap;

use serde_json::Map as JsonMap;

use crate::tag::{tagged, TagHook, TYPE_KEY};
use crate::{JsonValue, TagError, Tagger, Value};

const POINTER: (&str, &[&str]) = ("Pointer", &["className", "objectId"]);
const GEO_POINT: (&str, &[&str]) = ("GeoPoint", &["latitude", "longitude"]);
const FILE: (&str, &[&str]) = ("File", &["name"]);

/// Tag hook for the backend's `Pointer`, `GeoPoint` and `File` types.
///
/// They surface natively as `Value::Custom` with the wire field names, e.g.
/// `Custom { type_name: "Pointer", fields: {"className": .., "objectId": ..} }`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParseTypes;

impl ParseTypes {
    pub fn pointer(class_name: impl Into<String>, object_id: impl Into<String>) -> Value {
        Value::custom(
            POINTER.0,
            BTreeMap::from([
                ("className".to_string(), Value::String(class_name.into())),
                ("objectId".to_string(), Value::String(object_id.into())),
            ]),
        )
    }

    pub fn geo_point(latitude: f64, longitude: f64) -> Value {
        Value::custom(
            GEO_POINT.0,
            BTreeMap::from([
                ("latitude".to_string(), Value::Float(latitude)),
                ("longitude".to_string(), Value::Float(longitude)),
            ]),
        )
    }

    pub fn file(name: impl Into<String>, url: Option<String>) -> Value {
        let mut fields = BTreeMap::from([("name".to_string(), Value::String(name.into()))]);
        if let Some(url) = url {
            fields.insert("url".to_string(), Value::String(url));
        }
        Value::custom(FILE.0, fields)
    }

    fn required(type_name: &str) -> Option<&'static [&'static str]> {
        [POINTER, GEO_POINT, FILE]
            .into_iter()
            .find(|(name, _)| *name == type_name)
            .map(|(_, required)| required)
    }
}

impl TagHook for ParseTypes {
    fn try_tag_native(&self, value: &Value) -> Result<Option<JsonValue>, TagError> {
        let Value::Custom { type_name, fields } = value else {
            return Ok(None);
        };
        let Some(required) = Self::required(type_name) else {
            return Ok(None);
        };

        if fields.contains_key(TYPE_KEY) {
            return Err(TagError::EncodeFailure(format!(
                "{type_name} field '{TYPE_KEY}' is reserved"
            )));
        }
        for key in required {
            if !fields.contains_key(*key) {
                return Err(TagError::EncodeFailure(format!(
                    "{type_name} is missing field '{key}'"
                )));
            }
        }

        let plain = Tagger::new();
        let mut wire = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            wire.push((key.as_str(), plain.to_wire(value)?));
        }
        Ok(Some(tagged(type_name, wire)))
    }

    fn try_untag_wire(
        &self,
        type_name: &str,
        wire: &JsonMap<String, JsonValue>,
    ) -> Result<Option<Value>, TagError> {
        let Some(required) = Self::required(type_name) else {
            return Ok(None);
        };

        for key in required {
            if !wire.contains_key(*key) {
                return Err(TagError::DecodeFailure(format!(
                    "{type_name} is missing field '{key}'"
                )));
            }
        }

        let plain = Tagger::new();
        let mut fields = BTreeMap::new();
        for (key, value) in wire {
            if key != crate::tag::TYPE_KEY {
                fields.insert(key.clone(), plain.to_native(value)?);
            }
        }
        Ok(Some(Value::custom(type_name, fields)))
    }
}
