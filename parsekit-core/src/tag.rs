//! Conversion between native values and the tagged JSON used on the wire.
//!
//! JSON has no date or binary type, so the backend wraps them in objects
//! carrying a `__type` discriminator:
//!
//! ```json
//! {"__type": "Date", "iso": "2013-04-02T08:05:09.042Z"}
//! {"__type": "Bytes", "base64": "AQID"}
//! ```
//!
//! Both directions walk the tree recursively and stop at the first failure;
//! no partially converted tree is ever returned. Tags other than `Date` and
//! `Bytes` (and native `Value::Custom` values) are delegated to a `TagHook`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map as JsonMap, Number};

use crate::date::{date_from_string, string_from_date};
use crate::{JsonValue, TagError, Value};

pub const TYPE_KEY: &str = "__type";
pub const DATE_TYPE: &str = "Date";
pub const BYTES_TYPE: &str = "Bytes";

/// Extension point for tagged types the tagger does not know about.
///
/// Both methods return `Ok(None)` to decline.
pub trait TagHook: Send + Sync {
    fn try_tag_native(&self, value: &Value) -> Result<Option<JsonValue>, TagError>;

    fn try_untag_wire(
        &self,
        type_name: &str,
        wire: &JsonMap<String, JsonValue>,
    ) -> Result<Option<Value>, TagError>;
}

#[derive(Clone, Default)]
pub struct Tagger {
    hook: Option<Arc<dyn TagHook>>,
}

impl fmt::Debug for Tagger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hook = if self.hook.is_some() { "<hook>" } else { "<none>" };
        f.debug_struct("Tagger").field("hook", &hook).finish()
    }
}

impl Tagger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook<H: TagHook + 'static>(hook: H) -> Self {
        Self {
            hook: Some(Arc::new(hook)),
        }
    }

    pub fn with_shared_hook(hook: Arc<dyn TagHook>) -> Self {
        Self { hook: Some(hook) }
    }

    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }

    pub fn to_wire(&self, value: &Value) -> Result<JsonValue, TagError> {
        match value {
            Value::Null => Ok(JsonValue::Null),
            Value::Bool(value) => Ok(JsonValue::Bool(*value)),
            Value::Integer(value) => Ok(JsonValue::from(*value)),
            Value::Float(value) => Number::from_f64(*value)
                .map(JsonValue::Number)
                .ok_or_else(|| {
                    TagError::EncodeFailure(format!("float {value} has no JSON representation"))
                }),
            Value::String(value) => Ok(JsonValue::String(value.clone())),
            Value::Date(date) => Ok(tagged(
                DATE_TYPE,
                [("iso", JsonValue::String(string_from_date(date)))],
            )),
            Value::Bytes(bytes) => Ok(tagged(
                BYTES_TYPE,
                [("base64", JsonValue::String(STANDARD.encode(bytes)))],
            )),
            Value::List(values) => values
                .iter()
                .map(|value| self.to_wire(value))
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array),
            Value::Map(map) => self.map_to_wire(map).map(JsonValue::Object),
            Value::Custom { type_name, .. } => {
                if let Some(hook) = &self.hook {
                    if let Some(wire) = hook.try_tag_native(value)? {
                        return Ok(wire);
                    }
                }
                Err(TagError::EncodeFailure(format!(
                    "no tag hook handles custom type '{type_name}'"
                )))
            }
        }
    }

    pub fn map_to_wire(
        &self,
        map: &BTreeMap<String, Value>,
    ) -> Result<JsonMap<String, JsonValue>, TagError> {
        let mut out = JsonMap::new();
        for (key, value) in map {
            if key == TYPE_KEY {
                return Err(TagError::EncodeFailure(format!(
                    "map key '{TYPE_KEY}' is reserved for tagged values"
                )));
            }
            out.insert(key.clone(), self.to_wire(value)?);
        }
        Ok(out)
    }

    pub fn to_native(&self, wire: &JsonValue) -> Result<Value, TagError> {
        match wire {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Bool(value) => Ok(Value::Bool(*value)),
            JsonValue::Number(number) => number_to_native(number),
            JsonValue::String(value) => Ok(Value::String(value.clone())),
            JsonValue::Array(values) => values
                .iter()
                .map(|value| self.to_native(value))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            JsonValue::Object(map) => match map.get(TYPE_KEY) {
                None => self.map_to_native(map).map(Value::Map),
                Some(type_name) => self.untag(type_name, map),
            },
        }
    }

    pub fn map_to_native(
        &self,
        map: &JsonMap<String, JsonValue>,
    ) -> Result<BTreeMap<String, Value>, TagError> {
        let mut out = BTreeMap::new();
        for (key, value) in map {
            out.insert(key.clone(), self.to_native(value)?);
        }
        Ok(out)
    }

    fn untag(
        &self,
        type_name: &JsonValue,
        map: &JsonMap<String, JsonValue>,
    ) -> Result<Value, TagError> {
        let type_name = match type_name {
            JsonValue::String(name) => name.as_str(),
            other => return Err(TagError::UnrecognizedWireType(other.to_string())),
        };

        match type_name {
            DATE_TYPE => {
                let iso = map.get("iso").and_then(JsonValue::as_str).ok_or_else(|| {
                    TagError::MalformedDateField("missing string field 'iso'".to_string())
                })?;
                date_from_string(iso)
                    .map(Value::Date)
                    .ok_or_else(|| TagError::MalformedDateField(iso.to_string()))
            }
            BYTES_TYPE => {
                let encoded = map
                    .get("base64")
                    .and_then(JsonValue::as_str)
                    .ok_or_else(|| {
                        TagError::DecodeFailure("missing string field 'base64'".to_string())
                    })?;
                STANDARD
                    .decode(encoded)
                    .map(Value::Bytes)
                    .map_err(|err| TagError::DecodeFailure(format!("invalid base64: {err}")))
            }
            other => {
                if let Some(hook) = &self.hook {
                    if let Some(value) = hook.try_untag_wire(other, map)? {
                        return Ok(value);
                    }
                }
                Err(TagError::UnrecognizedWireType(other.to_string()))
            }
        }
    }
}

/// Converts with no hook registered.
pub fn to_wire(value: &Value) -> Result<JsonValue, TagError> {
    Tagger::new().to_wire(value)
}

/// Converts with no hook registered.
pub fn to_native(wire: &JsonValue) -> Result<Value, TagError> {
    Tagger::new().to_native(wire)
}

/// Builds `{"__type": type_name, ..fields}`. The discriminator always wins
/// over a field of the same name.
pub fn tagged<'a>(
    type_name: &str,
    fields: impl IntoIterator<Item = (&'a str, JsonValue)>,
) -> JsonValue {
    let mut out = JsonMap::new();
    for (key, value) in fields {
        out.insert(key.to_string(), value);
    }
    out.insert(TYPE_KEY.to_string(), JsonValue::String(type_name.to_string()));
    JsonValue::Object(out)
}

fn number_to_native(number: &Number) -> Result<Value, TagError> {
    if let Some(value) = number.as_i64() {
        return Ok(Value::Integer(value));
    }
    if number.is_u64() {
        return Err(TagError::DecodeFailure(format!(
            "integer {number} exceeds i64::MAX"
        )));
    }
    number
        .as_f64()
        .map(Value::Float)
        .ok_or_else(|| TagError::DecodeFailure(format!("unsupported number {number}")))
}
