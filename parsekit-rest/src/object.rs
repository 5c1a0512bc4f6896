use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use parsekit_core::{date_from_string, JsonValue, Value};
use serde_json::Map as JsonMap;
use tracing::Instrument;

use crate::busy::BusyFlag;
use crate::{ParseClient, ParseError};

pub(crate) type JsonObject = JsonMap<String, JsonValue>;

/// Keys owned by the backend; never sent back in a request body.
const SERVER_KEYS: [&str; 3] = ["objectId", "createdAt", "updatedAt"];

/// One row of a Parse class.
///
/// `data` is the local, editable state. The snapshot is the last state the
/// backend confirmed, kept in wire form so updates only send changed keys.
pub struct ParseObject {
    client: ParseClient,
    class_name: String,
    state: Mutex<ObjectState>,
    busy: BusyFlag,
}

#[derive(Clone, Debug, Default)]
struct ObjectState {
    data: BTreeMap<String, Value>,
    snapshot: JsonObject,
}

impl fmt::Debug for ParseObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("ParseObject")
            .field("class_name", &self.class_name)
            .field("object_id", &state.snapshot.get("objectId"))
            .field("data", &state.data)
            .field("busy", &self.busy.is_busy())
            .finish()
    }
}

impl ParseObject {
    pub fn new(client: ParseClient, class_name: impl Into<String>) -> Self {
        Self {
            client,
            class_name: class_name.into(),
            state: Mutex::new(ObjectState::default()),
            busy: BusyFlag::default(),
        }
    }

    /// Builds an object from a reply body, e.g. one element of a query result.
    pub(crate) fn from_reply(
        client: ParseClient,
        class_name: impl Into<String>,
        reply: JsonObject,
    ) -> Result<Self, ParseError> {
        let object = Self::new(client, class_name);
        object.apply_reply(JsonObject::new(), reply)?;
        Ok(object)
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn object_id(&self) -> Option<String> {
        self.state()
            .snapshot
            .get("objectId")
            .and_then(JsonValue::as_str)
            .filter(|id| !id.is_empty())
            .map(ToOwned::to_owned)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        date_field(&self.state().snapshot, "createdAt")
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        date_field(&self.state().snapshot, "updatedAt")
    }

    pub fn busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.state().data.get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.state().data.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.state().data.remove(key)
    }

    pub fn data(&self) -> BTreeMap<String, Value> {
        self.state().data.clone()
    }

    /// Creates the object when it has no id yet, otherwise sends the keys
    /// that changed since the last confirmed snapshot.
    pub async fn save(&self) -> Result<(), ParseError> {
        let _busy = self.busy.acquire("object")?;
        let (data, snapshot) = {
            let state = self.state();
            (state.data.clone(), state.snapshot.clone())
        };

        let sent = without_server_keys(self.client.tagger().map_to_wire(&data)?);
        let object_id = snapshot
            .get("objectId")
            .and_then(JsonValue::as_str)
            .filter(|id| !id.is_empty())
            .map(ToOwned::to_owned);

        match object_id {
            None => {
                let span = tracing::info_span!("parse_create", class = %self.class_name);
                let reply = self
                    .client
                    .send_json(
                        reqwest::Method::POST,
                        &self.class_path(None),
                        &JsonValue::Object(sent.clone()),
                        201,
                    )
                    .instrument(span)
                    .await?;
                self.apply_reply(sent, reply_object(reply)?)
            }
            Some(object_id) => {
                let span = tracing::info_span!(
                    "parse_update",
                    class = %self.class_name,
                    object_id = %object_id,
                );
                let changes = diff(&without_server_keys(snapshot.clone()), &sent);
                let reply = self
                    .client
                    .send_json(
                        reqwest::Method::PUT,
                        &self.class_path(Some(&object_id)),
                        &JsonValue::Object(changes),
                        200,
                    )
                    .instrument(span)
                    .await?;
                self.apply_reply(merge(snapshot, sent), reply_object(reply)?)
            }
        }
    }

    /// Deletes the object on the backend. Local data is kept; the object
    /// loses its id and would be created anew by a later `save`.
    pub async fn erase(&self) -> Result<(), ParseError> {
        let _busy = self.busy.acquire("object")?;
        let object_id = self.object_id().ok_or(ParseError::MissingObjectId)?;

        let span = tracing::info_span!(
            "parse_erase",
            class = %self.class_name,
            object_id = %object_id,
        );
        self.client
            .delete(&self.class_path(Some(&object_id)), 200)
            .instrument(span)
            .await?;
        self.state().snapshot = JsonObject::new();
        Ok(())
    }

    fn class_path(&self, object_id: Option<&str>) -> String {
        class_path(&self.class_name, object_id)
    }

    /// Only the fields present in `reply` are written into local data, so
    /// edits made while the request was in flight survive. The new snapshot
    /// is `base` overlaid with the reply. A reply that fails to convert
    /// leaves the object untouched.
    fn apply_reply(&self, base: JsonObject, reply: JsonObject) -> Result<(), ParseError> {
        let native = self.client.tagger().map_to_native(&reply)?;
        let mut state = self.state();
        state.data.extend(native);
        state.snapshot = merge(base, reply);
        Ok(())
    }

    fn state(&self) -> MutexGuard<'_, ObjectState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn class_path(class_name: &str, object_id: Option<&str>) -> String {
    match object_id {
        Some(id) => format!("classes/{class_name}/{}", urlencoding::encode(id)),
        None => format!("classes/{class_name}"),
    }
}

fn date_field(snapshot: &JsonObject, key: &str) -> Option<DateTime<Utc>> {
    snapshot
        .get(key)
        .and_then(JsonValue::as_str)
        .and_then(date_from_string)
}

pub(crate) fn reply_object(reply: JsonValue) -> Result<JsonObject, ParseError> {
    match reply {
        JsonValue::Object(map) => Ok(map),
        JsonValue::Null => Ok(JsonObject::new()),
        other => Err(ParseError::InvalidResponse(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

fn without_server_keys(mut map: JsonObject) -> JsonObject {
    for key in SERVER_KEYS {
        map.remove(key);
    }
    map
}

fn merge(mut base: JsonObject, other: JsonObject) -> JsonObject {
    base.extend(other);
    base
}

/// Entries of `other` whose value differs from (or is absent in) `base`.
fn diff(base: &JsonObject, other: &JsonObject) -> JsonObject {
    other
        .iter()
        .filter(|(key, value)| base.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
