use parsekit_core::{JsonValue, QueryConstraints, Value};
use tracing::Instrument;

use crate::busy::BusyFlag;
use crate::object::{class_path, reply_object};
use crate::{ParseClient, ParseError, ParseObject};

/// Fetches objects of one class, by id or by constraints.
#[derive(Debug)]
pub struct ParseQuery {
    client: ParseClient,
    class_name: String,
    constraints: QueryConstraints,
    busy: BusyFlag,
}

impl ParseQuery {
    pub fn new(client: ParseClient, class_name: impl Into<String>) -> Self {
        Self {
            client,
            class_name: class_name.into(),
            constraints: QueryConstraints::new(),
            busy: BusyFlag::default(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn constraints(&self) -> &QueryConstraints {
        &self.constraints
    }

    pub fn busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn limit(&self) -> i64 {
        self.constraints.limit()
    }

    pub fn skip(&self) -> i64 {
        self.constraints.skip()
    }

    pub fn where_less_than(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ParseError> {
        self.constraints.where_less_than(key, value)?;
        Ok(self)
    }

    pub fn where_less_than_or_equal_to(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ParseError> {
        self.constraints.where_less_than_or_equal_to(key, value)?;
        Ok(self)
    }

    pub fn where_greater_than(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ParseError> {
        self.constraints.where_greater_than(key, value)?;
        Ok(self)
    }

    pub fn where_greater_than_or_equal_to(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ParseError> {
        self.constraints.where_greater_than_or_equal_to(key, value)?;
        Ok(self)
    }

    pub fn where_not_equal_to(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ParseError> {
        self.constraints.where_not_equal_to(key, value)?;
        Ok(self)
    }

    pub fn order_by_ascending(&mut self, key: impl Into<String>) -> Result<&mut Self, ParseError> {
        self.constraints.order_by_ascending(key)?;
        Ok(self)
    }

    pub fn add_ascending_order(&mut self, key: impl Into<String>) -> Result<&mut Self, ParseError> {
        self.constraints.add_ascending_order(key)?;
        Ok(self)
    }

    pub fn order_by_descending(&mut self, key: impl Into<String>) -> Result<&mut Self, ParseError> {
        self.constraints.order_by_descending(key)?;
        Ok(self)
    }

    pub fn add_descending_order(
        &mut self,
        key: impl Into<String>,
    ) -> Result<&mut Self, ParseError> {
        self.constraints.add_descending_order(key)?;
        Ok(self)
    }

    /// -1 leaves the page size to the backend.
    pub fn set_limit(&mut self, limit: i64) -> Result<&mut Self, ParseError> {
        self.constraints.set_limit(limit)?;
        Ok(self)
    }

    pub fn set_skip(&mut self, skip: i64) -> Result<&mut Self, ParseError> {
        self.constraints.set_skip(skip)?;
        Ok(self)
    }

    pub async fn get_object_by_id(&self, object_id: &str) -> Result<ParseObject, ParseError> {
        let _busy = self.busy.acquire("query")?;
        if object_id.is_empty() {
            return Err(ParseError::MissingObjectId);
        }

        let span = tracing::info_span!(
            "parse_get",
            class = %self.class_name,
            object_id = %object_id,
        );
        let reply = self
            .client
            .get_json(&class_path(&self.class_name, Some(object_id)), "", 200)
            .instrument(span)
            .await?;

        ParseObject::from_reply(self.client.clone(), &self.class_name, reply_object(reply)?)
    }

    pub async fn find_objects(&self) -> Result<Vec<ParseObject>, ParseError> {
        let _busy = self.busy.acquire("query")?;
        let query = self.constraints.to_query_string(self.client.tagger())?;

        let span = tracing::info_span!(
            "parse_find",
            class = %self.class_name,
            limit = self.constraints.limit(),
            skip = self.constraints.skip(),
        );
        let reply = self
            .client
            .get_json(&class_path(&self.class_name, None), &query, 200)
            .instrument(span)
            .await?;

        let results = match reply {
            JsonValue::Object(mut map) => map.remove("results"),
            _ => None,
        };
        let Some(JsonValue::Array(results)) = results else {
            return Err(ParseError::InvalidResponse(
                "find reply is missing the 'results' array".to_string(),
            ));
        };

        results
            .into_iter()
            .map(|entry| {
                ParseObject::from_reply(self.client.clone(), &self.class_name, reply_object(entry)?)
            })
            .collect()
    }
}
