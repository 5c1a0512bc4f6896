//! Query-string construction for filter, sort and paging constraints.
//!
//! The output feeds the backend's own parser, so segment order and
//! formatting are fixed: `where`, then `order`, then `limit`, then `skip`,
//! joined with `&`, each segment present only when it applies.

use std::collections::BTreeMap;

use serde_json::Map as JsonMap;

use crate::{ConstraintError, JsonValue, TagError, Tagger, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Comparison {
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    NotEqualTo,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::LessThan => "$lt",
            Comparison::LessThanOrEqualTo => "$lte",
            Comparison::GreaterThan => "$gt",
            Comparison::GreaterThanOrEqualTo => "$gte",
            Comparison::NotEqualTo => "$ne",
        }
    }
}

/// Per-field comparison constraints. Inserting an operator twice for the
/// same field replaces the earlier value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstraintSet {
    fields: BTreeMap<String, BTreeMap<Comparison, Value>>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        field: impl Into<String>,
        op: Comparison,
        value: impl Into<Value>,
    ) -> Result<(), ConstraintError> {
        let field = field.into();
        if field.is_empty() {
            return Err(ConstraintError::EmptyFieldName);
        }
        self.fields
            .entry(field)
            .or_default()
            .insert(op, value.into());
        Ok(())
    }

    pub fn get(&self, field: &str) -> Option<&BTreeMap<Comparison, Value>> {
        self.fields.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// `{"field": {"$op": <wire value>, ..}, ..}`
    pub fn to_wire(&self, tagger: &Tagger) -> Result<JsonValue, TagError> {
        let mut out = JsonMap::new();
        for (field, ops) in &self.fields {
            let mut inner = JsonMap::new();
            for (op, value) in ops {
                inner.insert(op.as_str().to_string(), tagger.to_wire(value)?);
            }
            out.insert(field.clone(), JsonValue::Object(inner));
        }
        Ok(JsonValue::Object(out))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderKey {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderList {
    keys: Vec<OrderKey>,
}

impl OrderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        field: impl Into<String>,
        direction: SortDirection,
    ) -> Result<(), ConstraintError> {
        let field = field.into();
        if field.is_empty() {
            return Err(ConstraintError::EmptyFieldName);
        }
        self.keys.push(OrderKey { field, direction });
        Ok(())
    }

    /// Clears the list, then appends one key.
    pub fn set(
        &mut self,
        field: impl Into<String>,
        direction: SortDirection,
    ) -> Result<(), ConstraintError> {
        let field = field.into();
        if field.is_empty() {
            return Err(ConstraintError::EmptyFieldName);
        }
        self.keys.clear();
        self.keys.push(OrderKey { field, direction });
        Ok(())
    }

    /// Builds a list from `(field, direction)` pairs, rejecting empty names.
    pub fn from_keys<I, S>(keys: I) -> Result<Self, ConstraintError>
    where
        I: IntoIterator<Item = (S, SortDirection)>,
        S: Into<String>,
    {
        let mut order = Self::new();
        for (field, direction) in keys {
            order.push(field, direction)?;
        }
        Ok(order)
    }

    pub fn keys(&self) -> &[OrderKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    // Keys are concatenated without a separator; see DESIGN.md.
    fn encode(&self) -> String {
        let mut out = String::new();
        for key in &self.keys {
            if key.direction == SortDirection::Descending {
                out.push('-');
            }
            out.push_str(&urlencoding::encode(&key.field));
        }
        out
    }
}


/// Builds the GET query component. `limit` of -1 or below means unset;
/// `skip` of 0 or below is omitted.
pub fn serialize_constraints(
    constraints: &ConstraintSet,
    order: &OrderList,
    limit: i64,
    skip: i64,
) -> Result<String, TagError> {
    Tagger::new().serialize_constraints(constraints, order, limit, skip)
}

impl Tagger {
    pub fn serialize_constraints(
        &self,
        constraints: &ConstraintSet,
        order: &OrderList,
        limit: i64,
        skip: i64,
    ) -> Result<String, TagError> {
        let mut segments = Vec::with_capacity(4);

        if !constraints.is_empty() {
            let wire = constraints.to_wire(self)?;
            let json = serde_json::to_vec(&wire)
                .map_err(|err| TagError::EncodeFailure(err.to_string()))?;
            segments.push(format!("where={}", urlencoding::encode_binary(&json)));
        }

        if !order.is_empty() {
            segments.push(format!("order={}", order.encode()));
        }

        if limit > -1 {
            segments.push(format!("limit={limit}"));
        }

        if skip > 0 {
            segments.push(format!("skip={skip}"));
        }

        Ok(segments.join("&"))
    }
}

/// Incrementally built query state: constraints, sort order and paging.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryConstraints {
    constraints: ConstraintSet,
    order: OrderList,
    limit: i64,
    skip: i64,
}

impl Default for QueryConstraints {
    fn default() -> Self {
        Self {
            constraints: ConstraintSet::new(),
            order: OrderList::new(),
            limit: -1,
            skip: 0,
        }
    }
}

impl QueryConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_less_than(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ConstraintError> {
        self.constraints.insert(field, Comparison::LessThan, value)?;
        Ok(self)
    }

    pub fn where_less_than_or_equal_to(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ConstraintError> {
        self.constraints
            .insert(field, Comparison::LessThanOrEqualTo, value)?;
        Ok(self)
    }

    pub fn where_greater_than(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ConstraintError> {
        self.constraints
            .insert(field, Comparison::GreaterThan, value)?;
        Ok(self)
    }

    pub fn where_greater_than_or_equal_to(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ConstraintError> {
        self.constraints
            .insert(field, Comparison::GreaterThanOrEqualTo, value)?;
        Ok(self)
    }

    pub fn where_not_equal_to(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ConstraintError> {
        self.constraints.insert(field, Comparison::NotEqualTo, value)?;
        Ok(self)
    }

    pub fn order_by_ascending(
        &mut self,
        field: impl Into<String>,
    ) -> Result<&mut Self, ConstraintError> {
        self.order.set(field, SortDirection::Ascending)?;
        Ok(self)
    }

    pub fn add_ascending_order(
        &mut self,
        field: impl Into<String>,
    ) -> Result<&mut Self, ConstraintError> {
        self.order.push(field, SortDirection::Ascending)?;
        Ok(self)
    }

    pub fn order_by_descending(
        &mut self,
        field: impl Into<String>,
    ) -> Result<&mut Self, ConstraintError> {
        self.order.set(field, SortDirection::Descending)?;
        Ok(self)
    }

    pub fn add_descending_order(
        &mut self,
        field: impl Into<String>,
    ) -> Result<&mut Self, ConstraintError> {
        self.order.push(field, SortDirection::Descending)?;
        Ok(self)
    }

    pub fn set_limit(&mut self, limit: i64) -> Result<&mut Self, ConstraintError> {
        if limit < -1 {
            return Err(ConstraintError::InvalidLimit(limit));
        }
        self.limit = limit;
        Ok(self)
    }

    pub fn set_skip(&mut self, skip: i64) -> Result<&mut Self, ConstraintError> {
        if skip < 0 {
            return Err(ConstraintError::InvalidSkip(skip));
        }
        self.skip = skip;
        Ok(self)
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn order(&self) -> &OrderList {
        &self.order
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn skip(&self) -> i64 {
        self.skip
    }

    pub fn to_query_string(&self, tagger: &Tagger) -> Result<String, TagError> {
        tagger.serialize_constraints(&self.constraints, &self.order, self.limit, self.skip)
    }
}
