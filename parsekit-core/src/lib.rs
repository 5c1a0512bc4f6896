//! Core value model for the Parse REST client.
//!
//! This crate holds the parts of the client that do not touch the network:
//! - `Value`, the native value tree exchanged with application code,
//! - the tagger converting between native values and the `__type`-tagged
//!   JSON the backend speaks (`to_wire`, `to_native`, `TagHook`),
//! - the query-string builder for filter, sort and paging constraints.

pub mod constraint;
pub mod date;
mod error;
pub mod tag;
mod types;
mod value;

pub use constraint::{
    serialize_constraints, Comparison, ConstraintSet, OrderKey, OrderList, QueryConstraints,
    SortDirection,
};
pub use date::{date_from_string, string_from_date};
pub use error::{ConstraintError, TagError};
pub use tag::{to_native, to_wire, TagHook, Tagger};
pub use types::ParseTypes;
pub use value::Value;

/// The tree produced and consumed by the JSON codec.
pub type JsonValue = serde_json::Value;
