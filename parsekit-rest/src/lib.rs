//! Parse REST client.
//!
//! This crate provides:
//! - `ParseClient`, built with `ParseClient::builder()`, holding the
//!   application id, REST API key, base URL and tag hook,
//! - `ParseObject` for saving and erasing rows of a class,
//! - `ParseQuery` for fetching rows by id or by constraints,
//! - `ParseFile` for uploading and downloading blobs.
//!
//! Environment variables commonly used in examples:
//! - `PARSE_APPLICATION_ID`
//! - `PARSE_REST_API_KEY`

mod busy;
pub mod client;
mod config;
mod error;
pub mod file;
mod object;
mod query;

pub use client::ParseClient;
pub use config::ParseClientBuilder;
pub use error::{ErrorDomain, ParseError};
pub use file::ParseFile;
pub use object::ParseObject;
pub use query::ParseQuery;
