//! Parse SDK for Rust.
//!
//! The core codec (`Value`, `Tagger`, `QueryConstraints`) is always
//! available. The `rest` feature (on by default) adds `ParseClient` and the
//! object, query and file types built on it.
//!
//! ```no_run
//! # async fn run() -> Result<(), parsekit::ParseError> {
//! use parsekit::{ParseClient, ParseTypes};
//!
//! let client = ParseClient::builder()
//!     .application_id_from_env("PARSE_APPLICATION_ID")
//!     .api_key_from_env("PARSE_REST_API_KEY")
//!     .tag_hook(ParseTypes)
//!     .build()?;
//!
//! let score = client.object("GameScore");
//! score.set("score", 1337);
//! score.save().await?;
//!
//! let mut query = client.query("GameScore");
//! query.where_greater_than("score", 1000)?.set_limit(10)?;
//! let top = query.find_objects().await?;
//! # let _ = top;
//! # Ok(())
//! # }
//! ```

pub use parsekit_core::*;

#[cfg(feature = "rest")]
pub use parsekit_rest::{
    ErrorDomain, ParseClient, ParseClientBuilder, ParseError, ParseFile, ParseObject, ParseQuery,
};

#[cfg(feature = "rest")]
pub mod rest {
    pub use parsekit_rest::*;
}
