//! Client SDK for the Make API.
//!
//! # Overview
//! `Make` is both a fluent search builder and the entry point for the flat
//! API calls (create, update, like, report, ...). Search hits come back as
//! `WrappedMake` values that classify their tags and can query for their
//! remixes, localized versions and original.
//!
//! ```no_run
//! use makeapi_core::{Make, MakeOptions};
//!
//! # fn main() -> Result<(), makeapi_core::MakeError> {
//! let mut make = Make::connect(MakeOptions::new("https://makeapi.example.org"))?;
//! let results = make.tags(["webmaker.org:featured"], false).limit(10).then()?;
//! for hit in &results.makes {
//!     println!("{} {:?}", hit.title, hit.raw_tags());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - The wire step is a `Transport` capability; `UreqTransport` is the
//!   default and tests script their own.
//! - A `Strategy` fixed at construction decides how requests are decorated
//!   and responses interpreted (server-side library vs. browser session).
//! - Request signing is delegated to a caller-supplied `RequestSigner`.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod query;
pub mod signing;
pub mod strategy;
pub mod tags;
pub mod transport;
pub mod types;
pub mod wrap;

#[cfg(test)]
mod testing;

pub use client::{Make, SearchResults, API_PREFIX, DEFAULT_TAG_SUGGESTIONS};
pub use config::{BasicAuth, Credentials, MakeOptions};
pub use error::{MakeError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use query::{Execution, IdQuery, SortDirection, TermList};
pub use signing::{Artifacts, RequestSigner, SignedHeader};
pub use strategy::{Payload, Strategy};
pub use tags::TagKind;
pub use transport::{Transport, UreqTransport};
pub use types::{MakeData, RemixRange, TagCount, TagSuggestions};
pub use wrap::WrappedMake;
