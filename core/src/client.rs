//! The `Make` facade: query builder plus one-shot API calls.
//!
//! # Design
//! `Make` pairs an immutable, shared configuration (`Arc<Shared>`) with its
//! own list of pending search predicates. Predicate methods (see `query`)
//! take `&mut self` and chain; `then()` drains the list and runs the search,
//! so one builder cannot interleave two searches. `fork()` hands out another
//! builder over the same configuration, which is also how wrapped records
//! re-enter the API without re-resolving credentials.
//!
//! The remaining calls (`create`, `update`, `like`, ...) each perform exactly
//! one request and leave the pending predicates untouched.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::MakeOptions;
use crate::error::MakeError;
use crate::http::HttpMethod;
use crate::query::{encode, QueryPairs};
use crate::strategy::{Dispatcher, Payload, Strategy};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    MakeData, MakerBody, RemixCount, RemixRange, SearchResponse, TagSuggestions,
};
use crate::wrap::WrappedMake;

/// Versioned path of every make endpoint.
pub const API_PREFIX: &str = "/api/20130724/make/";

/// Suggestions requested by `autocomplete_tags` when no size is given.
pub const DEFAULT_TAG_SUGGESTIONS: u32 = 10;

pub(crate) struct Shared {
    pub(crate) dispatcher: Dispatcher,
    search_path: &'static str,
}

/// Client for the Make API.
pub struct Make {
    pub(crate) shared: Arc<Shared>,
    pub(crate) pairs: QueryPairs,
}

/// Outcome of a search.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub makes: Vec<WrappedMake>,
    pub total: u64,
}

impl Make {
    pub fn new(options: MakeOptions, transport: impl Transport + 'static) -> Result<Self, MakeError> {
        let dispatcher = Dispatcher::new(&options, Box::new(transport))?;
        let search_path = if dispatcher.is_signed() {
            "protectedSearch"
        } else {
            "search"
        };
        Ok(Self::from_shared(Arc::new(Shared {
            dispatcher,
            search_path,
        })))
    }

    /// Client over a default `UreqTransport`.
    pub fn connect(options: MakeOptions) -> Result<Self, MakeError> {
        Self::new(options, UreqTransport::new())
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            pairs: QueryPairs::new(),
        }
    }

    /// A new builder with no pending predicates over the same configuration.
    pub fn fork(&self) -> Self {
        Self::from_shared(Arc::clone(&self.shared))
    }

    pub fn strategy(&self) -> Strategy {
        self.shared.dispatcher.strategy()
    }

    /// Run the search built so far and clear the pending predicates.
    pub fn then(&mut self) -> Result<SearchResults, MakeError> {
        let query = self.pairs.take();
        let path = format!("{API_PREFIX}{}", self.shared.search_path);
        let data = self
            .shared
            .dispatcher
            .dispatch(HttpMethod::Get, &path, Payload::Query(query))?;

        if data.is_null() {
            return Ok(SearchResults::default());
        }
        let response: SearchResponse =
            serde_json::from_value(data).map_err(|e| MakeError::Deserialization(e.to_string()))?;
        let Some(makes) = response.makes else {
            return Ok(SearchResults::default());
        };

        debug!(hits = makes.len(), total = ?response.total, "search completed");
        let makes = makes
            .into_iter()
            .map(|make| WrappedMake::new(make, Arc::clone(&self.shared)))
            .collect();
        Ok(SearchResults {
            makes,
            total: response.total.unwrap_or_default(),
        })
    }

    pub fn create<T: Serialize + ?Sized>(&self, make: &T) -> Result<MakeData, MakeError> {
        self.call(HttpMethod::Post, API_PREFIX.to_string(), json_payload(make)?)
    }

    pub fn update<T: Serialize + ?Sized>(&self, id: &str, make: &T) -> Result<MakeData, MakeError> {
        self.call(HttpMethod::Put, format!("{API_PREFIX}{id}"), json_payload(make)?)
    }

    pub fn remove(&self, id: &str) -> Result<MakeData, MakeError> {
        self.call(HttpMethod::Delete, format!("{API_PREFIX}{id}"), Payload::Empty)
    }

    pub fn like(&self, id: &str, maker: &str) -> Result<MakeData, MakeError> {
        self.maker_call("like", id, maker)
    }

    pub fn unlike(&self, id: &str, maker: &str) -> Result<MakeData, MakeError> {
        self.maker_call("unlike", id, maker)
    }

    pub fn report(&self, id: &str, maker: &str) -> Result<MakeData, MakeError> {
        self.maker_call("report", id, maker)
    }

    pub fn cancel_report(&self, id: &str, maker: &str) -> Result<MakeData, MakeError> {
        self.maker_call("cancelReport", id, maker)
    }

    /// Number of remixes of `id`, optionally bounded in time. Missing bounds
    /// are sent empty.
    pub fn remix_count(&self, id: &str, range: RemixRange) -> Result<u64, MakeError> {
        let bound = |v: Option<i64>| v.map(|v| v.to_string()).unwrap_or_default();
        let query = format!(
            "id={}&from={}&to={}",
            encode(id),
            bound(range.from),
            bound(range.to)
        );
        let count: RemixCount = self.call(
            HttpMethod::Get,
            format!("{API_PREFIX}remixCount"),
            Payload::Query(query),
        )?;
        Ok(count.count)
    }

    /// Tags starting with `term`; `size` defaults to
    /// `DEFAULT_TAG_SUGGESTIONS`.
    pub fn autocomplete_tags(
        &self,
        term: &str,
        size: Option<u32>,
    ) -> Result<TagSuggestions, MakeError> {
        let size = size.unwrap_or(DEFAULT_TAG_SUGGESTIONS);
        let query = format!("t={}&s={size}", encode(term));
        self.call(HttpMethod::Get, format!("{API_PREFIX}tags"), Payload::Query(query))
    }

    fn maker_call(&self, action: &str, id: &str, maker: &str) -> Result<MakeData, MakeError> {
        let body = MakerBody {
            maker: maker.to_string(),
        };
        self.call(
            HttpMethod::Put,
            format!("{API_PREFIX}{action}/{id}"),
            json_payload(&body)?,
        )
    }

    fn call<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: String,
        payload: Payload,
    ) -> Result<T, MakeError> {
        let data = self.shared.dispatcher.dispatch(method, &path, payload)?;
        serde_json::from_value(data).map_err(|e| MakeError::Deserialization(e.to_string()))
    }
}

impl fmt::Debug for Make {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Make")
            .field("strategy", &self.strategy())
            .field("search_path", &self.shared.search_path)
            .field("pending", &self.pairs.to_query_string())
            .finish()
    }
}

fn json_payload<T: Serialize + ?Sized>(value: &T) -> Result<Payload, MakeError> {
    serde_json::to_value(value)
        .map(Payload::Json)
        .map_err(|e| MakeError::Serialization(e.to_string()))
}
