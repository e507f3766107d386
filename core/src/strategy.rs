//! Request dispatch strategies.
//!
//! # Overview
//! The Make API is consumed from two kinds of host. A server-side host talks
//! to the API with its own HTTP library, authenticates with basic auth or a
//! request signer, and treats any status other than 200 as an error payload.
//! A browser-side host rides on the page's session: it sends a CSRF token,
//! always expects a JSON body, and reports failures through an `error` field.
//!
//! # Design
//! A client picks one `Strategy` at construction and keeps it for its whole
//! life. `Dispatcher` owns the resolved configuration and the `Transport`;
//! each call builds an `HttpRequest`, decorates it per strategy, executes it,
//! and interprets the `HttpResponse` per strategy.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{Credentials, MakeOptions};
use crate::error::MakeError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::truthy;
use crate::transport::Transport;

pub const CSRF_HEADER: &str = "X-CSRF-Token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Library-backed HTTP with basic auth or request signing.
    Server,
    /// Browser-session semantics: CSRF header and `error`-field responses.
    Browser,
}

impl Strategy {
    /// `Browser` when compiled for `wasm32`, `Server` everywhere else.
    pub fn detect() -> Self {
        if cfg!(target_arch = "wasm32") {
            Strategy::Browser
        } else {
            Strategy::Server
        }
    }
}

/// What accompanies a request besides its path.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Nothing.
    Empty,
    /// JSON body.
    Json(Value),
    /// Already-encoded query string, appended after `?` when non-empty.
    Query(String),
}

pub(crate) struct Dispatcher {
    api_url: String,
    strategy: Strategy,
    credentials: Credentials,
    csrf: Option<String>,
    transport: Box<dyn Transport>,
}

impl Dispatcher {
    pub(crate) fn new(
        options: &MakeOptions,
        transport: Box<dyn Transport>,
    ) -> Result<Self, MakeError> {
        Ok(Self {
            api_url: options.base_url()?,
            strategy: options.strategy.unwrap_or_else(Strategy::detect),
            credentials: options.credentials(),
            csrf: options.csrf.clone().filter(|t| !t.is_empty()),
            transport,
        })
    }

    pub(crate) fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub(crate) fn is_signed(&self) -> bool {
        matches!(self.credentials, Credentials::Signed(_))
    }

    /// Send one request to `path` (relative to the API URL) and return the
    /// parsed success body.
    pub(crate) fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Payload,
    ) -> Result<Value, MakeError> {
        let mut request = HttpRequest::new(method, format!("{}{path}", self.api_url));
        match payload {
            Payload::Empty => {}
            Payload::Json(body) => {
                let body = serde_json::to_string(&body)
                    .map_err(|e| MakeError::Serialization(e.to_string()))?;
                request.body = Some(body);
            }
            Payload::Query(query) => {
                if !query.is_empty() {
                    request.url.push('?');
                    request.url.push_str(&query);
                }
            }
        }

        debug!(method = %method, url = %request.url, strategy = ?self.strategy, "dispatching make api request");
        match self.strategy {
            Strategy::Server => self.server(request),
            Strategy::Browser => self.browser(request),
        }
    }

    fn server(&self, mut request: HttpRequest) -> Result<Value, MakeError> {
        request
            .headers
            .push(("Content-Type".to_string(), "application/json".to_string()));

        let mut signed = None;
        match &self.credentials {
            Credentials::Basic(auth) if auth.is_complete() => {
                request
                    .headers
                    .push(("Authorization".to_string(), auth.header_value()));
            }
            Credentials::Signed(signer) => {
                let header = signer
                    .header(request.method, &request.url)
                    .map_err(|e| MakeError::Signing(e.to_string()))?;
                request
                    .headers
                    .push(("Authorization".to_string(), header.field));
                signed = Some((signer, header.artifacts));
            }
            _ => {}
        }

        let response = self.transport.execute(request)?;
        debug!(status = response.status, "make api response");
        let body = parse_lenient(&response);

        // Signatures cover the body bytes exactly as received.
        if let Some((signer, artifacts)) = signed {
            if !signer.authenticate(&response, &artifacts, &response.body) {
                warn!(status = response.status, "make api response failed authentication");
                return Err(MakeError::Untrusted);
            }
        }

        if response.status == 200 {
            Ok(body)
        } else {
            Err(MakeError::Application(body))
        }
    }

    fn browser(&self, mut request: HttpRequest) -> Result<Value, MakeError> {
        if let Credentials::Basic(auth) = &self.credentials {
            request
                .headers
                .push(("Authorization".to_string(), auth.header_value()));
        }
        if let Some(token) = &self.csrf {
            request.headers.push((CSRF_HEADER.to_string(), token.clone()));
        }
        request.headers.push((
            "Content-Type".to_string(),
            "application/json; charset=utf-8".to_string(),
        ));

        let response = self.transport.execute(request)?;
        debug!(status = response.status, "make api response");
        let body: Value = serde_json::from_str(&response.body)
            .map_err(|e| MakeError::Deserialization(e.to_string()))?;
        if !body.is_object() {
            return Err(MakeError::Deserialization(format!(
                "expected a JSON object, got {body}"
            )));
        }
        if let Some(error) = body.get("error").filter(|e| truthy(e)) {
            return Err(MakeError::Application(error.clone()));
        }
        Ok(body)
    }
}

/// JSON body of a response; an empty body is `null` and anything that is not
/// JSON is kept as a string.
fn parse_lenient(response: &HttpResponse) -> Value {
    if response.body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&response.body).unwrap_or_else(|_| Value::String(response.body.clone()))
}
