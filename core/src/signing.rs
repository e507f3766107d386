//! Challenge-response request signing seam.
//!
//! The client never computes MACs itself. A `RequestSigner` (typically a Hawk
//! implementation holding the caller's credentials) produces the
//! `Authorization` header for a request and later checks that the server's
//! response authenticates against the artifacts it produced.

use serde_json::{Map, Value};

use crate::http::{HttpMethod, HttpResponse};

/// Signer-specific values captured while signing a request, e.g. timestamp,
/// nonce and MAC. Handed back unchanged to `RequestSigner::authenticate`.
pub type Artifacts = Map<String, Value>;

/// Result of signing one request.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedHeader {
    /// Complete `Authorization` header value.
    pub field: String,
    pub artifacts: Artifacts,
}

pub trait RequestSigner: Send + Sync {
    /// Sign `method` + `url` exactly as they will be sent.
    fn header(
        &self,
        method: HttpMethod,
        url: &str,
    ) -> Result<SignedHeader, Box<dyn std::error::Error + Send + Sync>>;

    /// Check a response against the artifacts of its request and the
    /// response body exactly as received (empty when the server sent none).
    fn authenticate(&self, response: &HttpResponse, artifacts: &Artifacts, payload: &str) -> bool;
}
