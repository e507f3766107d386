//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::client::Make;
use crate::config::MakeOptions;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::signing::{Artifacts, RequestSigner, SignedHeader};
use crate::strategy::Strategy;
use crate::transport::Transport;

pub const API_URL: &str = "http://makes.test";

pub fn respond(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    })
}

/// Records every request and replays canned responses in order. Runs out
/// into a transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<HttpResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.into()),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("no scripted response left")))
    }
}

/// Signer that writes a readable header and accepts or rejects every
/// response. Remembers the payloads it was asked to authenticate.
pub struct StaticSigner {
    accept: bool,
    payloads: Arc<Mutex<Vec<String>>>,
}

impl StaticSigner {
    pub fn accepting() -> Self {
        Self {
            accept: true,
            payloads: Arc::default(),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            accept: false,
            payloads: Arc::default(),
        }
    }

    pub fn payloads(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.payloads)
    }
}

impl RequestSigner for StaticSigner {
    fn header(
        &self,
        method: HttpMethod,
        url: &str,
    ) -> Result<SignedHeader, Box<dyn std::error::Error + Send + Sync>> {
        let mut artifacts = Artifacts::new();
        artifacts.insert("method".to_string(), Value::from(method.as_str()));
        artifacts.insert("resource".to_string(), Value::from(url));
        Ok(SignedHeader {
            field: format!(r#"Hawk id="test", mac="{method} {url}""#),
            artifacts,
        })
    }

    fn authenticate(&self, _response: &HttpResponse, artifacts: &Artifacts, payload: &str) -> bool {
        self.payloads.lock().unwrap().push(payload.to_string());
        self.accept && artifacts.contains_key("method")
    }
}

/// Server-strategy client over the given script.
pub fn scripted(
    options: MakeOptions,
    responses: Vec<Result<HttpResponse, TransportError>>,
) -> (Make, Arc<ScriptedTransport>) {
    let transport = ScriptedTransport::new(responses);
    let options = MakeOptions {
        strategy: options.strategy.or(Some(Strategy::Server)),
        ..options
    };
    let make = Make::new(options, Arc::clone(&transport)).unwrap();
    (make, transport)
}

/// Client whose transport has nothing to say; for query-building tests.
pub fn make() -> Make {
    scripted(MakeOptions::new(API_URL), Vec::new()).0
}
