//! Error types for the Make API client.
//!
//! # Design
//! Three failure families reach callers: the transport could not complete
//! the round-trip, the API answered with an error payload, or a signed
//! response failed authentication. The application payload is handed back
//! untouched as JSON since its shape belongs to the server.

use thiserror::Error;

/// Failure reported by a `Transport` implementation.
#[derive(Debug, Error)]
#[error("transport failure: {message}")]
pub struct TransportError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Errors returned by `Make` calls and wrapped-record helpers.
#[derive(Debug, Error)]
pub enum MakeError {
    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with an error payload: the body of a non-200
    /// response, or the `error` field of a browser-style response.
    #[error("application error: {0}")]
    Application(serde_json::Value),

    /// A signed response did not authenticate.
    #[error("Warning: The response does not authenticate - your traffic may be getting intercepted and modified")]
    Untrusted,

    /// The configured signer could not produce an Authorization header.
    #[error("request signing failed: {0}")]
    Signing(String),

    /// A request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A response body could not be deserialized.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MakeError {
    /// The server-supplied payload, when this is an application error.
    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            MakeError::Application(body) => Some(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untrusted_message_warns_about_interception() {
        let msg = MakeError::Untrusted.to_string();
        assert!(msg.contains("does not authenticate"));
        assert!(msg.contains("intercepted"));
    }

    #[test]
    fn transport_error_is_transparent() {
        let err: MakeError = TransportError::new("connection refused").into();
        assert_eq!(err.to_string(), "transport failure: connection refused");
        assert!(err.payload().is_none());
    }

    #[test]
    fn application_error_exposes_payload() {
        let err = MakeError::Application(serde_json::json!({"error": "nope"}));
        assert_eq!(err.payload().unwrap()["error"], "nope");
    }
}
