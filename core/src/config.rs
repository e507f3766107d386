//! Client configuration.
//!
//! # Design
//! `MakeOptions` mirrors the construction options of the Make API client:
//! base URL, optional signing credentials, optional `"user:pass"` basic auth
//! and an optional CSRF token. Options are resolved once into `Credentials`
//! when a `Make` is built and stay immutable afterwards; every builder forked
//! from that client and every record it wraps share them.

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::MakeError;
use crate::signing::RequestSigner;
use crate::strategy::Strategy;

pub const ENV_API_URL: &str = "MAKE_API_URL";
pub const ENV_AUTH: &str = "MAKE_API_AUTH";
pub const ENV_CSRF: &str = "MAKE_API_CSRF";

#[derive(Clone)]
pub struct MakeOptions {
    pub api_url: String,
    /// Signing credentials. Takes precedence over `auth` and routes searches
    /// to `protectedSearch`.
    pub hawk: Option<Arc<dyn RequestSigner>>,
    /// Basic auth as `"user:pass"`.
    pub auth: Option<String>,
    pub csrf: Option<String>,
    /// Overrides `Strategy::detect()`.
    pub strategy: Option<Strategy>,
}

impl MakeOptions {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            hawk: None,
            auth: None,
            csrf: None,
            strategy: None,
        }
    }

    pub fn with_hawk(mut self, signer: impl RequestSigner + 'static) -> Self {
        self.hawk = Some(Arc::new(signer));
        self
    }

    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    pub fn with_csrf(mut self, token: impl Into<String>) -> Self {
        self.csrf = Some(token.into());
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Read `MAKE_API_URL`, `MAKE_API_AUTH` and `MAKE_API_CSRF` from the
    /// process environment.
    pub fn from_env() -> Result<Self, MakeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with a custom variable source. Empty values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MakeError> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let api_url = get(ENV_API_URL)
            .ok_or_else(|| MakeError::Config(format!("{ENV_API_URL} is not set")))?;
        let mut options = Self::new(api_url);
        options.auth = get(ENV_AUTH);
        options.csrf = get(ENV_CSRF);
        Ok(options)
    }

    /// Base URL without trailing slashes.
    pub(crate) fn base_url(&self) -> Result<String, MakeError> {
        let url = self.api_url.trim_end_matches('/');
        if url.is_empty() {
            return Err(MakeError::Config("api_url is empty".to_string()));
        }
        Ok(url.to_string())
    }

    pub(crate) fn credentials(&self) -> Credentials {
        if let Some(signer) = &self.hawk {
            return Credentials::Signed(Arc::clone(signer));
        }
        match self.auth.as_deref() {
            Some(auth) if !auth.is_empty() => Credentials::Basic(BasicAuth::parse(auth)),
            _ => Credentials::None,
        }
    }
}

impl fmt::Debug for MakeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MakeOptions")
            .field("api_url", &self.api_url)
            .field("hawk", &self.hawk.is_some())
            .field("auth", &self.auth.as_ref().map(|_| "<redacted>"))
            .field("csrf", &self.csrf.as_ref().map(|_| "<redacted>"))
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Resolved authentication for one client.
#[derive(Clone)]
pub enum Credentials {
    None,
    Basic(BasicAuth),
    Signed(Arc<dyn RequestSigner>),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::Basic(auth) => f.debug_tuple("Basic").field(&auth.username).finish(),
            Credentials::Signed(_) => f.write_str("Signed"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: Option<String>,
}

impl BasicAuth {
    /// Split `"user:pass"` on the first `:`.
    pub fn parse(auth: &str) -> Self {
        match auth.split_once(':') {
            Some((user, pass)) => Self {
                username: user.to_string(),
                password: Some(pass.to_string()),
            },
            None => Self {
                username: auth.to_string(),
                password: None,
            },
        }
    }

    /// Both halves present and non-empty.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// `Authorization` header value.
    pub fn header_value(&self) -> String {
        let pair = format!("{}:{}", self.username, self.password.as_deref().unwrap_or(""));
        format!("Basic {}", STANDARD.encode(pair))
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
