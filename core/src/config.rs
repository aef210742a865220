//! Client configuration.
//!
//! A `ClientConfig` is fixed once built. Credentials are folded into the
//! default `Authorization` header and not kept anywhere else.

use std::time::Duration;

use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

use crate::error::{RestError, Result};

pub const DEFAULT_ACCEPT: &str = "application/json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable settings shared by every request a `RestClient` makes.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    default_headers: HeaderMap,
    verify_tls: bool,
    debug: bool,
    timeout: Duration,
}

impl ClientConfig {
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            base_url: base_url.into(),
            user: String::new(),
            password: String::new(),
            verify_tls: true,
            debug: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read configuration from `REST_*` environment variables.
    ///
    /// `REST_BASE_URL` is required. `REST_USER`, `REST_PASSWORD`,
    /// `REST_VERIFY_TLS`, `REST_DEBUG` and `REST_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("REST_BASE_URL")
            .ok_or_else(|| RestError::Config("REST_BASE_URL is not set".to_string()))?;
        let mut builder = Self::builder(base_url);
        builder = builder.credentials(
            lookup("REST_USER").unwrap_or_default(),
            lookup("REST_PASSWORD").unwrap_or_default(),
        );
        if let Some(raw) = lookup("REST_VERIFY_TLS") {
            builder = builder.verify_tls(parse_bool("REST_VERIFY_TLS", &raw)?);
        }
        if let Some(raw) = lookup("REST_DEBUG") {
            builder = builder.debug(parse_bool("REST_DEBUG", &raw)?);
        }
        if let Some(raw) = lookup("REST_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| RestError::Config(format!("REST_TIMEOUT_SECS: not a number: {raw}")))?;
            if secs == 0 {
                return Err(RestError::Config("REST_TIMEOUT_SECS: must be at least 1".to_string()));
            }
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[derive(Clone)]
pub struct ClientConfigBuilder {
    base_url: String,
    user: String,
    password: String,
    verify_tls: bool,
    debug: bool,
    timeout: Duration,
}

impl ClientConfigBuilder {
    /// Basic authentication is only enabled when both values are non-empty.
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));

        if !self.user.is_empty() && !self.password.is_empty() {
            let mut value = HeaderValue::from_str(&basic_auth(&self.user, &self.password))
                .map_err(|_| RestError::InvalidHeader("authorization".to_string()))?;
            value.set_sensitive(true);
            default_headers.insert(AUTHORIZATION, value);
        }

        Ok(ClientConfig {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            default_headers,
            verify_tls: self.verify_tls,
            debug: self.debug,
            timeout: self.timeout,
        })
    }
}

impl std::fmt::Debug for ClientConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfigBuilder")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("verify_tls", &self.verify_tls)
            .field("debug", &self.debug)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn basic_auth(user: &str, password: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}"));
    format!("Basic {encoded}")
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RestError::Config(format!("{key}: not a boolean: {raw}"))),
    }
}
