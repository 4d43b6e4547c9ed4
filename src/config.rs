use log::debug;
use reqwest::{Client, redirect};
use std::fmt;
use std::time::Duration;

use crate::document::ResponseFormat;
use crate::error::{Error, Result};
use crate::http::ErrorMode;
use crate::session::RetryPolicy;

/// Host every endpoint path is resolved against.
pub const DEFAULT_API_HOST: &str = "http://partners.api.skyscanner.net";

/// Request timeout applied to every exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Validated API key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::InvalidCredentials);
        }
        Ok(Self(api_key))
    }

    pub fn api_key(&self) -> &str {
        &self.0
    }

    /// Key with everything but the first and last characters hidden.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}*********{}", head, tail)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credentials").field(&self.masked()).finish()
    }
}

/// Everything needed to build a [`crate::http::Transport`].
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_host: String,
    pub response_format: ResponseFormat,
    pub error_mode: ErrorMode,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_host: DEFAULT_API_HOST.to_string(),
            response_format: ResponseFormat::default(),
            error_mode: ErrorMode::default(),
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_api_host(mut self, api_host: impl Into<String>) -> Self {
        self.api_host = api_host.into();
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }

    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the reqwest client used for every exchange.
    ///
    /// Redirects are not followed: session creation reads the poll location
    /// from the `Location` header itself.
    pub fn build_client(&self) -> Result<Client> {
        if let Ok(credentials) = Credentials::new(self.api_key.as_str()) {
            debug!("Using API key {}", credentials.masked());
        }

        let client = Client::builder()
            .user_agent(concat!("skypoll/", env!("SKYPOLL_VERSION")))
            .timeout(self.timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(client)
    }
}
