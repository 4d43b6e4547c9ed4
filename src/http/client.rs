//! The request executor.

use reqwest::StatusCode;
use tracing::{Instrument, debug};

use super::classify::{ErrorMode, with_error_handling};
use super::exchange::{Exchange, HttpExchange, RawResponse, RequestSpec};
use crate::config::{Config, Credentials};
use crate::document::{Document, ResponseFormat};
use crate::error::{Error, Result};
use crate::session::RetryPolicy;

/// Name of the query parameter carrying the API key.
const API_KEY_PARAM: &str = "apiKey";

/// Outcome of one executed request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status, absent when no response arrived.
    pub status: Option<u16>,
    /// `Location` header, used to discover poll URLs.
    pub location: Option<String>,
    /// Parsed body. Only absent in graceful or ignore mode, or for requests
    /// built with [`RequestSpec::headers_only`].
    pub parsed: Option<Document>,
}

/// Client bound to one API key, response format and error mode.
///
/// All requests go through [`Transport::make_request`]. The transport owns a
/// tracing span; every exchange and every classification is logged under it.
pub struct Transport<E: Exchange = HttpExchange> {
    exchange: E,
    credentials: Credentials,
    api_host: String,
    format: ResponseFormat,
    mode: ErrorMode,
    retry: RetryPolicy,
    span: tracing::Span,
}

impl Transport<HttpExchange> {
    /// Builds a transport backed by a reqwest client configured from `config`.
    pub fn new(config: Config) -> Result<Self> {
        let client = config.build_client()?;
        Self::with_exchange(HttpExchange::new(client), config)
    }
}

impl<E: Exchange> Transport<E> {
    /// Builds a transport over any [`Exchange`]. Fails on an empty API key.
    pub fn with_exchange(exchange: E, config: Config) -> Result<Self> {
        let credentials = Credentials::new(config.api_key)?;
        let span = tracing::info_span!(
            "transport",
            host = %config.api_host,
            format = %config.response_format
        );

        Ok(Self {
            exchange,
            credentials,
            api_host: config.api_host,
            format: config.response_format,
            mode: config.error_mode,
            retry: config.retry,
            span,
        })
    }

    /// Replaces the span this transport logs under.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    pub fn error_mode(&self) -> ErrorMode {
        self.mode
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Absolute URL for `path` on the configured host.
    pub fn url(&self, path: &str) -> String {
        join_url(&self.api_host, path)
    }

    /// Performs exactly one exchange and resolves failures with `errors`
    /// (the transport's own mode when `None`). No retries happen here.
    pub async fn make_request(
        &self,
        request: RequestSpec,
        errors: Option<ErrorMode>,
    ) -> Result<ApiResponse> {
        let mode = errors.unwrap_or(self.mode);
        self.execute(request, mode)
            .instrument(self.span.clone())
            .await
    }

    #[tracing::instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn execute(&self, request: RequestSpec, mode: ErrorMode) -> Result<ApiResponse> {
        let request = self.authorize(request);
        debug!("Sending request with {} parameters", request.query.len());

        let raw = match self.exchange.send(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                let parsed = with_error_handling(None, e, mode, self.format)?;
                return Ok(ApiResponse {
                    status: None,
                    location: None,
                    parsed,
                });
            }
        };

        debug!("Received status {} ({} bytes)", raw.status, raw.body.len());

        let parsed = match self.interpret(&request, &raw) {
            Ok(parsed) => parsed,
            Err(e) => with_error_handling(Some(&raw), e, mode, self.format)?,
        };

        Ok(ApiResponse {
            status: Some(raw.status),
            location: raw.header("location").map(str::to_string),
            parsed,
        })
    }

    /// Maps a raw response onto a document or the error describing it.
    fn interpret(&self, request: &RequestSpec, raw: &RawResponse) -> Result<Option<Document>> {
        let status = StatusCode::from_u16(raw.status).map_err(|_| Error::HttpStatus {
            status: raw.status,
            message: format!("{} Invalid status for url: {}", raw.status, request.url),
        })?;

        if status == StatusCode::NOT_MODIFIED {
            return Err(Error::NotModified);
        }

        // Creation endpoints may answer with a redirect to the poll location
        let redirect_to_location =
            !request.expect_body && status.is_redirection() && raw.header("location").is_some();

        if !status.is_success() && !redirect_to_location {
            return Err(Error::HttpStatus {
                status: raw.status,
                message: status_message(status, &request.url),
            });
        }

        if raw.is_blank() {
            if request.expect_body {
                return Err(Error::EmptyResponse);
            }
            return Ok(None);
        }

        // Headers-only requests keep whatever body parses and drop the rest
        if !request.expect_body {
            return Ok(Document::parse(&raw.body, self.format).ok());
        }

        Document::parse(&raw.body, self.format).map(Some)
    }

    /// Adds the API key and a default `Accept` header.
    fn authorize(&self, mut request: RequestSpec) -> RequestSpec {
        let embedded = request.url.to_lowercase().contains("apikey")
            || request
                .query
                .iter()
                .any(|(k, _)| k.eq_ignore_ascii_case(API_KEY_PARAM));
        if !embedded {
            request
                .query
                .insert(API_KEY_PARAM, self.credentials.api_key());
        }

        if request.header("accept").is_none() {
            request = request.with_header("Accept", self.format.mime_type());
        }

        request
    }
}

/// Message in the shape `404 Not Found for url: http://...`.
fn status_message(status: StatusCode, url: &str) -> String {
    format!(
        "{} {} for url: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Status"),
        url
    )
}

/// Joins `host` and `path`, keeping absolute URLs as they are.
pub fn join_url(host: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        host.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
