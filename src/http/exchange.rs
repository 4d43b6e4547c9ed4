//! A single HTTP exchange, abstracted so the executor can be driven by a mock.

use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::error::Result;
use crate::params::Params;

/// Everything needed to issue one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Params,
    /// Sent as `application/x-www-form-urlencoded` when present.
    pub form: Option<Params>,
    /// When false, an empty or unparseable body on a success status is not an
    /// error. Session creation only needs the Location header.
    pub expect_body: bool,
}

impl RequestSpec {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Params::new(),
            form: None,
            expect_body: true,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn with_query(mut self, query: Params) -> Self {
        self.query.extend(query);
        self
    }

    pub fn with_form(mut self, form: Params) -> Self {
        self.form = Some(form);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers_only(mut self) -> Self {
        self.expect_body = false;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Status, headers and body of a response, before any interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// True when the body has no non-whitespace content.
    pub fn is_blank(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Performs one request and returns the raw response.
///
/// Only failures that prevent any response from arriving are errors here;
/// status codes are interpreted by the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Exchange: Send + Sync {
    async fn send(&self, request: &RequestSpec) -> Result<RawResponse>;
}

/// [`Exchange`] backed by a reqwest client.
#[derive(Clone)]
pub struct HttpExchange {
    client: Client,
}

impl HttpExchange {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Exchange for HttpExchange {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: &RequestSpec) -> Result<RawResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .query(&request.query);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let raw = RawResponse::new(201, "").with_header("Location", "/poll/1");
        assert_eq!(raw.header("location"), Some("/poll/1"));
        assert_eq!(raw.header("LOCATION"), Some("/poll/1"));
        assert!(raw.is_blank());
    }

    #[test]
    fn test_request_spec_builders() {
        let request = RequestSpec::post("http://host/path")
            .with_header("Accept", "application/json")
            .with_form(Params::from([("a", "1")]))
            .headers_only();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.header("accept"), Some("application/json"));
        assert!(!request.expect_body);
        assert_eq!(request.form, Some(Params::from([("a", "1")])));
    }

    #[tokio::test]
    async fn test_http_exchange_get_with_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/markets".to_string()))
            .match_query(Matcher::UrlEncoded("apiKey".into(), "key".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Countries": []}"#)
            .create_async()
            .await;

        let exchange = HttpExchange::new(Client::new());
        let request = RequestSpec::get(format!("{}/markets", server.url()))
            .with_query(Params::from([("apiKey", "key")]));
        let raw = exchange.send(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(raw.status, 200);
        assert_eq!(raw.body, br#"{"Countries": []}"#.to_vec());
        assert_eq!(raw.header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_http_exchange_posts_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/pricing")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("country".into(), "UK".into()),
                Matcher::UrlEncoded("adults".into(), "1".into()),
            ]))
            .with_status(201)
            .with_header("Location", "/poll/abc")
            .create_async()
            .await;

        let exchange = HttpExchange::new(Client::new());
        let request = RequestSpec::post(format!("{}/pricing", server.url()))
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_form(Params::from([("country", "UK"), ("adults", "1")]));
        let raw = exchange.send(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(raw.status, 201);
        assert_eq!(raw.header("location"), Some("/poll/abc"));
        assert!(raw.is_blank());
    }

    #[tokio::test]
    async fn test_http_exchange_connection_refused_is_network_error() {
        let exchange = HttpExchange::new(Client::new());
        // Port 9 (discard) on localhost is assumed closed
        let request = RequestSpec::get("http://127.0.0.1:9/nothing");
        let err = exchange.send(&request).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Network(_)));
    }
}
