//! Error kinds raised by the transport, the parser and the poll loop.

use crate::document::ResponseFormat;

/// Result alias used throughout the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the client can surface.
///
/// The classifier in [`crate::http::classify`] dispatches on these variants,
/// so the set is kept closed and small.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A required path or query parameter was not supplied by the caller.
    MissingParameter(String),
    /// The server answered with a success status but no body.
    EmptyResponse,
    /// The body could not be parsed in the configured format.
    Parse {
        format: ResponseFormat,
        snippet: String,
    },
    /// Any non-2xx status other than 304.
    HttpStatus { status: u16, message: String },
    /// HTTP 304: the poll location has nothing new to report.
    NotModified,
    /// The poll loop ran out of tries before the result set was complete.
    ExceededRetries { tries: usize },
    /// An error mode string that is not one of strict, graceful or ignore.
    IllegalErrorMode(String),
    /// Session creation succeeded but the response had no Location header.
    MissingLocation,
    /// The API key was empty.
    InvalidCredentials,
    /// The request never produced an HTTP response (DNS, connect, timeout...).
    Network(String),
}

impl Error {
    /// The HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::NotModified => Some(304),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingParameter(key) => {
                write!(f, "Missing parameter: {}", key)
            }
            Error::EmptyResponse => write!(f, "Empty response from server"),
            Error::Parse { format, snippet } => {
                write!(f, "Invalid {} response: {}...", format, snippet)
            }
            Error::HttpStatus { message, .. } => write!(f, "{}", message),
            Error::NotModified => write!(f, "304 Not Modified"),
            Error::ExceededRetries { tries } => {
                write!(f, "Exceeded retries: no complete result after {} tries", tries)
            }
            Error::IllegalErrorMode(mode) => {
                write!(
                    f,
                    "Illegal error mode: {}. Expected strict, graceful or ignore.",
                    mode
                )
            }
            Error::MissingLocation => {
                write!(f, "Session was created but no Location header was returned")
            }
            Error::InvalidCredentials => write!(f, "API key must not be empty"),
            Error::Network(msg) => write!(f, "Request failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingParameter("currency".to_string());
        assert!(err.to_string().contains("currency"));

        let err = Error::ExceededRetries { tries: 5 };
        assert!(err.to_string().contains("5 tries"));

        let err = Error::IllegalErrorMode("loud".to_string());
        assert!(err.to_string().contains("loud"));

        let err = Error::HttpStatus {
            status: 400,
            message: "400: bad".to_string(),
        };
        assert_eq!(err.to_string(), "400: bad");
    }

    #[test]
    fn test_error_status() {
        assert_eq!(Error::NotModified.status(), Some(304));
        assert_eq!(
            Error::HttpStatus {
                status: 429,
                message: String::new()
            }
            .status(),
            Some(429)
        );
        assert_eq!(Error::EmptyResponse.status(), None);
    }
}
