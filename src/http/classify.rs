//! Error classification and recovery.
//!
//! Every failed or anomalous exchange ends up in [`with_error_handling`], which
//! first enriches the error with whatever the server told us and then lets the
//! [`ErrorMode`] decide whether to raise it or degrade to a partial result.

use std::fmt;
use std::str::FromStr;
use tracing::warn;

use super::exchange::RawResponse;
use crate::document::{Document, ResponseFormat};
use crate::error::{Error, Result};

/// Appended to the message of every 429 response.
pub const RATE_LIMIT_NOTE: &str = "Too many requests in the last minute.";

/// How failures are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorMode {
    /// Every failure is returned as an error.
    #[default]
    Strict,
    /// Empty bodies, unparseable bodies, 304s and 429s degrade to a
    /// best-effort document; everything else is an error.
    Graceful,
    /// Nothing is raised; failures are logged and resolve to whatever can be
    /// parsed from the body.
    Ignore,
}

impl fmt::Display for ErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMode::Strict => write!(f, "strict"),
            ErrorMode::Graceful => write!(f, "graceful"),
            ErrorMode::Ignore => write!(f, "ignore"),
        }
    }
}

impl FromStr for ErrorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(ErrorMode::Strict),
            "graceful" => Ok(ErrorMode::Graceful),
            "ignore" => Ok(ErrorMode::Ignore),
            _ => Err(Error::IllegalErrorMode(s.to_string())),
        }
    }
}

/// Path of the per-field validation messages in a 400 body.
fn validation_path(format: ResponseFormat) -> &'static str {
    match format {
        ResponseFormat::Json => "ValidationErrors/Message",
        ResponseFormat::Xml => "./ValidationErrors/ValidationErrorDto/Message",
    }
}

/// Resolves `error`, raised while handling `response`, according to `mode`.
///
/// Returns the document to hand back to the caller (possibly absent) or the
/// error to raise. A 400 error is enriched with the server's validation
/// messages and a 429 with [`RATE_LIMIT_NOTE`] before the mode is consulted.
pub fn with_error_handling(
    response: Option<&RawResponse>,
    error: Error,
    mode: ErrorMode,
    format: ResponseFormat,
) -> Result<Option<Document>> {
    let error = annotate(response, error, format);

    match mode {
        ErrorMode::Strict => Err(error),
        ErrorMode::Graceful => {
            if matches!(
                error,
                Error::EmptyResponse | Error::NotModified | Error::Parse { .. }
            ) {
                warn!("{}, continuing without content", error);
                Ok(None)
            } else if error.status() == Some(429) {
                warn!("{}", error);
                Ok(best_effort_parse(response, format))
            } else {
                Err(error)
            }
        }
        ErrorMode::Ignore => {
            warn!("Ignoring error: {}", error);
            Ok(best_effort_parse(response, format))
        }
    }
}

fn annotate(response: Option<&RawResponse>, error: Error, format: ResponseFormat) -> Error {
    match error {
        Error::HttpStatus {
            status: 400,
            message,
        } => {
            let messages = validation_messages(response, format);
            let message = if messages.is_empty() {
                message
            } else {
                format!("{}: {}", message, messages.join("\n\t"))
            };
            Error::HttpStatus {
                status: 400,
                message,
            }
        }
        Error::HttpStatus {
            status: 429,
            message,
        } => Error::HttpStatus {
            status: 429,
            message: format!("{}: {}", message, RATE_LIMIT_NOTE),
        },
        other => other,
    }
}

/// Validation messages from a 400 body; a body that fails to parse has none.
fn validation_messages(response: Option<&RawResponse>, format: ResponseFormat) -> Vec<String> {
    best_effort_parse(response, format)
        .map(|doc| doc.texts(validation_path(format)))
        .unwrap_or_default()
}

fn best_effort_parse(response: Option<&RawResponse>, format: ResponseFormat) -> Option<Document> {
    let response = response.filter(|r| !r.is_blank())?;
    Document::parse(&response.body, format).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMATS: [ResponseFormat; 2] = [ResponseFormat::Json, ResponseFormat::Xml];

    fn http_error(status: u16, message: &str) -> Error {
        Error::HttpStatus {
            status,
            message: message.to_string(),
        }
    }

    fn valid_body(format: ResponseFormat) -> &'static str {
        match format {
            ResponseFormat::Json => r#"{"valid": 1}"#,
            ResponseFormat::Xml => "<valid>1</valid>",
        }
    }

    fn valid_field(doc: &Document) -> Option<String> {
        match doc {
            Document::Json(_) => doc.text("valid"),
            Document::Xml(root) => {
                assert_eq!(root.tag(), "valid");
                root.text().map(str::to_string)
            }
        }
    }

    #[test]
    fn test_error_mode_parse() {
        assert_eq!("strict".parse::<ErrorMode>().unwrap(), ErrorMode::Strict);
        assert_eq!("Graceful".parse::<ErrorMode>().unwrap(), ErrorMode::Graceful);
        assert_eq!("IGNORE".parse::<ErrorMode>().unwrap(), ErrorMode::Ignore);
        assert_eq!(
            "loud".parse::<ErrorMode>().unwrap_err(),
            Error::IllegalErrorMode("loud".to_string())
        );
    }

    #[test]
    fn test_error_mode_default_is_strict() {
        assert_eq!(ErrorMode::default(), ErrorMode::Strict);
    }

    #[test]
    fn test_strict_always_raises() {
        for format in FORMATS {
            let empty = RawResponse::new(200, "");
            let cases = [
                (Error::EmptyResponse, RawResponse::new(200, "")),
                (http_error(404, "404"), RawResponse::new(404, "")),
                (http_error(500, "500"), RawResponse::new(500, valid_body(format))),
                (Error::Network("reset".into()), empty.clone()),
                (Error::NotModified, RawResponse::new(304, "")),
            ];
            for (error, response) in cases {
                let expected = error.clone();
                let result = with_error_handling(Some(&response), error, ErrorMode::Strict, format);
                assert_eq!(result.unwrap_err(), expected);
            }
        }
    }

    #[test]
    fn test_strict_429_gets_rate_limit_note() {
        for format in FORMATS {
            let err = with_error_handling(
                Some(&RawResponse::new(429, "")),
                http_error(429, "429"),
                ErrorMode::Strict,
                format,
            )
            .unwrap_err();
            assert_eq!(err.to_string(), "429: Too many requests in the last minute.");
        }
    }

    #[test]
    fn test_strict_400_without_body_is_unchanged() {
        for format in FORMATS {
            let err = with_error_handling(
                Some(&RawResponse::new(400, "")),
                http_error(400, "400"),
                ErrorMode::Strict,
                format,
            )
            .unwrap_err();
            assert_eq!(err.to_string(), "400");
        }
    }

    #[test]
    fn test_400_enriched_with_json_validation_errors() {
        let response = RawResponse::new(
            400,
            r#"{"ValidationErrors": [{"Message": "1"}, {"Message": "2"}]}"#,
        );
        let err = with_error_handling(
            Some(&response),
            http_error(400, "400"),
            ErrorMode::Strict,
            ResponseFormat::Json,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "400: 1\n\t2");
    }

    #[test]
    fn test_400_enriched_with_xml_validation_errors() {
        let response = RawResponse::new(
            400,
            "<Root><ValidationErrors>\
             <ValidationErrorDto><Message>1</Message></ValidationErrorDto>\
             <ValidationErrorDto><Message>2</Message></ValidationErrorDto>\
             </ValidationErrors></Root>",
        );
        let err = with_error_handling(
            Some(&response),
            http_error(400, "400"),
            ErrorMode::Strict,
            ResponseFormat::Xml,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "400: 1\n\t2");
    }

    #[test]
    fn test_400_with_malformed_body_is_not_enriched() {
        for format in FORMATS {
            let err = with_error_handling(
                Some(&RawResponse::new(400, "<Root><ValidationErrors>")),
                http_error(400, "400"),
                ErrorMode::Strict,
                format,
            )
            .unwrap_err();
            assert_eq!(err, http_error(400, "400"));
        }
    }

    #[test]
    fn test_400_enriched_even_when_graceful() {
        let response = RawResponse::new(400, r#"{"ValidationErrors": [{"Message": "bad date"}]}"#);
        let err = with_error_handling(
            Some(&response),
            http_error(400, "400"),
            ErrorMode::Graceful,
            ResponseFormat::Json,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "400: bad date");
    }

    #[test]
    fn test_graceful_empty_response_is_absent() {
        for format in FORMATS {
            let result = with_error_handling(
                Some(&RawResponse::new(200, "")),
                Error::EmptyResponse,
                ErrorMode::Graceful,
                format,
            );
            assert_eq!(result.unwrap(), None);
        }
    }

    #[test]
    fn test_graceful_429_returns_parsed_body() {
        for format in FORMATS {
            let response = RawResponse::new(429, valid_body(format));
            let doc = with_error_handling(
                Some(&response),
                http_error(429, "429"),
                ErrorMode::Graceful,
                format,
            )
            .unwrap()
            .unwrap();
            assert_eq!(valid_field(&doc), Some("1".to_string()));
        }
    }

    #[test]
    fn test_graceful_429_with_invalid_body_is_absent() {
        for format in FORMATS {
            let result = with_error_handling(
                Some(&RawResponse::new(429, "invalid")),
                http_error(429, "429"),
                ErrorMode::Graceful,
                format,
            );
            assert_eq!(result.unwrap(), None);
        }
    }

    #[test]
    fn test_graceful_raises_other_errors() {
        for format in FORMATS {
            let result = with_error_handling(
                Some(&RawResponse::new(500, "")),
                http_error(500, "500"),
                ErrorMode::Graceful,
                format,
            );
            assert!(matches!(result, Err(Error::HttpStatus { status: 500, .. })));

            let result = with_error_handling(
                None,
                Error::Network("reset".into()),
                ErrorMode::Graceful,
                format,
            );
            assert!(matches!(result, Err(Error::Network(_))));
        }
    }

    #[test]
    fn test_ignore_never_raises() {
        for format in FORMATS {
            let empty = RawResponse::new(200, "");
            for error in [
                Error::EmptyResponse,
                Error::Network("boom".into()),
                http_error(500, "500"),
                http_error(400, "400"),
            ] {
                let result = with_error_handling(Some(&empty), error, ErrorMode::Ignore, format);
                assert_eq!(result.unwrap(), None);
            }
            let result = with_error_handling(None, Error::EmptyResponse, ErrorMode::Ignore, format);
            assert_eq!(result.unwrap(), None);
        }
    }

    #[test]
    fn test_ignore_returns_parsed_body() {
        for format in FORMATS {
            let response = RawResponse::new(500, valid_body(format));
            let doc = with_error_handling(
                Some(&response),
                http_error(500, "500"),
                ErrorMode::Ignore,
                format,
            )
            .unwrap()
            .unwrap();
            assert_eq!(valid_field(&doc), Some("1".to_string()));
        }
    }
}
