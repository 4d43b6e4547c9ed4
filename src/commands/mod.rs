use anyhow::{Context, Result, bail};
use log::debug;

use crate::{
    document::Document,
    http::{ErrorMode, Exchange, Transport},
    params::Params,
    verticals::{
        carhire, flights,
        flights_cache::{self, BrowseKind},
        hotels, reference,
    },
};

/// One invocation of the command line client.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Markets { locale: String },
    Autosuggest { hotels: bool, params: Params },
    Flights { params: Params },
    Hotels { params: Params },
    Carhire { params: Params },
    Browse { kind: BrowseKind, params: Params },
    Booking { poll_url: String, params: Params },
}

/// Splits a `key=value` argument on its first `=`.
pub fn parse_param(arg: &str) -> Result<(String, String)> {
    let Some((key, value)) = arg.split_once('=') else {
        bail!("Invalid parameter '{}', expected key=value", arg);
    };
    if key.trim().is_empty() {
        bail!("Invalid parameter '{}', key is empty", arg);
    }
    Ok((key.trim().to_string(), value.to_string()))
}

/// Collects `key=value` arguments in order; a repeated key keeps its first
/// position and its last value.
pub fn collect_params(args: &[String]) -> Result<Params> {
    let mut params = Params::new();
    for arg in args {
        let (key, value) = parse_param(arg)?;
        params.insert(key, value);
    }
    Ok(params)
}

/// Runs `command` and returns the resulting document, if any.
#[tracing::instrument(skip(transport, command))]
pub async fn run<E: Exchange>(
    transport: &Transport<E>,
    command: Command,
    errors: Option<ErrorMode>,
) -> Result<Option<Document>> {
    debug!("Running {:?}", command);

    let doc = match command {
        Command::Markets { locale } => reference::get_markets(transport, &locale, errors)
            .await
            .with_context(|| format!("Failed to fetch markets for locale {}", locale))?,
        Command::Autosuggest { hotels: true, params } => {
            hotels::location_autosuggest(transport, params, errors)
                .await
                .context("Hotel location autosuggest failed")?
        }
        Command::Autosuggest { hotels: false, params } => {
            reference::location_autosuggest(transport, params, errors)
                .await
                .context("Location autosuggest failed")?
        }
        Command::Flights { params } => transport
            .get_result(&flights::LIVE_PRICING, params, errors)
            .await
            .context("Flights live pricing failed")?,
        Command::Hotels { params } => transport
            .get_result(&hotels::LIVE_PRICING, params, errors)
            .await
            .context("Hotels live pricing failed")?,
        Command::Carhire { params } => transport
            .get_result(&carhire::LIVE_PRICING, params, errors)
            .await
            .context("Car hire live pricing failed")?,
        Command::Browse { kind, params } => flights_cache::browse(transport, kind, params, errors)
            .await
            .with_context(|| format!("Failed to browse cached {}", kind))?,
        Command::Booking { poll_url, params } => {
            flights::request_booking_details(transport, &poll_url, params, errors)
                .await
                .with_context(|| format!("Failed to get booking details for {}", poll_url))?
        }
    };

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::document::ResponseFormat;
    use crate::error::Error;
    use crate::http::{MockExchange, RawResponse};
    use crate::session::RetryPolicy;

    fn transport(exchange: MockExchange) -> Transport<MockExchange> {
        let config = Config::new("key")
            .with_api_host("http://host")
            .with_response_format(ResponseFormat::Json)
            .with_retry(RetryPolicy::immediate(2));
        Transport::with_exchange(exchange, config).unwrap()
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("locale=en-GB").unwrap(),
            ("locale".to_string(), "en-GB".to_string())
        );
        assert_eq!(
            parse_param("query=a=b").unwrap(),
            ("query".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_param("empty=").unwrap().1, "");
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=value").is_err());
    }

    #[test]
    fn test_collect_params_last_value_wins() {
        let args = vec!["a=1".to_string(), "b=2".to_string(), "a=3".to_string()];
        let params = collect_params(&args).unwrap();
        assert_eq!(params, Params::from([("a", "3"), ("b", "2")]));
    }

    #[tokio::test]
    async fn test_run_markets() {
        let mut exchange = MockExchange::new();
        exchange
            .expect_send()
            .withf(|req| req.url.ends_with("/countries/fr-FR"))
            .times(1)
            .returning(|_| Ok(RawResponse::new(200, r#"{"Countries": []}"#)));

        let doc = run(
            &transport(exchange),
            Command::Markets {
                locale: "fr-FR".to_string(),
            },
            None,
        )
        .await
        .unwrap();
        assert!(doc.is_some());
    }

    #[tokio::test]
    async fn test_run_keeps_library_error_as_source() {
        let mut exchange = MockExchange::new();
        exchange.expect_send().times(0);

        let err = run(
            &transport(exchange),
            Command::Flights {
                params: Params::from([("country", "UK")]),
            },
            None,
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::MissingParameter("currency".to_string()))
        );
        assert!(format!("{:#}", err).contains("Flights live pricing failed"));
    }

    #[tokio::test]
    async fn test_run_hotel_autosuggest_uses_hotel_endpoint() {
        let mut exchange = MockExchange::new();
        exchange
            .expect_send()
            .withf(|req| req.url.contains("/hotels/autosuggest/v2/UK/GBP/en-GB/paris"))
            .times(1)
            .returning(|_| Ok(RawResponse::new(200, r#"{"results": []}"#)));

        let params = Params::from([
            ("market", "UK"),
            ("currency", "GBP"),
            ("locale", "en-GB"),
            ("query", "paris"),
        ]);
        let doc = run(
            &transport(exchange),
            Command::Autosuggest {
                hotels: true,
                params,
            },
            None,
        )
        .await
        .unwrap();
        assert!(doc.is_some());
    }
}
