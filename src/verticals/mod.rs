//! Endpoints of the pricing API, one module per product.
//!
//! Live-pricing products are [`SessionSpec`](crate::session::SessionSpec)
//! values driven by [`Transport::get_result`](crate::http::Transport::get_result);
//! the rest are single requests.

pub mod carhire;
pub mod flights;
pub mod flights_cache;
pub mod hotels;
pub mod reference;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::http::{ErrorMode, Exchange, RequestSpec, Transport};
use crate::params::Params;

/// Fails with [`Error::MissingParameter`] on the first key of `keys` that
/// `params` lacks.
pub(crate) fn require(params: &Params, keys: &[&str]) -> Result<()> {
    match keys.iter().find(|key| !params.contains_key(key)) {
        Some(missing) => Err(Error::MissingParameter(missing.to_string())),
        None => Ok(()),
    }
}

/// One request, no session: returns the parsed body.
pub(crate) async fn fetch<E: Exchange>(
    transport: &Transport<E>,
    request: RequestSpec,
    errors: Option<ErrorMode>,
) -> Result<Option<Document>> {
    let response = transport.make_request(request, errors).await?;
    Ok(response.parsed)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::Config;
    use crate::document::ResponseFormat;
    use crate::http::{MockExchange, Transport};
    use crate::session::RetryPolicy;

    pub fn transport(exchange: MockExchange, format: ResponseFormat) -> Transport<MockExchange> {
        let config = Config::new("key")
            .with_api_host("http://host")
            .with_response_format(format)
            .with_retry(RetryPolicy::immediate(3));
        Transport::with_exchange(exchange, config).unwrap()
    }
}
