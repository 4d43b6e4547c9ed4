//! Reference data: markets and flight location autosuggest.

use super::fetch;
use crate::document::Document;
use crate::error::Result;
use crate::http::{ErrorMode, Exchange, RequestSpec, Transport};
use crate::params::{Params, construct_params};

pub const MARKETS_PATH: &str = "/apiservices/reference/v1.0/countries";
pub const AUTOSUGGEST_PATH: &str = "/apiservices/autosuggest/v1.0";

/// Countries the API sells in, with names localised to `locale`.
#[tracing::instrument(skip(transport, errors))]
pub async fn get_markets<E: Exchange>(
    transport: &Transport<E>,
    locale: &str,
    errors: Option<ErrorMode>,
) -> Result<Option<Document>> {
    let url = transport.url(&format!("{}/{}", MARKETS_PATH, locale));
    fetch(transport, RequestSpec::get(url), errors).await
}

/// Builds a flight autosuggest request. `market`, `currency` and `locale` form
/// the path; everything else (typically `query`) is sent as query string.
pub fn autosuggest_request(host: &str, mut params: Params) -> Result<RequestSpec> {
    let path = construct_params(&mut params, &["market", "currency", "locale"], &[])?;
    let url = format!("{}{}/{}/", host.trim_end_matches('/'), AUTOSUGGEST_PATH, path);
    Ok(RequestSpec::get(url).with_query(params))
}

#[tracing::instrument(skip_all)]
pub async fn location_autosuggest<E: Exchange>(
    transport: &Transport<E>,
    params: Params,
    errors: Option<ErrorMode>,
) -> Result<Option<Document>> {
    let request = autosuggest_request(transport.api_host(), params)?;
    fetch(transport, request, errors).await
}
