//! Hotels live pricing and the hotel/car hire location autosuggest.

use super::fetch;
use crate::document::Document;
use crate::error::Result;
use crate::http::{ErrorMode, Exchange, RequestSpec, Transport, join_url};
use crate::params::{Params, construct_params};
use crate::session::SessionSpec;

pub const PRICING_PATH: &str = "/apiservices/hotels/liveprices/v2";
pub const AUTOSUGGEST_PATH: &str = "/apiservices/hotels/autosuggest/v2";

const PATH_KEYS: &[&str] = &[
    "market",
    "currency",
    "locale",
    "entityid",
    "checkindate",
    "checkoutdate",
    "guests",
    "rooms",
];

const AUTOSUGGEST_KEYS: &[&str] = &["market", "currency", "locale", "query"];

pub const LIVE_PRICING: SessionSpec = SessionSpec {
    name: "hotels",
    session_keys: None,
    create: create_request,
    is_complete,
};

fn create_request(host: &str, params: &mut Params) -> Result<RequestSpec> {
    let path = construct_params(params, PATH_KEYS, &[])?;
    Ok(
        RequestSpec::get(join_url(host, &format!("{}/{}", PRICING_PATH, path)))
            .with_query(std::mem::take(params))
            .headers_only(),
    )
}

/// Hotels answer `status: COMPLETE`; older deployments use `UpdatesComplete`.
pub fn is_complete(doc: Option<&Document>) -> bool {
    doc.and_then(|d| d.text("status"))
        .is_some_and(|status| status == "COMPLETE" || status == "UpdatesComplete")
}

/// Suggests places matching `query`. Shared by hotels and car hire.
pub fn autosuggest_request(host: &str, mut params: Params) -> Result<RequestSpec> {
    let path = construct_params(&mut params, AUTOSUGGEST_KEYS, &[])?;
    Ok(
        RequestSpec::get(join_url(host, &format!("{}/{}", AUTOSUGGEST_PATH, path)))
            .with_query(params),
    )
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
