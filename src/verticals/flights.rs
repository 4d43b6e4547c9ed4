//! Flights live pricing.

use tracing::info;

use super::require;
use crate::document::Document;
use crate::error::Result;
use crate::http::{ErrorMode, Exchange, RequestSpec, Transport, join_url};
use crate::params::Params;
use crate::session::{PollSession, SessionSpec};

pub const PRICING_PATH: &str = "/apiservices/pricing/v1.0";

/// Parameters understood by session creation. Anything else filters or sorts
/// the polled results.
pub const SESSION_KEYS: &[&str] = &[
    "country",
    "currency",
    "locale",
    "originplace",
    "destinationplace",
    "outbounddate",
    "inbounddate",
    "cabinclass",
    "adults",
    "children",
    "infants",
    "groupPricing",
    "locationschema",
];

const REQUIRED_KEYS: &[&str] = &[
    "country",
    "currency",
    "locale",
    "originplace",
    "destinationplace",
    "outbounddate",
    "adults",
];

pub const LIVE_PRICING: SessionSpec = SessionSpec {
    name: "flights",
    session_keys: Some(SESSION_KEYS),
    create: create_request,
    is_complete,
};

fn create_request(host: &str, params: &mut Params) -> Result<RequestSpec> {
    require(params, REQUIRED_KEYS)?;
    Ok(RequestSpec::post(join_url(host, PRICING_PATH))
        .with_header("Content-Type", "application/x-www-form-urlencoded")
        .with_form(std::mem::take(params))
        .headers_only())
}

/// The server reports `Status: UpdatesComplete` once every agent has answered.
pub fn is_complete(doc: Option<&Document>) -> bool {
    doc.and_then(|d| d.text("Status"))
        .is_some_and(|status| status == "UpdatesComplete")
}

/// Removes and returns the poll filters (everything but the session keys).
pub fn additional_params(params: &mut Params) -> Params {
    LIVE_PRICING.poll_filters(params)
}

/// Asks for the booking details of an itinerary of the session at `poll_url`
/// and polls them until complete.
#[tracing::instrument(skip(transport, params, errors))]
pub async fn request_booking_details<E: Exchange>(
    transport: &Transport<E>,
    poll_url: &str,
    params: Params,
    errors: Option<ErrorMode>,
) -> Result<Option<Document>> {
    let url = format!("{}/booking", poll_url.trim_end_matches('/'));
    let request = RequestSpec::put(url).with_query(params).headers_only();

    let Some(location) = transport.open_session("booking", request, errors).await? else {
        return Ok(None);
    };
    info!("Polling booking details at {}", location);

    let policy = transport.retry_policy().clone();
    transport
        .poll_session(
            PollSession::new(location, Params::new()),
            is_complete,
            &policy,
            errors,
        )
        .await
}
