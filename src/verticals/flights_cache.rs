//! Browse cache: cheapest cached prices, no session involved.

use std::fmt;
use std::str::FromStr;

use super::fetch;
use crate::document::Document;
use crate::error::Result;
use crate::http::{ErrorMode, Exchange, RequestSpec, Transport};
use crate::params::{Params, construct_params};

const PATH_KEYS: &[&str] = &[
    "country",
    "currency",
    "locale",
    "originplace",
    "destinationplace",
    "outbounddate",
];

/// Which cached view to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseKind {
    /// Cheapest quotes.
    Quotes,
    /// Cheapest price per route.
    Routes,
    /// Cheapest price per date.
    Dates,
    /// Price grid by outbound and inbound date.
    Grid,
}

impl BrowseKind {
    pub fn service_path(&self) -> &'static str {
        match self {
            BrowseKind::Quotes => "/apiservices/browsequotes/v1.0",
            BrowseKind::Routes => "/apiservices/browseroutes/v1.0",
            BrowseKind::Dates => "/apiservices/browsedates/v1.0",
            BrowseKind::Grid => "/apiservices/browsegrid/v1.0",
        }
    }
}

impl fmt::Display for BrowseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BrowseKind::Quotes => "quotes",
            BrowseKind::Routes => "routes",
            BrowseKind::Dates => "dates",
            BrowseKind::Grid => "grid",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for BrowseKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quotes" => Ok(BrowseKind::Quotes),
            "routes" => Ok(BrowseKind::Routes),
            "dates" => Ok(BrowseKind::Dates),
            "grid" => Ok(BrowseKind::Grid),
            _ => Err(anyhow::anyhow!(
                "Unknown browse view: {} (expected quotes, routes, dates or grid)",
                s
            )),
        }
    }
}

/// Builds the request for `kind`; leftover parameters go to the query string.
pub fn browse_request(host: &str, kind: BrowseKind, mut params: Params) -> Result<RequestSpec> {
    let path = construct_params(&mut params, PATH_KEYS, &["inbounddate"])?;
    let url = format!(
        "{}{}/{}",
        host.trim_end_matches('/'),
        kind.service_path(),
        path
    );
    Ok(RequestSpec::get(url).with_query(params))
}

/// Reads one cached view.
#[tracing::instrument(skip(transport, params, errors))]
pub async fn browse<E: Exchange>(
    transport: &Transport<E>,
    kind: BrowseKind,
    params: Params,
    errors: Option<ErrorMode>,
) -> Result<Option<Document>> {
    let request = browse_request(transport.api_host(), kind, params)?;
    fetch(transport, request, errors).await
}
