//! Car hire live pricing.

use serde_json::Value;

use super::require;
use crate::document::Document;
use crate::error::Result;
use crate::http::{RequestSpec, join_url};
use crate::params::{Params, construct_params};
use crate::session::SessionSpec;

pub use super::hotels::{autosuggest_request, location_autosuggest};

pub const PRICING_PATH: &str = "/apiservices/carhire/liveprices/v2";

const PATH_KEYS: &[&str] = &[
    "market",
    "currency",
    "locale",
    "pickupplace",
    "dropoffplace",
    "pickupdatetime",
    "dropoffdatetime",
    "driverage",
];

pub const LIVE_PRICING: SessionSpec = SessionSpec {
    name: "carhire",
    session_keys: None,
    create: create_request,
    is_complete,
};

fn create_request(host: &str, params: &mut Params) -> Result<RequestSpec> {
    require(params, PATH_KEYS)?;
    require(params, &["userip"])?;
    let path = construct_params(params, PATH_KEYS, &[])?;
    Ok(
        RequestSpec::get(join_url(host, &format!("{}/{}", PRICING_PATH, path)))
            .with_query(std::mem::take(params))
            .headers_only(),
    )
}

/// Complete once at least one website answered and none is still in progress.
pub fn is_complete(doc: Option<&Document>) -> bool {
    match doc {
        Some(Document::Json(value)) => match value.get("websites") {
            Some(Value::Array(sites)) => {
                !sites.is_empty()
                    && sites
                        .iter()
                        .all(|site| !site.get("in_progress").is_some_and(truthy))
            }
            _ => false,
        },
        Some(Document::Xml(root)) => {
            let sites = root.find_all("Websites/WebsiteDto");
            !sites.is_empty()
                && sites.iter().all(|site| {
                    site.find("InProgress")
                        .and_then(|flag| flag.text())
                        .is_none_or(|flag| !flag.trim().eq_ignore_ascii_case("true"))
                })
        }
        None => false,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
