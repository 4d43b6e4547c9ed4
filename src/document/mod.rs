//! Response documents.
//!
//! The API can answer in JSON or XML. [`Document`] wraps either so the
//! classifier, the poll loop and the completeness predicates can be written
//! once against a single read interface.

pub mod xml;

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub use xml::XmlElement;

/// Number of body bytes quoted in parse errors.
const SNIPPET_LEN: usize = 100;

/// Wire format requested from the API and expected back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
}

impl ResponseFormat {
    /// Value for the `Accept` header.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json",
            ResponseFormat::Xml => "application/xml",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseFormat::Json => write!(f, "json"),
            ResponseFormat::Xml => write!(f, "xml"),
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ResponseFormat::Json),
            "xml" => Ok(ResponseFormat::Xml),
            _ => anyhow::bail!("Unknown response format: {}. Expected json or xml.", s),
        }
    }
}

/// A parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// Keyed document (JSON).
    Json(Value),
    /// Tree document (XML); holds the root element.
    Xml(XmlElement),
}

impl Document {
    /// Parses `body` as `format`. No schema validation is done.
    pub fn parse(body: &[u8], format: ResponseFormat) -> Result<Self> {
        let parsed = match format {
            ResponseFormat::Json => serde_json::from_slice(body)
                .map(Document::Json)
                .map_err(|e| e.to_string()),
            ResponseFormat::Xml => xml::parse(body).map(Document::Xml),
        };

        parsed.map_err(|reason| {
            tracing::trace!("failed to parse {} body: {}", format, reason);
            Error::Parse {
                format,
                snippet: snippet(body),
            }
        })
    }

    pub fn format(&self) -> ResponseFormat {
        match self {
            Document::Json(_) => ResponseFormat::Json,
            Document::Xml(_) => ResponseFormat::Xml,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Document::Json(value) => Some(value),
            Document::Xml(_) => None,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlElement> {
        match self {
            Document::Json(_) => None,
            Document::Xml(root) => Some(root),
        }
    }

    /// Top-level field of a keyed document.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_json()?.get(key)
    }

    /// First element matching `path` under the root of a tree document.
    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        self.as_xml()?.find(path)
    }

    /// All elements matching `path` under the root of a tree document.
    pub fn find_all(&self, path: &str) -> Vec<&XmlElement> {
        match self {
            Document::Xml(root) => root.find_all(path),
            Document::Json(_) => Vec::new(),
        }
    }

    /// Scalar values found at `path`, whatever the format.
    ///
    /// JSON arrays are flattened at every step, so `"ValidationErrors/Message"`
    /// collects the message of each array element. For XML this is the text of
    /// every element returned by [`Document::find_all`].
    pub fn texts(&self, path: &str) -> Vec<String> {
        match self {
            Document::Json(value) => json_texts(value, path),
            Document::Xml(root) => root
                .find_all(path)
                .into_iter()
                .filter_map(|el| el.text().map(str::to_string))
                .collect(),
        }
    }

    /// First scalar value at `path`.
    pub fn text(&self, path: &str) -> Option<String> {
        self.texts(path).into_iter().next()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Document::Json(value) => {
                let pretty = serde_json::to_string_pretty(value).map_err(|_| fmt::Error)?;
                write!(f, "{}", pretty)
            }
            Document::Xml(root) => write!(f, "{}", root),
        }
    }
}

fn snippet(body: &[u8]) -> String {
    String::from_utf8_lossy(&body[..body.len().min(SNIPPET_LEN)]).into_owned()
}

fn flatten<'a>(values: Vec<&'a Value>) -> Vec<&'a Value> {
    values
        .into_iter()
        .flat_map(|v| match v {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        })
        .collect()
}

fn json_texts(value: &Value, path: &str) -> Vec<String> {
    let mut current = flatten(vec![value]);
    for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
        current = flatten(current.into_iter().filter_map(|v| v.get(segment)).collect());
    }

    current
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect()
}
