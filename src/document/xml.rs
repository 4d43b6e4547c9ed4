//! Minimal element tree built with quick-xml.
//!
//! Only what the API responses need: tags, attributes, text and children, plus
//! `./A/B` style path lookups.

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use std::fmt;

/// One element of a parsed XML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Text content directly inside this element, children excluded.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// First element matching `path`, relative to this element.
    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        self.find_all(path).into_iter().next()
    }

    /// All elements matching `path` in document order.
    ///
    /// Segments are tag names or `*`; `.` and empty segments are skipped, so
    /// `"./Countries/CountryDto"` and `"Countries/CountryDto"` are equivalent.
    pub fn find_all(&self, path: &str) -> Vec<&XmlElement> {
        let mut current = vec![self];
        for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            current = current
                .into_iter()
                .flat_map(|el| el.children.iter())
                .filter(|child| segment == "*" || child.tag == segment)
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }

    fn push_text(&mut self, text: &str) {
        match &mut self.text {
            Some(existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }
}

impl fmt::Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (k, v) in &self.attributes {
            write!(f, " {}=\"{}\"", k, escape(v.as_str()))?;
        }
        if self.text.is_none() && self.children.is_empty() {
            return write!(f, "/>");
        }
        write!(f, ">")?;
        if let Some(text) = &self.text {
            write!(f, "{}", escape(text.as_str()))?;
        }
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.tag)
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement, String> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

/// Parses `body` into its root element.
///
/// Rejects bodies with no root, more than one root, text outside the root or
/// unbalanced tags.
pub fn parse(body: &[u8]) -> Result<XmlElement, String> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    let mut attach = |element: XmlElement, stack: &mut Vec<XmlElement>| -> Result<(), String> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None if root.is_none() => root = Some(element),
            None => return Err("more than one root element".to_string()),
        }
        Ok(())
    };

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(element_from(&e)?),
            Ok(Event::Empty(e)) => attach(element_from(&e)?, &mut stack)?,
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or("unexpected closing tag")?;
                attach(element, &mut stack)?;
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| e.to_string())?;
                match stack.last_mut() {
                    Some(element) => element.push_text(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err("text outside of the root element".to_string()),
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                match stack.last_mut() {
                    Some(element) => element.push_text(&text),
                    None => return Err("CDATA outside of the root element".to_string()),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!("at position {}: {}", reader.error_position(), e));
            }
            // Declarations, comments, processing instructions and doctypes
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed element <{}>", open.tag));
    }

    root.ok_or_else(|| "no root element".to_string())
}
