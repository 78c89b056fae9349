//! Minimal owned element tree over `quick_xml` events.
//!
//! Ownership filings are small, so the parser reads the whole document into an
//! [`XmlElement`] tree once and answers field lookups from memory. Namespace prefixes
//! are dropped: elements and attributes are stored under their local names.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;

/// Why a document could not be read as XML, with the byte offset when known.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlError {
    pub message: String,
    pub position: Option<u64>,
}

impl XmlError {
    fn new(message: impl Into<String>, position: Option<u64>) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Concatenated, trimmed character data directly inside this element.
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn open(start: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let attributes = start
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
                let value = attr
                    .unescape_value()
                    .map(Cow::into_owned)
                    .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                (key, value)
            })
            .collect();
        Self {
            name,
            attributes,
            ..Default::default()
        }
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Follows a `/`-separated path of direct children, e.g. `"transactionShares/value"`.
    pub fn path(&self, path: &str) -> Option<&XmlElement> {
        path.split('/')
            .try_fold(self, |element, segment| element.child(segment))
    }

    /// First descendant (depth-first, document order) with the given local name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find_map(|c| {
            if c.name == name {
                Some(c)
            } else {
                c.find(name)
            }
        })
    }

    /// All descendants with the given local name, in document order.
    pub fn find_all(&self, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect(name, &mut found);
        found
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect(name, found);
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Leaf value of a field in either of the shapes SEC forms use:
    /// `<field>x</field>` or `<field><value>x</value></field>`.
    ///
    /// Returns `None` for missing or empty values.
    pub fn scalar(&self) -> Option<&str> {
        let text = match self.child("value") {
            Some(value) => value.text.as_str(),
            None => self.text.as_str(),
        };
        let text = text.trim();
        (!text.is_empty()).then_some(text)
    }
}

/// Parses a complete document into its root element.
///
/// The document must contain exactly one root element and every start tag must be
/// closed; mismatched end tags are rejected by the reader itself.
pub fn parse_document(content: &str) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| XmlError::new(e.to_string(), Some(reader.error_position())))?;
        match event {
            Event::Start(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(XmlError::new(
                        "multiple root elements",
                        Some(reader.buffer_position()),
                    ));
                }
                stack.push(XmlElement::open(&start));
            }
            Event::Empty(start) => {
                let element = XmlElement::open(&start);
                close(&mut stack, &mut root, element, reader.buffer_position())?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    XmlError::new("unexpected closing tag", Some(reader.buffer_position()))
                })?;
                close(&mut stack, &mut root, element, reader.buffer_position())?;
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map(Cow::into_owned)
                    .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                append_text(&mut stack, &value);
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data).into_owned();
                append_text(&mut stack, value.trim());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::new(
            format!("unclosed element <{}>", open.name),
            Some(reader.buffer_position()),
        ));
    }
    root.ok_or_else(|| XmlError::new("document has no root element", None))
}

fn close(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    position: u64,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(XmlError::new("multiple root elements", Some(position))),
    }
    Ok(())
}

fn append_text(stack: &mut [XmlElement], value: &str) {
    // Character data outside the root element is ignored.
    if let Some(current) = stack.last_mut() {
        if value.is_empty() {
            return;
        }
        if !current.text.is_empty() {
            current.text.push(' ');
        }
        current.text.push_str(value);
    }
}
