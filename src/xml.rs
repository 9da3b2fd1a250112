//! Minimal XML element tree used by the XML persistence path.
//!
//! Documents are pull-read into an owned element tree and written back out
//! event by event. The writer produces compact output (no indentation) so
//! text content survives a round trip byte for byte; escaping is handled by
//! quick-xml on both sides.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::DatabaseError;

/// One element: name, attributes in document order, concatenated text
/// content, and child elements in document order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct XmlElement {
    pub(crate) name: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) text: String,
    pub(crate) children: Vec<XmlElement>,
}

impl XmlElement {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Returns the value of the first attribute with this key.
    pub(crate) fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((key.into(), value.into()));
    }
}

fn malformed(err: impl std::fmt::Display) -> DatabaseError {
    DatabaseError::Corrupted(format!("malformed XML: {err}"))
}

/// Parses a UTF-8 XML document into its root element.
pub(crate) fn read_document(bytes: &[u8]) -> Result<XmlElement, DatabaseError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DatabaseError::Corrupted(format!("XML document is not UTF-8: {e}")))?;

    let mut reader = Reader::from_str(text);
    reader.config_mut().expand_empty_elements = true;

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(start) => {
                let name = String::from_utf8(start.name().as_ref().to_vec())
                    .map_err(|e| malformed(format!("element name is not UTF-8: {e}")))?;
                let mut element = XmlElement::new(name);
                for attr in start.attributes() {
                    let attr = attr.map_err(malformed)?;
                    let key = String::from_utf8(attr.key.as_ref().to_vec())
                        .map_err(|e| malformed(format!("attribute name is not UTF-8: {e}")))?;
                    let value = attr.unescape_value().map_err(malformed)?;
                    element.set_attribute(key, value.into_owned());
                }
                stack.push(element);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed("unbalanced end tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(t) => {
                // Text outside the root element is inter-markup whitespace.
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&t.unescape().map_err(malformed)?);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    let raw = std::str::from_utf8(&c)
                        .map_err(|e| malformed(format!("CDATA is not UTF-8: {e}")))?;
                    top.text.push_str(raw);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or_else(|| DatabaseError::Corrupted(String::from("XML document has no root element")))
}

/// Serializes an element tree as a complete document with XML declaration.
pub(crate) fn write_document(root: &XmlElement) -> Result<Vec<u8>, DatabaseError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(malformed)?;
    write_element(&mut writer, root)?;
    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<(), DatabaseError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    writer.write_event(Event::Start(start)).map_err(malformed)?;

    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(malformed)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(malformed)?;
    Ok(())
}
