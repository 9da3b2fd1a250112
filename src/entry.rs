//! The named tree node.
//!
//! An [`Entry`] couples a name with an optional typed value and a
//! name-ordered collection of child entries. An entry may hold content,
//! children, both, or neither; a bare entry is routinely used as a presence
//! flag. Children own their subtrees outright, so the tree is acyclic by
//! construction and nothing holds a reference back to its parent.

use std::collections::BTreeMap;

use log::warn;

use crate::codec::{ByteReader, write_string};
use crate::error::DatabaseError;
use crate::registry;
use crate::value::{Value, Vector};
use crate::xml::XmlElement;

// Wire sentinels. Arbitrary values, only required to be distinguishable;
// these are fresh constants, not the ones historical files used.
pub(crate) const ENTRY_START: i32 = 0x4C44_0001;
pub(crate) const ENTRY_END: i32 = 0x4C44_0002;
const CHILDREN_START: i32 = 0x4C44_0003;
const CHILDREN_END: i32 = 0x4C44_0004;
const CONTENT_PRESENT: i32 = 0x4C44_0005;
const CONTENT_ABSENT: i32 = 0x4C44_0006;

const HAS_CONTENT_ATTRIBUTE: &str = "hasContent";

/// A named node holding an optional value and name-ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    name: String,
    content: Option<Value>,
    children: BTreeMap<String, Entry>,
}

impl Entry {
    /// Creates an entry with no content and no children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: None,
            children: BTreeMap::new(),
        }
    }

    /// Creates an entry holding the given content.
    pub fn with_content(name: impl Into<String>, content: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            content: Some(content.into()),
            children: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> Option<&Value> {
        self.content.as_ref()
    }

    /// Replaces the stored content. Children are unaffected.
    pub fn set_content(&mut self, content: impl Into<Value>) {
        self.content = Some(content.into());
    }

    /// Drops the stored content, leaving a bare (or children-only) entry.
    pub fn clear_content(&mut self) {
        self.content = None;
    }

    /// Content as text, or `None` if absent or of another kind.
    pub fn text(&self) -> Option<&str> {
        self.content().and_then(Value::as_text)
    }

    pub fn integer(&self) -> Option<i64> {
        self.content().and_then(Value::as_integer)
    }

    pub fn decimal(&self) -> Option<rust_decimal::Decimal> {
        self.content().and_then(Value::as_decimal)
    }

    pub fn double(&self) -> Option<f64> {
        self.content().and_then(Value::as_double)
    }

    pub fn boolean(&self) -> Option<bool> {
        self.content().and_then(Value::as_boolean)
    }

    pub fn vector(&self) -> Option<&Vector> {
        self.content().and_then(Value::as_vector)
    }

    /// Inserts a child entry. A sibling with the same name is an error,
    /// never a silent overwrite.
    pub fn add_child(&mut self, child: Entry) -> Result<(), DatabaseError> {
        if self.children.contains_key(&child.name) {
            return Err(DatabaseError::DuplicateEntry(child.name));
        }
        self.children.insert(child.name.clone(), child);
        Ok(())
    }

    pub fn child(&self, name: &str) -> Option<&Entry> {
        self.children.get(name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.children.get_mut(name)
    }

    /// Removes and returns the named child.
    pub fn remove_child(&mut self, name: &str) -> Option<Entry> {
        self.children.remove(name)
    }

    /// Child entries in name order.
    pub fn children(&self) -> impl Iterator<Item = &Entry> {
        self.children.values()
    }

    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.children.values_mut()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Depth-first search of the subtree for an entry with this name.
    /// The entry itself is not considered.
    pub fn find(&self, name: &str) -> Option<&Entry> {
        for child in self.children.values() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Whether any descendant is named `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Appends this entry framed by start and end markers.
    ///
    /// Body layout:
    /// - name: `i64` byte length + UTF-8 bytes
    /// - presence token: `i32` (`CONTENT_PRESENT` / `CONTENT_ABSENT`)
    /// - if present: tag hash (`u32`) | content byte length (`u32`) | bytes
    /// - if any children: `CHILDREN_START` | framed children | `CHILDREN_END`
    pub(crate) fn write_framed(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&ENTRY_START.to_le_bytes());
        write_string(buf, &self.name);

        match &self.content {
            Some(content) => {
                buf.extend_from_slice(&CONTENT_PRESENT.to_le_bytes());
                buf.extend_from_slice(&content.tag_hash().to_le_bytes());
                let mut body = Vec::new();
                content.encode_into(&mut body);
                buf.extend_from_slice(&(body.len() as u32).to_le_bytes());
                buf.extend_from_slice(&body);
            }
            None => buf.extend_from_slice(&CONTENT_ABSENT.to_le_bytes()),
        }

        if !self.children.is_empty() {
            buf.extend_from_slice(&CHILDREN_START.to_le_bytes());
            for child in self.children.values() {
                child.write_framed(buf);
            }
            buf.extend_from_slice(&CHILDREN_END.to_le_bytes());
        }

        buf.extend_from_slice(&ENTRY_END.to_le_bytes());
    }

    /// Mirror of [`write_framed`](Self::write_framed).
    ///
    /// A content blob whose tag hash is not registered is skipped (the
    /// entry loads contentless and a warning is logged); everything else
    /// that does not match the layout is a fatal format error.
    pub(crate) fn read_framed(reader: &mut ByteReader<'_>) -> Result<Entry, DatabaseError> {
        let marker = reader.read_i32("entry start marker")?;
        if marker != ENTRY_START {
            return Err(DatabaseError::Corrupted(format!(
                "expected entry start marker, found {marker:#010x}"
            )));
        }

        let name = reader.read_string("entry name")?;
        let mut entry = Entry::new(name);

        match reader.read_i32("content presence token")? {
            CONTENT_PRESENT => {
                let hash = reader.read_u32("content tag hash")?;
                let length = reader.read_u32("content length")? as usize;
                match registry::global().resolve_hash(hash) {
                    Some(registration) => {
                        let bytes = reader.read_bytes(length, "content bytes")?;
                        let mut content_reader = ByteReader::new(bytes);
                        let value = (registration.binary)(&mut content_reader)?;
                        if content_reader.remaining() != 0 {
                            return Err(DatabaseError::Corrupted(format!(
                                "content of entry '{}' has {} trailing bytes",
                                entry.name,
                                content_reader.remaining()
                            )));
                        }
                        entry.content = Some(value);
                    }
                    None => {
                        warn!(
                            "unknown content tag hash {hash:#010x} in entry '{}'; dropping content",
                            entry.name
                        );
                        reader.skip(length, "unknown content bytes")?;
                    }
                }
            }
            CONTENT_ABSENT => {}
            other => {
                return Err(DatabaseError::Corrupted(format!(
                    "invalid content presence token: {other:#010x}"
                )));
            }
        }

        if reader.peek_i32("entry end marker")? == CHILDREN_START {
            reader.read_i32("children start marker")?;
            loop {
                match reader.peek_i32("children end marker")? {
                    CHILDREN_END => {
                        reader.read_i32("children end marker")?;
                        break;
                    }
                    ENTRY_START => {
                        let child = Entry::read_framed(reader)?;
                        entry.add_child(child)?;
                    }
                    other => {
                        return Err(DatabaseError::Corrupted(format!(
                            "unexpected marker {other:#010x} in child list of '{}'",
                            entry.name
                        )));
                    }
                }
            }
        }

        let marker = reader.read_i32("entry end marker")?;
        if marker != ENTRY_END {
            return Err(DatabaseError::Corrupted(format!(
                "expected entry end marker, found {marker:#010x}"
            )));
        }

        Ok(entry)
    }

    /// Builds the XML element for this entry: named after the entry, a
    /// `hasContent` attribute, the content element first (if any), then one
    /// element per child entry.
    pub(crate) fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(self.name.as_str());
        element.set_attribute(
            HAS_CONTENT_ATTRIBUTE,
            if self.content.is_some() { "1" } else { "0" },
        );
        if let Some(content) = &self.content {
            element.children.push(content.to_xml());
        }
        for child in self.children.values() {
            element.children.push(child.to_xml());
        }
        element
    }

    /// Mirror of [`to_xml`](Self::to_xml).
    ///
    /// When `hasContent` is `"1"` the first child element holds the
    /// content; an unregistered content tag is skipped with a warning, like
    /// the binary path. Every other child element is a child entry.
    pub(crate) fn from_xml(element: &XmlElement) -> Result<Entry, DatabaseError> {
        let mut entry = Entry::new(element.name.as_str());
        let has_content = element.attribute(HAS_CONTENT_ATTRIBUTE) == Some("1");

        let mut children = element.children.iter();
        if has_content {
            let content_element = children.next().ok_or_else(|| {
                DatabaseError::Corrupted(format!(
                    "entry '{}' declares content but has no content element",
                    entry.name
                ))
            })?;
            match registry::global().resolve_name(&content_element.name) {
                Some(registration) => entry.content = Some((registration.xml)(content_element)?),
                None => warn!(
                    "unknown content tag '{}' in entry '{}'; dropping content",
                    content_element.name, entry.name
                ),
            }
        }

        for child_element in children {
            entry.add_child(Entry::from_xml(child_element)?)?;
        }

        Ok(entry)
    }
}
