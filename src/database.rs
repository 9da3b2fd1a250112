//! The root container and its file formats.
//!
//! A [`Database`] owns a name-ordered set of top-level entries and knows
//! how to persist the whole tree. The format is chosen by file extension:
//! one configured extension selects the binary layout, the other the XML
//! document. Serialization runs fully in memory and hits the disk with a
//! single write, so a rejected path never leaves a partial file behind.
//!
//! Binary file layout (all integers little-endian):
//! - file identifier: `i32`
//! - zero or more framed entries (see [`Entry`])
//! - file end marker: `i32`

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use log::debug;

use crate::codec::ByteReader;
use crate::entry::{ENTRY_START, Entry};
use crate::error::DatabaseError;
use crate::xml::{self, XmlElement};

/// Identifies a binary database file. Fresh sentinel, not the historical
/// format's value.
pub(crate) const FILE_MAGIC: i32 = 0x4C44_4231;
pub(crate) const FILE_END: i32 = 0x4C44_00FF;

/// Root element name of the XML document form.
const ROOT_ELEMENT: &str = "Data";

/// Which on-disk format a path resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Binary,
    Xml,
}

/// A named, name-ordered collection of top-level entries with binary and
/// XML persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    name: String,
    entries: BTreeMap<String, Entry>,
    xml_extension: String,
    binary_extension: String,
}

impl Database {
    /// Creates an empty database configured with its two file extensions.
    ///
    /// Extensions must be non-empty, ASCII-alphanumeric, and distinct
    /// (case-insensitively); anything else is a configuration error.
    pub fn new(
        name: impl Into<String>,
        xml_extension: impl Into<String>,
        binary_extension: impl Into<String>,
    ) -> Result<Self, DatabaseError> {
        let xml_extension = xml_extension.into();
        let binary_extension = binary_extension.into();
        validate_extension(&xml_extension)?;
        validate_extension(&binary_extension)?;
        if xml_extension.eq_ignore_ascii_case(&binary_extension) {
            return Err(DatabaseError::InvalidExtension(format!(
                "'{xml_extension}' is configured for both formats"
            )));
        }
        Ok(Self {
            name: name.into(),
            entries: BTreeMap::new(),
            xml_extension,
            binary_extension,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn xml_extension(&self) -> &str {
        &self.xml_extension
    }

    pub fn binary_extension(&self) -> &str {
        &self.binary_extension
    }

    /// Inserts a top-level entry. A name collision is an error, never a
    /// silent overwrite.
    pub fn add_entry(&mut self, entry: Entry) -> Result<(), DatabaseError> {
        if self.entries.contains_key(entry.name()) {
            return Err(DatabaseError::DuplicateEntry(entry.name().to_string()));
        }
        self.entries.insert(entry.name().to_string(), entry);
        Ok(())
    }

    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn entry_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.entries.get_mut(name)
    }

    /// Removes and returns the named top-level entry.
    pub fn remove_entry(&mut self, name: &str) -> Option<Entry> {
        self.entries.remove(name)
    }

    /// Drops every entry. Required before reloading a file into the same
    /// instance; see [`load`](Self::load).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-level entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.entries.values_mut()
    }

    /// Whether a top-level entry is named `name`, or, with
    /// `search_children`, whether any entry's subtree contains it.
    pub fn contains(&self, name: &str, search_children: bool) -> bool {
        if self.entries.contains_key(name) {
            return true;
        }
        search_children && self.entries.values().any(|entry| entry.contains(name))
    }

    /// Writes the whole tree to `path` in the format selected by its
    /// extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DatabaseError> {
        let path = path.as_ref();
        let bytes = match self.format_for(path)? {
            FileFormat::Binary => self.to_binary(),
            FileFormat::Xml => self.to_xml_document()?,
        };
        fs::write(path, bytes)?;
        debug!(
            "saved database '{}' ({} entries) to '{}'",
            self.name,
            self.entries.len(),
            path.display()
        );
        Ok(())
    }

    /// Reads a file written by [`save`](Self::save) and adds its entries.
    ///
    /// Existing entries are kept: loading appends. Loading the same file
    /// twice therefore fails with [`DatabaseError::DuplicateEntry`]; call
    /// [`clear`](Self::clear) first for an idempotent reload. A missing
    /// file surfaces as [`DatabaseError::NotFound`], distinct from
    /// corruption, so callers can treat "no config yet" separately.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), DatabaseError> {
        let path = path.as_ref();
        let format = self.format_for(path)?;
        let bytes = fs::read(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                DatabaseError::NotFound(path.to_path_buf())
            } else {
                DatabaseError::Io(e)
            }
        })?;
        match format {
            FileFormat::Binary => self.from_binary(&bytes)?,
            FileFormat::Xml => self.from_xml_document(&bytes)?,
        }
        debug!(
            "loaded '{}' into database '{}' ({} entries now)",
            path.display(),
            self.name,
            self.entries.len()
        );
        Ok(())
    }

    fn format_for(&self, path: &Path) -> Result<FileFormat, DatabaseError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if extension.eq_ignore_ascii_case(&self.binary_extension) {
            Ok(FileFormat::Binary)
        } else if extension.eq_ignore_ascii_case(&self.xml_extension) {
            Ok(FileFormat::Xml)
        } else {
            Err(DatabaseError::UnknownExtension {
                path: path.to_path_buf(),
                xml_extension: self.xml_extension.clone(),
                binary_extension: self.binary_extension.clone(),
            })
        }
    }

    fn to_binary(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&FILE_MAGIC.to_le_bytes());
        for entry in self.entries.values() {
            entry.write_framed(&mut buf);
        }
        buf.extend_from_slice(&FILE_END.to_le_bytes());
        buf
    }

    fn from_binary(&mut self, bytes: &[u8]) -> Result<(), DatabaseError> {
        let mut reader = ByteReader::new(bytes);
        let magic = reader.read_i32("file identifier")?;
        if magic != FILE_MAGIC {
            return Err(DatabaseError::Corrupted(format!(
                "bad file identifier {magic:#010x}, expected {FILE_MAGIC:#010x}"
            )));
        }

        loop {
            match reader.peek_i32("file end marker")? {
                ENTRY_START => {
                    let entry = Entry::read_framed(&mut reader)?;
                    self.add_entry(entry)?;
                }
                FILE_END => {
                    reader.read_i32("file end marker")?;
                    break;
                }
                other => {
                    return Err(DatabaseError::Corrupted(format!(
                        "unexpected marker {other:#010x} at top level"
                    )));
                }
            }
        }

        if reader.remaining() != 0 {
            return Err(DatabaseError::Corrupted(format!(
                "{} trailing bytes after file end marker",
                reader.remaining()
            )));
        }
        Ok(())
    }

    fn to_xml_document(&self) -> Result<Vec<u8>, DatabaseError> {
        let mut root = XmlElement::new(ROOT_ELEMENT);
        for entry in self.entries.values() {
            root.children.push(entry.to_xml());
        }
        xml::write_document(&root)
    }

    fn from_xml_document(&mut self, bytes: &[u8]) -> Result<(), DatabaseError> {
        let root = xml::read_document(bytes)?;
        if root.name != ROOT_ELEMENT {
            return Err(DatabaseError::Corrupted(format!(
                "unexpected root element <{}>, expected <{ROOT_ELEMENT}>",
                root.name
            )));
        }
        for element in &root.children {
            let entry = Entry::from_xml(element)?;
            self.add_entry(entry)?;
        }
        Ok(())
    }
}

fn validate_extension(extension: &str) -> Result<(), DatabaseError> {
    if extension.is_empty() {
        return Err(DatabaseError::InvalidExtension(String::from(
            "extension is empty",
        )));
    }
    if !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DatabaseError::InvalidExtension(format!(
            "'{extension}' contains non-alphanumeric characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn sample() -> Database {
        let mut db = Database::new("launcher", "xml", "bin").unwrap();
        db.add_entry(Entry::with_content("Name", "Hello")).unwrap();
        db.add_entry(Entry::with_content("Count", 42i64)).unwrap();

        let mut nested = Entry::new("Video");
        nested
            .add_child(Entry::with_content("Width", 1920i64))
            .unwrap();
        db.add_entry(nested).unwrap();
        db
    }

    #[test]
    fn test_extension_validation() {
        assert!(matches!(
            Database::new("db", "", "bin"),
            Err(DatabaseError::InvalidExtension(_))
        ));
        assert!(matches!(
            Database::new("db", "xml", "b.n"),
            Err(DatabaseError::InvalidExtension(_))
        ));
        assert!(matches!(
            Database::new("db", "cfg", "CFG"),
            Err(DatabaseError::InvalidExtension(_))
        ));
        assert!(Database::new("db", "xml", "bin").is_ok());
    }

    #[test]
    fn test_format_dispatch() {
        let db = sample();
        assert_eq!(
            db.format_for(Path::new("saves/cfg.bin")).unwrap(),
            FileFormat::Binary
        );
        assert_eq!(
            db.format_for(Path::new("cfg.XML")).unwrap(),
            FileFormat::Xml
        );
        assert!(matches!(
            db.format_for(Path::new("cfg.json")),
            Err(DatabaseError::UnknownExtension { .. })
        ));
        assert!(matches!(
            db.format_for(Path::new("cfg")),
            Err(DatabaseError::UnknownExtension { .. })
        ));
    }

    #[test]
    fn test_duplicate_top_level_entry_rejected() {
        let mut db = sample();
        let err = db.add_entry(Entry::new("Name")).unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateEntry(name) if name == "Name"));
        // The original entry is untouched.
        assert_eq!(db.entry("Name").unwrap().text(), Some("Hello"));
    }

    #[test]
    fn test_binary_buffer_round_trip() {
        let db = sample();
        let bytes = db.to_binary();

        let mut reloaded = Database::new("launcher", "xml", "bin").unwrap();
        reloaded.from_binary(&bytes).unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.entry("Count").unwrap().integer(), Some(42));
        assert_eq!(
            reloaded
                .entry("Video")
                .unwrap()
                .child("Width")
                .unwrap()
                .integer(),
            Some(1920)
        );
    }

    #[test]
    fn test_bad_magic_rejected() {
        let db = sample();
        let mut bytes = db.to_binary();
        bytes[0] ^= 0xff;

        let mut reloaded = Database::new("launcher", "xml", "bin").unwrap();
        let err = reloaded.from_binary(&bytes).unwrap_err();
        assert!(matches!(err, DatabaseError::Corrupted(reason) if reason.contains("identifier")));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let db = sample();
        let mut bytes = db.to_binary();
        bytes.extend_from_slice(b"junk");

        let mut reloaded = Database::new("launcher", "xml", "bin").unwrap();
        assert!(matches!(
            reloaded.from_binary(&bytes),
            Err(DatabaseError::Corrupted(_))
        ));
    }

    #[test]
    fn test_xml_document_round_trip() {
        let db = sample();
        let bytes = db.to_xml_document().unwrap();

        let mut reloaded = Database::new("launcher", "xml", "bin").unwrap();
        reloaded.from_xml_document(&bytes).unwrap();
        assert_eq!(&reloaded, &db);
    }

    #[test]
    fn test_xml_wrong_root_rejected() {
        let mut db = Database::new("launcher", "xml", "bin").unwrap();
        let err = db.from_xml_document(b"<Wrong/>").unwrap_err();
        assert!(matches!(err, DatabaseError::Corrupted(reason) if reason.contains("root")));
    }

    #[test]
    fn test_contains_with_and_without_children() {
        let db = sample();
        assert!(db.contains("Name", false));
        assert!(!db.contains("Width", false));
        assert!(db.contains("Width", true));
        assert!(!db.contains("Missing", true));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut db = sample();
        let removed = db.remove_entry("Count").unwrap();
        assert_eq!(removed.content(), Some(&Value::Integer(42)));
        assert!(db.entry("Count").is_none());

        db.clear();
        assert!(db.is_empty());
    }

    #[test]
    fn test_entries_iterate_in_name_order() {
        let db = sample();
        let names: Vec<_> = db.entries().map(Entry::name).collect();
        assert_eq!(names, ["Count", "Name", "Video"]);
    }

    #[test]
    fn test_empty_database_round_trip() {
        let db = Database::new("empty", "xml", "bin").unwrap();
        let bytes = db.to_binary();
        assert_eq!(bytes.len(), 8);

        let mut reloaded = Database::new("empty", "xml", "bin").unwrap();
        reloaded.from_binary(&bytes).unwrap();
        assert!(reloaded.is_empty());
    }
}
