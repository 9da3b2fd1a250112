//! Hierarchical typed configuration store with binary and XML persistence.
//!
//! `loadout` keeps named trees of typed values — the saved launch
//! configurations of a game launcher: which base game file to use, which
//! extra files to stack on top, resolution, gameplay switches. A
//! [`Database`] owns the top-level [`Entry`] set; each entry optionally
//! holds one typed [`Value`] and any number of named child entries. The
//! whole tree serializes to either a compact binary format or an XML
//! document, selected by the file extension, and loads back losslessly.
//!
//! # Data model
//!
//! - [`Value`]: text, 64-bit integer, fixed-point decimal, double, boolean,
//!   or a 1–4 component decimal vector. Values compare across kinds:
//!   numeric kinds normalize before comparing, text parses when compared
//!   against a number, and doubles tolerate round-trip error.
//! - [`Entry`]: a named node. Content, children, both, or neither — a bare
//!   entry doubles as a presence flag.
//! - [`Database`]: the named root set plus `save`/`load` dispatch.
//! - Content kinds are identified on the wire by registered type tags; see
//!   [`registry`].
//!
//! # Example
//!
//! ```
//! use loadout::{Database, Entry, NodeStore};
//!
//! # fn main() -> Result<(), loadout::DatabaseError> {
//! let mut db = Database::new("launcher", "xml", "bin")?;
//! db.add_entry(Entry::with_content("Name", "Hello"))?;
//! db.add_content("Count", 42i64)?;
//!
//! let path = std::env::temp_dir().join("loadout_doc_example.bin");
//! db.save(&path)?;
//!
//! let mut reloaded = Database::new("launcher", "xml", "bin")?;
//! reloaded.load(&path)?;
//! assert_eq!(reloaded.entry("Name").unwrap().text(), Some("Hello"));
//! assert_eq!(reloaded.entry("Count").unwrap().integer(), Some(42));
//! # std::fs::remove_file(&path).ok();
//! # Ok(())
//! # }
//! ```
//!
//! # Error model
//!
//! Misconfiguration (bad extensions, tag collisions) and format damage
//! (bad magic, truncated stream, malformed attributes) fail loudly; lookup
//! misses (absent entry, kind mismatch, unknown content tag in a newer
//! file) are soft and come back as `None` or a contentless entry.
//!
//! Everything here is synchronous and single-threaded; wrap a `Database`
//! in your own lock if you share it across threads.

mod accessors;
pub(crate) mod codec;
mod database;
mod entry;
mod error;
pub mod registry;
mod value;
pub(crate) mod xml;

pub use accessors::NodeStore;
pub use database::Database;
pub use entry::Entry;
pub use error::{DatabaseError, RegistryError, ValueError};
pub use registry::{TagRegistry, TypeTag};
pub use value::{DOUBLE_TOLERANCE, Value, Vector};

// The decimal type used by `Value::Decimal` and `Vector`, re-exported so
// callers do not need their own dependency on the crate.
pub use rust_decimal::Decimal;
