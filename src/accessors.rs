//! Convenience accessors shared by [`Database`] and [`Entry`].
//!
//! Configuration objects mostly want "read the integer named X, or nothing"
//! rather than navigating entries by hand. [`NodeStore`] abstracts over the
//! two containers of named entries (a database's top level and an entry's
//! children) and layers the typed helpers on top. All getters are
//! soft-misses: a missing entry or a kind mismatch yields `None`.

use std::fmt::Display;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::database::Database;
use crate::entry::Entry;
use crate::error::DatabaseError;
use crate::value::{Value, Vector};

/// A container of uniquely named entries.
pub trait NodeStore {
    fn node(&self, name: &str) -> Option<&Entry>;
    fn node_mut(&mut self, name: &str) -> Option<&mut Entry>;
    /// Inserts an entry; a name collision is an error.
    fn insert_node(&mut self, entry: Entry) -> Result<(), DatabaseError>;
    fn remove_node(&mut self, name: &str) -> Option<Entry>;

    /// Sets the named entry's content, creating the entry if needed.
    fn add_content(&mut self, name: &str, value: impl Into<Value>) -> Result<(), DatabaseError> {
        match self.node_mut(name) {
            Some(entry) => {
                entry.set_content(value);
                Ok(())
            }
            None => self.insert_node(Entry::with_content(name, value)),
        }
    }

    fn get_text(&self, name: &str) -> Option<&str> {
        self.node(name)?.text()
    }

    fn get_integer(&self, name: &str) -> Option<i64> {
        self.node(name)?.integer()
    }

    fn get_decimal(&self, name: &str) -> Option<Decimal> {
        self.node(name)?.decimal()
    }

    fn get_double(&self, name: &str) -> Option<f64> {
        self.node(name)?.double()
    }

    fn get_boolean(&self, name: &str) -> Option<bool> {
        self.node(name)?.boolean()
    }

    fn get_vector(&self, name: &str) -> Option<&Vector> {
        self.node(name)?.vector()
    }

    /// Stores an enum (or anything `Display`) as a text entry.
    fn add_enum(&mut self, name: &str, value: impl Display) -> Result<(), DatabaseError> {
        self.add_content(name, value.to_string())
    }

    /// Reads back a value stored with [`add_enum`](Self::add_enum).
    /// Missing entry, wrong kind, or a failed parse all yield `None`.
    fn get_enum<E: FromStr>(&self, name: &str) -> Option<E> {
        self.get_text(name)?.parse().ok()
    }

    /// Presence-flag helper: `true` creates a bare entry, `false` removes
    /// it. The flag is the entry's existence; it carries no content.
    fn set_flag(&mut self, name: &str, on: bool) {
        if on {
            if self.node(name).is_none() {
                // Cannot collide: we just checked.
                let _ = self.insert_node(Entry::new(name));
            }
        } else {
            self.remove_node(name);
        }
    }

    /// Whether the presence flag is set.
    fn flag(&self, name: &str) -> bool {
        self.node(name).is_some()
    }
}

impl NodeStore for Database {
    fn node(&self, name: &str) -> Option<&Entry> {
        self.entry(name)
    }

    fn node_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.entry_mut(name)
    }

    fn insert_node(&mut self, entry: Entry) -> Result<(), DatabaseError> {
        self.add_entry(entry)
    }

    fn remove_node(&mut self, name: &str) -> Option<Entry> {
        self.remove_entry(name)
    }
}

impl NodeStore for Entry {
    fn node(&self, name: &str) -> Option<&Entry> {
        self.child(name)
    }

    fn node_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.child_mut(name)
    }

    fn insert_node(&mut self, entry: Entry) -> Result<(), DatabaseError> {
        self.add_child(entry)
    }

    fn remove_node(&mut self, name: &str) -> Option<Entry> {
        self.remove_child(name)
    }
}
