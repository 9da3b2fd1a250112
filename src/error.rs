use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors surfaced by [`Database`](crate::Database) operations.
///
/// `NotFound` is kept distinct from `Corrupted` so callers can branch on
/// "first run, no config yet" versus "config exists but is damaged".
#[derive(Debug)]
pub enum DatabaseError {
    /// A configured file extension is empty, not ASCII-alphanumeric, or
    /// collides with the other configured extension.
    InvalidExtension(String),
    /// The path given to save/load matches neither configured extension.
    /// Carries the two accepted extensions.
    UnknownExtension {
        path: PathBuf,
        xml_extension: String,
        binary_extension: String,
    },
    /// The file to load does not exist.
    NotFound(PathBuf),
    /// The file identifier, a marker, or a field in the stream is wrong,
    /// truncated, or otherwise unreadable.
    Corrupted(String),
    /// An entry with this name already exists among its siblings.
    DuplicateEntry(String),
    /// A value-level conversion or comparison failed.
    Value(ValueError),
    /// An underlying I/O error occurred.
    Io(io::Error),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::InvalidExtension(reason) => {
                write!(f, "invalid file extension: {reason}")
            }
            DatabaseError::UnknownExtension {
                path,
                xml_extension,
                binary_extension,
            } => {
                write!(
                    f,
                    "unrecognized extension on '{}': expected '.{xml_extension}' or '.{binary_extension}'",
                    path.display()
                )
            }
            DatabaseError::NotFound(path) => {
                write!(f, "file '{}' not found", path.display())
            }
            DatabaseError::Corrupted(reason) => write!(f, "corrupted data: {reason}"),
            DatabaseError::DuplicateEntry(name) => {
                write!(f, "an entry named '{name}' already exists")
            }
            DatabaseError::Value(e) => write!(f, "value error: {e}"),
            DatabaseError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for DatabaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatabaseError::Value(e) => Some(e),
            DatabaseError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DatabaseError {
    fn from(err: io::Error) -> Self {
        DatabaseError::Io(err)
    }
}

impl From<ValueError> for DatabaseError {
    fn from(err: ValueError) -> Self {
        DatabaseError::Value(err)
    }
}

/// Errors from loud value conversions and orderings.
///
/// Equality between values never fails; ordering and explicit conversion do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The text could not be parsed as a number.
    NotNumeric(String),
    /// The two kinds have no defined ordering (e.g. boolean vs vector).
    Incomparable {
        left: &'static str,
        right: &'static str,
    },
    /// A vector index or length is outside 1..=4, or a numeric value does
    /// not fit the requested representation.
    OutOfRange(String),
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::NotNumeric(text) => {
                write!(f, "'{text}' is not a number")
            }
            ValueError::Incomparable { left, right } => {
                write!(f, "cannot order {left} against {right}")
            }
            ValueError::OutOfRange(reason) => write!(f, "out of range: {reason}"),
        }
    }
}

impl std::error::Error for ValueError {}

/// Errors raised while building a [`TagRegistry`](crate::TagRegistry).
///
/// Both variants are configuration errors: they fire when the registry is
/// constructed, before any save or load can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The same tag name was registered twice.
    DuplicateTag(String),
    /// Two distinct tag names hash to the same 32-bit value.
    HashCollision {
        hash: u32,
        first: String,
        second: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateTag(name) => {
                write!(f, "type tag '{name}' registered twice")
            }
            RegistryError::HashCollision {
                hash,
                first,
                second,
            } => {
                write!(
                    f,
                    "type tags '{first}' and '{second}' collide on hash {hash:#010x}"
                )
            }
        }
    }
}

impl std::error::Error for RegistryError {}
