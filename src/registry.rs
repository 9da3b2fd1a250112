//! Content type-tag registry.
//!
//! Every storable value kind is identified on the wire by a short tag name
//! and its 32-bit CRC hash. The registry maps that hash back to the tag and
//! its decode functions. The set of kinds is closed and known at compile
//! time, so the process-wide table is built once from an explicit list
//! rather than by scanning for marked types; collisions are detected while
//! the table is built, before any save or load can run.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::codec::ByteReader;
use crate::error::{DatabaseError, RegistryError};
use crate::value::{self, Value};
use crate::xml::XmlElement;

/// A registered content kind identifier: the tag name plus its CRC32 hash.
///
/// The hash is what the binary format stores; the name is what the XML
/// format stores as the content element's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeTag {
    name: &'static str,
    hash: u32,
}

impl TypeTag {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            hash: tag_hash(name),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }
}

/// Hash used to identify a tag in the binary format.
pub fn tag_hash(name: &str) -> u32 {
    crc32fast::hash(name.as_bytes())
}

pub(crate) type BinaryDecoder = fn(&mut ByteReader<'_>) -> Result<Value, DatabaseError>;
pub(crate) type XmlDecoder = fn(&XmlElement) -> Result<Value, DatabaseError>;

/// A tag together with its decode entry points.
pub(crate) struct Registration {
    pub(crate) tag: TypeTag,
    pub(crate) binary: BinaryDecoder,
    pub(crate) xml: XmlDecoder,
}

/// Lookup table from tag hash (and name) to registration.
pub struct TagRegistry {
    by_hash: HashMap<u32, Registration>,
}

impl TagRegistry {
    /// Builds a registry from the given registrations.
    ///
    /// Fails with [`RegistryError::DuplicateTag`] if a name appears twice
    /// and [`RegistryError::HashCollision`] if two distinct names hash to
    /// the same 32-bit value.
    pub(crate) fn with_registrations(
        registrations: Vec<Registration>,
    ) -> Result<Self, RegistryError> {
        let mut by_hash: HashMap<u32, Registration> = HashMap::with_capacity(registrations.len());
        for registration in registrations {
            if let Some(existing) = by_hash.get(&registration.tag.hash()) {
                if existing.tag.name() == registration.tag.name() {
                    return Err(RegistryError::DuplicateTag(
                        registration.tag.name().to_string(),
                    ));
                }
                return Err(RegistryError::HashCollision {
                    hash: registration.tag.hash(),
                    first: existing.tag.name().to_string(),
                    second: registration.tag.name().to_string(),
                });
            }
            by_hash.insert(registration.tag.hash(), registration);
        }
        Ok(Self { by_hash })
    }

    /// Resolves a tag by the 32-bit hash stored in a binary stream.
    pub(crate) fn resolve_hash(&self, hash: u32) -> Option<&Registration> {
        self.by_hash.get(&hash)
    }

    /// Resolves a tag by the element name stored in an XML document.
    pub(crate) fn resolve_name(&self, name: &str) -> Option<&Registration> {
        self.by_hash.values().find(|r| r.tag.name() == name)
    }

    /// All registered tags, in no particular order.
    pub fn tags(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.by_hash.values().map(|r| r.tag)
    }
}

fn builtin_registrations() -> Vec<Registration> {
    vec![
        Registration {
            tag: TypeTag::new(value::TEXT_TAG),
            binary: value::decode_text,
            xml: value::decode_text_xml,
        },
        Registration {
            tag: TypeTag::new(value::INTEGER_TAG),
            binary: value::decode_integer,
            xml: value::decode_integer_xml,
        },
        Registration {
            tag: TypeTag::new(value::DECIMAL_TAG),
            binary: value::decode_decimal,
            xml: value::decode_decimal_xml,
        },
        Registration {
            tag: TypeTag::new(value::DOUBLE_TAG),
            binary: value::decode_double,
            xml: value::decode_double_xml,
        },
        Registration {
            tag: TypeTag::new(value::BOOLEAN_TAG),
            binary: value::decode_boolean,
            xml: value::decode_boolean_xml,
        },
        Registration {
            tag: TypeTag::new(value::VECTOR_TAG),
            binary: value::decode_vector,
            xml: value::decode_vector_xml,
        },
    ]
}

static GLOBAL: LazyLock<TagRegistry> = LazyLock::new(|| {
    TagRegistry::with_registrations(builtin_registrations())
        .expect("built-in content tags are collision-free")
});

/// The process-wide registry of built-in content kinds.
///
/// Built on first use; read-only afterwards.
pub fn global() -> &'static TagRegistry {
    &GLOBAL
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_binary(_: &mut ByteReader<'_>) -> Result<Value, DatabaseError> {
        Ok(Value::Boolean(false))
    }

    fn noop_xml(_: &XmlElement) -> Result<Value, DatabaseError> {
        Ok(Value::Boolean(false))
    }

    #[test]
    fn test_builtin_registry_resolves_every_tag() {
        let registry = global();
        for name in [
            value::TEXT_TAG,
            value::INTEGER_TAG,
            value::DECIMAL_TAG,
            value::DOUBLE_TAG,
            value::BOOLEAN_TAG,
            value::VECTOR_TAG,
        ] {
            let registration = registry.resolve_name(name).unwrap();
            assert_eq!(registration.tag.name(), name);
            assert_eq!(
                registry.resolve_hash(tag_hash(name)).unwrap().tag.name(),
                name
            );
        }
        assert_eq!(registry.tags().count(), 6);
    }

    #[test]
    fn test_unknown_hash_resolves_to_none() {
        assert!(global().resolve_hash(0xfeed_f00d).is_none());
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let registrations = vec![
            Registration {
                tag: TypeTag::new("Alpha"),
                binary: noop_binary,
                xml: noop_xml,
            },
            Registration {
                tag: TypeTag::new("Alpha"),
                binary: noop_binary,
                xml: noop_xml,
            },
        ];
        let err = TagRegistry::with_registrations(registrations).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTag(String::from("Alpha")));
    }

    #[test]
    fn test_hash_collision_rejected_at_registration() {
        // Two distinct names forced onto the same hash slot.
        let first = TypeTag::new("Alpha");
        let forged = TypeTag {
            name: "Beta",
            hash: first.hash(),
        };
        let registrations = vec![
            Registration {
                tag: first,
                binary: noop_binary,
                xml: noop_xml,
            },
            Registration {
                tag: forged,
                binary: noop_binary,
                xml: noop_xml,
            },
        ];
        let err = TagRegistry::with_registrations(registrations).unwrap_err();
        match err {
            RegistryError::HashCollision { first, second, .. } => {
                assert_eq!(first, "Alpha");
                assert_eq!(second, "Beta");
            }
            other => panic!("expected hash collision, got {other:?}"),
        }
    }

    #[test]
    fn test_tag_hash_is_crc32_of_name() {
        assert_eq!(tag_hash("Text"), crc32fast::hash(b"Text"));
        assert_ne!(tag_hash("Text"), tag_hash("Integer"));
    }
}
