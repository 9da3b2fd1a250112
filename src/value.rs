//! Typed leaf values and their codecs.
//!
//! A [`Value`] is one storable datum: text, a 64-bit integer, a fixed-point
//! decimal, a double, a boolean, or a short vector of decimals. Each kind
//! knows how to write itself to the binary wire format and to an XML
//! element, and values compare across kinds: numeric kinds normalize to a
//! common representation first, and text compared against a number is
//! parsed before comparing.
//!
//! Equality is soft: a non-numeric text against a number is simply unequal.
//! Ordering and explicit conversion are loud and return [`ValueError`].

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::codec::{ByteReader, write_string};
use crate::error::{DatabaseError, ValueError};
use crate::xml::XmlElement;

pub(crate) const TEXT_TAG: &str = "Text";
pub(crate) const INTEGER_TAG: &str = "Integer";
pub(crate) const DECIMAL_TAG: &str = "Decimal";
pub(crate) const DOUBLE_TAG: &str = "Double";
pub(crate) const BOOLEAN_TAG: &str = "Boolean";
pub(crate) const VECTOR_TAG: &str = "Vector";

/// Absolute tolerance applied whenever a comparison involves a double,
/// directly or through text parsed as one. Integer and decimal comparisons
/// are exact.
pub const DOUBLE_TOLERANCE: f64 = 1e-6;

/// Attribute names for vector components, in component order.
/// Component 0 is X (or R), 1 is Y (G), 2 is Z (B), 3 is W (A).
const COMPONENT_NAMES: [&str; 4] = ["X", "Y", "Z", "W"];

/// A fixed-length list of decimals, 1 to 4 components long.
///
/// Components are addressable by position and by the usual spatial (X/Y/Z/W)
/// and color (R/G/B/A) aliases.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    components: Vec<Decimal>,
}

impl Vector {
    pub const MAX_COMPONENTS: usize = 4;

    /// Creates a vector from the given components.
    ///
    /// Fails unless the length is in `1..=4`.
    pub fn new(components: Vec<Decimal>) -> Result<Self, ValueError> {
        if components.is_empty() || components.len() > Self::MAX_COMPONENTS {
            return Err(ValueError::OutOfRange(format!(
                "vector length {} is outside 1..={}",
                components.len(),
                Self::MAX_COMPONENTS
            )));
        }
        Ok(Self { components })
    }

    /// Creates a vector of `len` zero components.
    pub fn zeroed(len: usize) -> Result<Self, ValueError> {
        Self::new(vec![Decimal::ZERO; len])
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        // Length is always in 1..=4.
        false
    }

    pub fn components(&self) -> &[Decimal] {
        &self.components
    }

    pub fn get(&self, index: usize) -> Option<Decimal> {
        self.components.get(index).copied()
    }

    /// Replaces the component at `index`, failing if the vector is shorter.
    pub fn set(&mut self, index: usize, value: Decimal) -> Result<(), ValueError> {
        match self.components.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ValueError::OutOfRange(format!(
                "component {index} of a {}-component vector",
                self.components.len()
            ))),
        }
    }

    /// First component. Always present.
    pub fn x(&self) -> Decimal {
        self.components[0]
    }

    pub fn y(&self) -> Option<Decimal> {
        self.get(1)
    }

    pub fn z(&self) -> Option<Decimal> {
        self.get(2)
    }

    pub fn w(&self) -> Option<Decimal> {
        self.get(3)
    }

    pub fn set_x(&mut self, value: Decimal) {
        self.components[0] = value;
    }

    pub fn set_y(&mut self, value: Decimal) -> Result<(), ValueError> {
        self.set(1, value)
    }

    pub fn set_z(&mut self, value: Decimal) -> Result<(), ValueError> {
        self.set(2, value)
    }

    pub fn set_w(&mut self, value: Decimal) -> Result<(), ValueError> {
        self.set(3, value)
    }

    /// Color alias for [`x`](Self::x).
    pub fn r(&self) -> Decimal {
        self.x()
    }

    /// Color alias for [`y`](Self::y).
    pub fn g(&self) -> Option<Decimal> {
        self.y()
    }

    /// Color alias for [`z`](Self::z).
    pub fn b(&self) -> Option<Decimal> {
        self.z()
    }

    /// Color alias for [`w`](Self::w).
    pub fn a(&self) -> Option<Decimal> {
        self.w()
    }

    pub fn set_r(&mut self, value: Decimal) {
        self.set_x(value);
    }

    pub fn set_g(&mut self, value: Decimal) -> Result<(), ValueError> {
        self.set_y(value)
    }

    pub fn set_b(&mut self, value: Decimal) -> Result<(), ValueError> {
        self.set_z(value)
    }

    pub fn set_a(&mut self, value: Decimal) -> Result<(), ValueError> {
        self.set_w(value)
    }
}

/// One storable leaf value.
#[derive(Debug, Clone)]
pub enum Value {
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Double(f64),
    Boolean(bool),
    Vector(Vector),
}

impl Value {
    /// The registered tag name identifying this kind on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            Value::Text(_) => TEXT_TAG,
            Value::Integer(_) => INTEGER_TAG,
            Value::Decimal(_) => DECIMAL_TAG,
            Value::Double(_) => DOUBLE_TAG,
            Value::Boolean(_) => BOOLEAN_TAG,
            Value::Vector(_) => VECTOR_TAG,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&Vector> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Converts to an integer, parsing text and rounding doubles.
    pub fn to_integer(&self) -> Result<i64, ValueError> {
        match self {
            Value::Integer(v) => Ok(*v),
            Value::Decimal(d) => d.to_i64().ok_or_else(|| {
                ValueError::OutOfRange(format!("decimal {d} does not fit a 64-bit integer"))
            }),
            Value::Double(d) => {
                let rounded = d.round();
                if rounded.is_finite() && (i64::MIN as f64..=i64::MAX as f64).contains(&rounded) {
                    Ok(rounded as i64)
                } else {
                    Err(ValueError::OutOfRange(format!(
                        "double {d} does not fit a 64-bit integer"
                    )))
                }
            }
            Value::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| ValueError::NotNumeric(s.clone())),
            Value::Boolean(b) => Ok(i64::from(*b)),
            Value::Vector(_) => Err(ValueError::OutOfRange(String::from(
                "a vector does not convert to an integer",
            ))),
        }
    }

    /// Converts to a double, parsing text.
    pub fn to_double(&self) -> Result<f64, ValueError> {
        match self {
            Value::Integer(v) => Ok(*v as f64),
            Value::Decimal(d) => d.to_f64().ok_or_else(|| {
                ValueError::OutOfRange(format!("decimal {d} does not convert to a double"))
            }),
            Value::Double(d) => Ok(*d),
            Value::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ValueError::NotNumeric(s.clone())),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Vector(_) => Err(ValueError::OutOfRange(String::from(
                "a vector does not convert to a double",
            ))),
        }
    }

    /// Converts to a decimal, parsing text.
    pub fn to_decimal(&self) -> Result<Decimal, ValueError> {
        match self {
            Value::Integer(v) => Ok(Decimal::from(*v)),
            Value::Decimal(d) => Ok(*d),
            Value::Double(d) => Decimal::from_f64(*d).ok_or_else(|| {
                ValueError::OutOfRange(format!("double {d} does not fit a decimal"))
            }),
            Value::Text(s) => {
                let trimmed = s.trim();
                if let Ok(d) = trimmed.parse::<Decimal>() {
                    return Ok(d);
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(Decimal::from_f64)
                    .ok_or_else(|| ValueError::NotNumeric(s.clone()))
            }
            Value::Boolean(b) => Ok(Decimal::from(i64::from(*b))),
            Value::Vector(_) => Err(ValueError::OutOfRange(String::from(
                "a vector does not convert to a decimal",
            ))),
        }
    }

    /// Converts to a boolean. Numbers convert by zero/non-zero, text by
    /// `"1"`/`"0"`/`"true"`/`"false"`.
    pub fn to_boolean(&self) -> Result<bool, ValueError> {
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::Integer(v) => Ok(*v != 0),
            Value::Decimal(d) => Ok(!d.is_zero()),
            Value::Double(d) => Ok(*d != 0.0),
            Value::Text(s) => match s.trim() {
                "1" => Ok(true),
                "0" => Ok(false),
                other => other
                    .to_ascii_lowercase()
                    .parse::<bool>()
                    .map_err(|_| ValueError::NotNumeric(s.clone())),
            },
            Value::Vector(_) => Err(ValueError::OutOfRange(String::from(
                "a vector does not convert to a boolean",
            ))),
        }
    }

    /// Orders this value against another.
    ///
    /// Text orders against text lexicographically and against numbers by
    /// parsing; a non-numeric text against a number fails loudly, as do
    /// kind pairs with no defined ordering. Comparisons involving doubles
    /// treat values within [`DOUBLE_TOLERANCE`] as equal, consistent with
    /// `==`.
    pub fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a.cmp(b)),
            (a, b) => {
                let left = numeric(a).ok_or_else(|| not_numeric(a, b))?;
                let right = numeric(b).ok_or_else(|| not_numeric(b, a))?;
                numeric_cmp(&left, &right).ok_or(ValueError::Incomparable {
                    left: a.tag(),
                    right: b.tag(),
                })
            }
        }
    }

    pub(crate) fn tag_hash(&self) -> u32 {
        crate::registry::tag_hash(self.tag())
    }

    /// Appends this value's binary form.
    ///
    /// Per-kind layout (little-endian):
    /// - Text: `i64` byte length + UTF-8 bytes
    /// - Integer: `i64`
    /// - Decimal: 16-byte fixed-point representation
    /// - Double: `f64`
    /// - Boolean: one byte
    /// - Vector: `u32` component count + one 16-byte decimal per component
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            Value::Text(s) => write_string(buf, s),
            Value::Integer(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Value::Decimal(d) => buf.extend_from_slice(&d.serialize()),
            Value::Double(d) => buf.extend_from_slice(&d.to_le_bytes()),
            Value::Boolean(b) => buf.push(u8::from(*b)),
            Value::Vector(v) => {
                buf.extend_from_slice(&(v.len() as u32).to_le_bytes());
                for component in v.components() {
                    buf.extend_from_slice(&component.serialize());
                }
            }
        }
    }

    /// Builds the XML element holding this value, named after its tag.
    ///
    /// Numbers are formatted locale-invariantly; a vector writes one
    /// attribute per component (`X`, `Y`, `Z`, `W` in order), omitting the
    /// trailing names beyond its length.
    pub(crate) fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(self.tag());
        match self {
            Value::Text(s) => element.text = s.clone(),
            Value::Integer(v) => element.set_attribute("value", v.to_string()),
            Value::Decimal(d) => element.set_attribute("value", d.to_string()),
            Value::Double(d) => element.set_attribute("value", d.to_string()),
            Value::Boolean(b) => element.set_attribute("value", if *b { "1" } else { "0" }),
            Value::Vector(v) => {
                for (index, name) in COMPONENT_NAMES.iter().enumerate().take(v.len()) {
                    let component = v.get(index).unwrap_or(Decimal::ZERO);
                    element.set_attribute(*name, component.to_string());
                }
            }
        }
        element
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::Boolean(b) => f.write_str(if *b { "1" } else { "0" }),
            Value::Vector(v) => {
                let mut first = true;
                f.write_str("(")?;
                for component in v.components() {
                    if !first {
                        f.write_str(", ")?;
                    }
                    write!(f, "{component}")?;
                    first = false;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<Vector> for Value {
    fn from(v: Vector) -> Self {
        Value::Vector(v)
    }
}

/// Common numeric representation for cross-kind comparison.
enum Numeric {
    Int(i64),
    Dec(Decimal),
    Float(f64),
}

fn numeric(value: &Value) -> Option<Numeric> {
    match value {
        Value::Integer(v) => Some(Numeric::Int(*v)),
        Value::Decimal(d) => Some(Numeric::Dec(*d)),
        Value::Double(d) => Some(Numeric::Float(*d)),
        Value::Text(s) => parse_numeric_text(s),
        _ => None,
    }
}

/// Locale-invariant numeric parse: integer first, then decimal, then float
/// (which picks up scientific notation).
fn parse_numeric_text(text: &str) -> Option<Numeric> {
    let trimmed = text.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(Numeric::Int(v));
    }
    if let Ok(d) = trimmed.parse::<Decimal>() {
        return Some(Numeric::Dec(d));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Numeric::Float)
}

fn not_numeric(offender: &Value, other: &Value) -> ValueError {
    match offender {
        Value::Text(s) => ValueError::NotNumeric(s.clone()),
        _ => ValueError::Incomparable {
            left: offender.tag(),
            right: other.tag(),
        },
    }
}

fn as_f64(n: &Numeric) -> f64 {
    match n {
        Numeric::Int(v) => *v as f64,
        Numeric::Dec(d) => d.to_f64().unwrap_or(f64::NAN),
        Numeric::Float(f) => *f,
    }
}

fn numeric_eq(a: &Numeric, b: &Numeric) -> bool {
    match (a, b) {
        (Numeric::Float(_), _) | (_, Numeric::Float(_)) => {
            (as_f64(a) - as_f64(b)).abs() <= DOUBLE_TOLERANCE
        }
        (Numeric::Int(x), Numeric::Int(y)) => x == y,
        (Numeric::Int(x), Numeric::Dec(d)) | (Numeric::Dec(d), Numeric::Int(x)) => {
            Decimal::from(*x) == *d
        }
        (Numeric::Dec(x), Numeric::Dec(y)) => x == y,
    }
}

fn numeric_cmp(a: &Numeric, b: &Numeric) -> Option<Ordering> {
    match (a, b) {
        (Numeric::Float(_), _) | (_, Numeric::Float(_)) => {
            let (x, y) = (as_f64(a), as_f64(b));
            if (x - y).abs() <= DOUBLE_TOLERANCE {
                Some(Ordering::Equal)
            } else {
                x.partial_cmp(&y)
            }
        }
        (Numeric::Int(x), Numeric::Int(y)) => Some(x.cmp(y)),
        (Numeric::Int(x), Numeric::Dec(d)) => Some(Decimal::from(*x).cmp(d)),
        (Numeric::Dec(d), Numeric::Int(x)) => Some(d.cmp(&Decimal::from(*x))),
        (Numeric::Dec(x), Numeric::Dec(y)) => Some(x.cmp(y)),
    }
}

impl PartialEq for Value {
    /// Cross-kind equality. Never fails: a non-numeric text against a
    /// number is unequal, not an error.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (a, b) => match (numeric(a), numeric(b)) {
                (Some(x), Some(y)) => numeric_eq(&x, &y),
                _ => false,
            },
        }
    }
}

pub(crate) fn decode_text(reader: &mut ByteReader<'_>) -> Result<Value, DatabaseError> {
    Ok(Value::Text(reader.read_string("text content")?))
}

pub(crate) fn decode_integer(reader: &mut ByteReader<'_>) -> Result<Value, DatabaseError> {
    Ok(Value::Integer(reader.read_i64("integer content")?))
}

pub(crate) fn decode_decimal(reader: &mut ByteReader<'_>) -> Result<Value, DatabaseError> {
    Ok(Value::Decimal(read_decimal(reader, "decimal content")?))
}

pub(crate) fn decode_double(reader: &mut ByteReader<'_>) -> Result<Value, DatabaseError> {
    Ok(Value::Double(reader.read_f64("double content")?))
}

pub(crate) fn decode_boolean(reader: &mut ByteReader<'_>) -> Result<Value, DatabaseError> {
    match reader.read_u8("boolean content")? {
        0 => Ok(Value::Boolean(false)),
        1 => Ok(Value::Boolean(true)),
        other => Err(DatabaseError::Corrupted(format!(
            "invalid boolean byte: {other}"
        ))),
    }
}

pub(crate) fn decode_vector(reader: &mut ByteReader<'_>) -> Result<Value, DatabaseError> {
    let count = reader.read_u32("vector component count")? as usize;
    if !(1..=Vector::MAX_COMPONENTS).contains(&count) {
        return Err(DatabaseError::Corrupted(format!(
            "vector component count {count} is outside 1..={}",
            Vector::MAX_COMPONENTS
        )));
    }
    let mut components = Vec::with_capacity(count);
    for _ in 0..count {
        components.push(read_decimal(reader, "vector component")?);
    }
    Ok(Value::Vector(Vector::new(components)?))
}

fn read_decimal(reader: &mut ByteReader<'_>, field: &str) -> Result<Decimal, DatabaseError> {
    let bytes: [u8; 16] = reader
        .read_bytes(16, field)?
        .try_into()
        .expect("read_bytes returned 16 bytes");
    Ok(Decimal::deserialize(bytes))
}

fn value_attribute<'a>(element: &'a XmlElement) -> Result<&'a str, DatabaseError> {
    element.attribute("value").ok_or_else(|| {
        DatabaseError::Corrupted(format!(
            "<{}> element is missing its 'value' attribute",
            element.name
        ))
    })
}

pub(crate) fn decode_text_xml(element: &XmlElement) -> Result<Value, DatabaseError> {
    Ok(Value::Text(element.text.clone()))
}

pub(crate) fn decode_integer_xml(element: &XmlElement) -> Result<Value, DatabaseError> {
    let raw = value_attribute(element)?;
    raw.parse::<i64>().map(Value::Integer).map_err(|_| {
        DatabaseError::Corrupted(format!("'{raw}' is not a valid integer attribute"))
    })
}

pub(crate) fn decode_decimal_xml(element: &XmlElement) -> Result<Value, DatabaseError> {
    let raw = value_attribute(element)?;
    raw.parse::<Decimal>().map(Value::Decimal).map_err(|_| {
        DatabaseError::Corrupted(format!("'{raw}' is not a valid decimal attribute"))
    })
}

pub(crate) fn decode_double_xml(element: &XmlElement) -> Result<Value, DatabaseError> {
    let raw = value_attribute(element)?;
    raw.parse::<f64>()
        .map(Value::Double)
        .map_err(|_| DatabaseError::Corrupted(format!("'{raw}' is not a valid double attribute")))
}

pub(crate) fn decode_boolean_xml(element: &XmlElement) -> Result<Value, DatabaseError> {
    match value_attribute(element)? {
        "1" => Ok(Value::Boolean(true)),
        "0" => Ok(Value::Boolean(false)),
        other => Err(DatabaseError::Corrupted(format!(
            "'{other}' is not a valid boolean attribute (expected '1' or '0')"
        ))),
    }
}

/// Reconstructs a vector from its `X`/`Y`/`Z`/`W` attributes, scanning in
/// order and stopping at the first absent one. The component count is not
/// stored explicitly.
pub(crate) fn decode_vector_xml(element: &XmlElement) -> Result<Value, DatabaseError> {
    let mut components = Vec::new();
    for name in COMPONENT_NAMES {
        let Some(raw) = element.attribute(name) else {
            break;
        };
        let component = raw.parse::<Decimal>().map_err(|_| {
            DatabaseError::Corrupted(format!(
                "'{raw}' is not a valid decimal in vector component {name}"
            ))
        })?;
        components.push(component);
    }
    if components.is_empty() {
        return Err(DatabaseError::Corrupted(String::from(
            "vector element has no components",
        )));
    }
    Ok(Value::Vector(Vector::new(components)?))
}
