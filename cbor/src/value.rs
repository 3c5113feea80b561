/*!
The in-memory value domain of the codec.

A decoded CBOR item is a [`Value`]; the encoder accepts any [`Value`] graph.
Aliased or cyclic structure is expressed with [`Shared`], which is the unit
of identity for the value-sharing tags (28/29): two occurrences of the same
`Shared` in a graph refer to the same underlying value, and a `Shared` may
(directly or indirectly) contain itself.
*/

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::net::IpAddr;
use std::rc::Rc;

use num_bigint::BigInt;
use regex::Regex;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

/// A single CBOR data item.
///
/// Integers are arbitrary precision; the encoder selects major type 0/1 or
/// the bignum tags 2/3 by range. Map entries preserve insertion order, which
/// is also the order the decoder produces.
#[derive(Clone, Debug)]
pub enum Value {
    Integer(BigInt),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Bool(bool),
    Null,
    Undefined,
    Float(f64),
    /// An unassigned simple value (major type 7). Assigned points decode to
    /// the dedicated variants above; 24..=31 are reserved on the wire.
    Simple(u8),
    /// A semantic tag with no dedicated representation in this enum.
    Tag(u64, Box<Value>),
    /// A set (tag 258). Member order is wire order, or sorted in canonical
    /// encoding.
    Set(Vec<Value>),
    DateTime(OffsetDateTime),
    /// A datetime without a UTC offset. Encoding one requires a default
    /// timezone to be configured.
    NaiveDateTime(PrimitiveDateTime),
    Date(Date),
    /// A finite decimal fraction (tag 4): `mantissa * 10^exponent`.
    Decimal(Decimal),
    /// A bigfloat (tag 5): `mantissa * 2^exponent`.
    BigFloat(BigFloat),
    /// A rational number (tag 30).
    Rational(Rational),
    /// A compiled regular expression (tag 35).
    Regex(Regex),
    /// A MIME message in its serialized text form (tag 36).
    Mime(String),
    Uuid(Uuid),
    /// An IP address (tag 260).
    Address(IpAddr),
    /// An IP network (tag 261).
    Network(IpNetwork),
    /// An aliasable, possibly self-referential value (tags 28/29).
    Shared(Shared),
    /// An opaque host value, encodable only through a registered handler.
    Custom(Rc<dyn CustomValue>),
}

/// The coarse classification of a [`Value`], used for handler dispatch and
/// error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Integer,
    Bytes,
    Text,
    Array,
    Map,
    Bool,
    Null,
    Undefined,
    Float,
    Simple,
    Tag,
    Set,
    DateTime,
    NaiveDateTime,
    Date,
    Decimal,
    BigFloat,
    Rational,
    Regex,
    Mime,
    Uuid,
    Address,
    Network,
    Shared,
    Custom,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Integer => "integer",
            Kind::Bytes => "byte string",
            Kind::Text => "text string",
            Kind::Array => "array",
            Kind::Map => "map",
            Kind::Bool => "boolean",
            Kind::Null => "null",
            Kind::Undefined => "undefined",
            Kind::Float => "float",
            Kind::Simple => "simple value",
            Kind::Tag => "tagged value",
            Kind::Set => "set",
            Kind::DateTime => "datetime",
            Kind::NaiveDateTime => "naive datetime",
            Kind::Date => "date",
            Kind::Decimal => "decimal fraction",
            Kind::BigFloat => "bigfloat",
            Kind::Rational => "rational",
            Kind::Regex => "regular expression",
            Kind::Mime => "MIME message",
            Kind::Uuid => "UUID",
            Kind::Address => "IP address",
            Kind::Network => "IP network",
            Kind::Shared => "shared value",
            Kind::Custom => "custom value",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Integer(_) => Kind::Integer,
            Value::Bytes(_) => Kind::Bytes,
            Value::Text(_) => Kind::Text,
            Value::Array(_) => Kind::Array,
            Value::Map(_) => Kind::Map,
            Value::Bool(_) => Kind::Bool,
            Value::Null => Kind::Null,
            Value::Undefined => Kind::Undefined,
            Value::Float(_) => Kind::Float,
            Value::Simple(_) => Kind::Simple,
            Value::Tag(..) => Kind::Tag,
            Value::Set(_) => Kind::Set,
            Value::DateTime(_) => Kind::DateTime,
            Value::NaiveDateTime(_) => Kind::NaiveDateTime,
            Value::Date(_) => Kind::Date,
            Value::Decimal(_) => Kind::Decimal,
            Value::BigFloat(_) => Kind::BigFloat,
            Value::Rational(_) => Kind::Rational,
            Value::Regex(_) => Kind::Regex,
            Value::Mime(_) => Kind::Mime,
            Value::Uuid(_) => Kind::Uuid,
            Value::Address(_) => Kind::Address,
            Value::Network(_) => Kind::Network,
            Value::Shared(_) => Kind::Shared,
            Value::Custom(_) => Kind::Custom,
        }
    }

    /// Wrap a value so it can be referenced more than once in a graph.
    pub fn shared(value: Value) -> Value {
        Value::Shared(Shared::new(value))
    }
}

impl PartialEq for Value {
    /// Structural equality. `Shared` values compare through their contents
    /// (identical handles short-circuit), floats compare bitwise except that
    /// all NaNs are equal, and `Custom` values compare by handle identity.
    ///
    /// Comparing a cyclic graph against anything other than itself does not
    /// terminate; compare cyclic values with [`Shared::ptr_eq`] instead.
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Shared(a), Value::Shared(b)) => a.ptr_eq(b) || *a.borrow() == *b.borrow(),
            (Value::Shared(a), b) => *a.borrow() == *b,
            (a, Value::Shared(b)) => *a == *b.borrow(),
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Float(a), Value::Float(b)) => {
                (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
            }
            (Value::Simple(a), Value::Simple(b)) => a == b,
            (Value::Tag(ta, va), Value::Tag(tb, vb)) => ta == tb && va == vb,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::NaiveDateTime(a), Value::NaiveDateTime(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::BigFloat(a), Value::BigFloat(b)) => a == b,
            (Value::Rational(a), Value::Rational(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a.as_str() == b.as_str(),
            (Value::Mime(a), Value::Mime(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::Address(a), Value::Address(b)) => a == b,
            (Value::Network(a), Value::Network(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A reference-counted, interior-mutable value handle.
///
/// `Shared` is how a graph expresses aliasing: cloning the handle clones the
/// reference, not the value. The encoder keys its sharing table on the
/// handle address, and the decoder produces `Shared` for every item marked
/// with tag 28.
#[derive(Clone)]
pub struct Shared(Rc<RefCell<Value>>);

impl Shared {
    pub fn new(value: Value) -> Self {
        Shared(Rc::new(RefCell::new(value)))
    }

    pub fn borrow(&self) -> Ref<'_, Value> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Value> {
        self.0.borrow_mut()
    }

    /// Replace the contained value, returning the previous one.
    pub fn replace(&self, value: Value) -> Value {
        self.0.replace(value)
    }

    /// Whether two handles refer to the same underlying value.
    pub fn ptr_eq(&self, other: &Shared) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// A stable identity token for the lifetime of the handle.
    pub(crate) fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for Shared {
    // The referent may contain this handle, so print the identity rather
    // than recursing into the value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shared({:p})", Rc::as_ptr(&self.0))
    }
}

impl PartialEq for Shared {
    fn eq(&self, other: &Shared) -> bool {
        self.ptr_eq(other) || *self.borrow() == *other.borrow()
    }
}

/// A finite decimal fraction: `mantissa * 10^exponent` (tag 4).
///
/// Non-finite decimals have no wire form of their own; they are encoded as
/// the float specials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    pub mantissa: BigInt,
    pub exponent: i64,
}

impl Decimal {
    pub fn new(mantissa: impl Into<BigInt>, exponent: i64) -> Self {
        Decimal {
            mantissa: mantissa.into(),
            exponent,
        }
    }
}

/// A binary fraction: `mantissa * 2^exponent` (tag 5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigFloat {
    pub mantissa: BigInt,
    pub exponent: i64,
}

impl BigFloat {
    pub fn new(mantissa: impl Into<BigInt>, exponent: i64) -> Self {
        BigFloat {
            mantissa: mantissa.into(),
            exponent,
        }
    }
}

/// A rational number `numerator / denominator` (tag 30).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rational {
    pub numerator: BigInt,
    pub denominator: BigInt,
}

impl Rational {
    pub fn new(numerator: impl Into<BigInt>, denominator: impl Into<BigInt>) -> Self {
        Rational {
            numerator: numerator.into(),
            denominator: denominator.into(),
        }
    }
}

/// An IP network: a packed address plus a prefix length (tag 261).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpNetwork {
    pub address: IpAddr,
    pub prefix_len: u8,
}

impl IpNetwork {
    pub fn new(address: IpAddr, prefix_len: u8) -> Self {
        IpNetwork {
            address,
            prefix_len,
        }
    }
}

/// An opaque host value carried through the codec.
///
/// The encoder can only emit a `Custom` value through a handler registered
/// for its type (or for a named type a loader resolves to it); there is no
/// decoded counterpart.
pub trait CustomValue: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    /// The name used in error messages when no handler matches.
    fn type_name(&self) -> &'static str;
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Value {
                Value::Integer(BigInt::from(v))
            }
        })*
    };
}

value_from_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Value {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Value {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Value {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Value {
        Value::Array(v)
    }
}

impl From<Vec<(Value, Value)>> for Value {
    fn from(v: Vec<(Value, Value)>) -> Value {
        Value::Map(v)
    }
}

impl From<Shared> for Value {
    fn from(v: Shared) -> Value {
        Value::Shared(v)
    }
}

impl fmt::Display for Value {
    /// Renders the value in CBOR diagnostic notation (RFC 8949 §8).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        diagnostic(f, self, 64)
    }
}

fn diagnostic(f: &mut fmt::Formatter<'_>, value: &Value, depth: usize) -> fmt::Result {
    if depth == 0 {
        return f.write_str("...");
    }
    match value {
        Value::Integer(v) => write!(f, "{v}"),
        Value::Bytes(b) => {
            f.write_str("h'")?;
            for byte in b {
                write!(f, "{byte:02x}")?;
            }
            f.write_str("'")
        }
        Value::Text(s) => write!(f, "{s:?}"),
        Value::Array(items) => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                diagnostic(f, item, depth - 1)?;
            }
            f.write_str("]")
        }
        Value::Map(entries) => {
            f.write_str("{")?;
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                diagnostic(f, k, depth - 1)?;
                f.write_str(": ")?;
                diagnostic(f, v, depth - 1)?;
            }
            f.write_str("}")
        }
        Value::Bool(true) => f.write_str("true"),
        Value::Bool(false) => f.write_str("false"),
        Value::Null => f.write_str("null"),
        Value::Undefined => f.write_str("undefined"),
        Value::Float(v) if v.is_nan() => f.write_str("NaN"),
        Value::Float(v) if *v == f64::INFINITY => f.write_str("Infinity"),
        Value::Float(v) if *v == f64::NEG_INFINITY => f.write_str("-Infinity"),
        Value::Float(v) => {
            if v.fract() == 0.0 && v.abs() < 1e15 {
                write!(f, "{v:.1}")
            } else {
                write!(f, "{v}")
            }
        }
        Value::Simple(v) => write!(f, "simple({v})"),
        Value::Tag(tag, inner) => {
            write!(f, "{tag}(")?;
            diagnostic(f, inner, depth - 1)?;
            f.write_str(")")
        }
        Value::Set(members) => {
            write!(f, "{}([", crate::tags::SET)?;
            for (i, member) in members.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                diagnostic(f, member, depth - 1)?;
            }
            f.write_str("])")
        }
        Value::DateTime(v) => write!(f, "0({v})"),
        Value::NaiveDateTime(v) => write!(f, "0({v})"),
        Value::Date(v) => write!(f, "0({v})"),
        Value::Decimal(v) => write!(f, "4([{}, {}])", v.exponent, v.mantissa),
        Value::BigFloat(v) => write!(f, "5([{}, {}])", v.exponent, v.mantissa),
        Value::Rational(v) => write!(f, "30([{}, {}])", v.numerator, v.denominator),
        Value::Regex(v) => write!(f, "35({:?})", v.as_str()),
        Value::Mime(v) => write!(f, "36({v:?})"),
        Value::Uuid(v) => write!(f, "37(h'{}')", v.simple()),
        Value::Address(v) => write!(f, "260({v})"),
        Value::Network(v) => write!(f, "261({}/{})", v.address, v.prefix_len),
        Value::Shared(v) => {
            f.write_str("shared(")?;
            if depth <= 1 {
                f.write_str("...")?;
            } else {
                diagnostic(f, &v.borrow(), depth - 1)?;
            }
            f.write_str(")")
        }
        Value::Custom(v) => write!(f, "{v:?}"),
    }
}
