/*!
Encoding of [`Value`] graphs into CBOR byte streams.

The encoder walks the graph in pre-order, accumulating output in an
internal buffer that is handed to the writer once the top-level item has
encoded completely, so a failed encode writes nothing. Canonical mode
additionally sorts map keys and set members by their encoded bytes and
emits every float in its narrowest lossless width.
*/

use std::collections::HashMap;
use std::io::Write;

use half::f16;
use num_bigint::{BigInt, Sign};
use num_traits::{FromPrimitive, ToPrimitive};
use thiserror::Error;
use time::{OffsetDateTime, Time, UtcOffset};

use crate::registry::{Registry, TypeLoader, UnresolvedType};
use crate::tags;
use crate::value::{Shared, Value};

#[derive(Error, Debug)]
pub enum Error {
    /// A custom value had no registered handler and no default handler is
    /// configured.
    #[error("no encoder registered for values of type {0}")]
    UnencodableType(String),

    #[error("cyclic data structure detected but value sharing is disabled")]
    CyclicStructure,

    #[error("naive datetime encountered and no default timezone has been set")]
    NaiveDatetime,

    /// Simple values 24 through 31 are reserved by the wire format.
    #[error("simple value {0} is reserved")]
    ReservedSimpleValue(u8),

    #[error("cannot resolve deferred encoder type {module}::{name}")]
    UnresolvedType { module: String, name: String },

    #[error("maximum recursion depth reached")]
    MaxRecursion,

    #[error("cannot render datetime: {0}")]
    DatetimeFormat(#[from] time::error::Format),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<UnresolvedType> for Error {
    fn from(e: UnresolvedType) -> Error {
        Error::UnresolvedType {
            module: e.module,
            name: e.name,
        }
    }
}

/// Selects between the plain pre-order encoding, the deterministic
/// canonical form, and a style where registered handlers override the
/// built-in emission rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingStyle {
    #[default]
    Regular,
    /// Sorted map keys and set members, minimal-width floats.
    Canonical,
    /// Consult the handler registry (keyed by value kind) before the
    /// built-in rules.
    Custom,
}

/// How datetimes are written: tag 0 RFC 3339 text, or tag 1 numeric epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    #[default]
    Iso8601,
    Epoch,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub style: EncodingStyle,
    pub timestamp_format: TimestampFormat,
    /// Attached to naive datetimes and dates before encoding.
    pub timezone: Option<UtcOffset>,
    /// Enables tags 28/29 for [`Shared`] values. When disabled, re-entering
    /// a shared value fails with [`Error::CyclicStructure`].
    pub value_sharing: bool,
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            style: EncodingStyle::default(),
            timestamp_format: TimestampFormat::default(),
            timezone: None,
            value_sharing: false,
            max_depth: 1000,
        }
    }
}

impl Options {
    pub fn canonical() -> Self {
        Options {
            style: EncodingStyle::Canonical,
            ..Default::default()
        }
    }
}

/// A registered or default encode handler.
pub type EncodeHandler<W> = std::rc::Rc<dyn Fn(&mut Encoder<W>, &Value) -> Result<(), Error>>;

pub struct Encoder<W> {
    writer: W,
    data: Vec<u8>,
    options: Options,
    encoders: Registry<EncodeHandler<W>>,
    loader: Option<TypeLoader>,
    default_handler: Option<EncodeHandler<W>>,
    shared: HashMap<usize, (Shared, Option<usize>)>,
    depth: usize,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, Options::default())
    }

    pub fn with_options(writer: W, options: Options) -> Self {
        let depth = options.max_depth;
        Encoder {
            writer,
            data: Vec::new(),
            options,
            encoders: Registry::new(),
            loader: None,
            default_handler: None,
            shared: HashMap::new(),
            depth,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// The handler registry consulted for custom values (and, in the custom
    /// style, for built-in kinds).
    pub fn encoders(&mut self) -> &mut Registry<EncodeHandler<W>> {
        &mut self.encoders
    }

    /// Invoked when no registered handler matches a custom value.
    pub fn set_default_handler(&mut self, handler: EncodeHandler<W>) {
        self.default_handler = Some(handler);
    }

    /// Resolves deferred `(module, name)` registry entries on first use.
    pub fn set_type_loader(&mut self, loader: TypeLoader) {
        self.loader = Some(loader);
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Encode one top-level item and hand the bytes to the writer.
    ///
    /// The sharing table and recursion budget are reset, so shared indices
    /// are scoped to a single call.
    pub fn encode(&mut self, value: &Value) -> Result<(), Error> {
        self.data.clear();
        self.depth = self.options.max_depth;
        let result = self.encode_item(value);
        self.shared.clear();
        result?;
        self.writer.write_all(&self.data)?;
        Ok(())
    }

    /// Encode a nested item into the current output. This is the entry
    /// point for handlers that need to emit sub-values.
    pub fn encode_item(&mut self, value: &Value) -> Result<(), Error> {
        if self.depth == 0 {
            return Err(Error::MaxRecursion);
        }
        self.depth -= 1;
        let result = self.dispatch(value);
        self.depth += 1;
        result
    }

    /// Emit an initial byte and argument in the shortest form.
    pub fn write_head(&mut self, major: u8, value: u64) {
        if value < 24 {
            self.data.push((major << 5) | value as u8);
        } else if value <= u8::MAX as u64 {
            self.data.push((major << 5) | 24);
            self.data.push(value as u8);
        } else if value <= u16::MAX as u64 {
            self.data.push((major << 5) | 25);
            self.data.extend_from_slice(&(value as u16).to_be_bytes());
        } else if value <= u32::MAX as u64 {
            self.data.push((major << 5) | 26);
            self.data.extend_from_slice(&(value as u32).to_be_bytes());
        } else {
            self.data.push((major << 5) | 27);
            self.data.extend_from_slice(&value.to_be_bytes());
        }
    }

    /// Emit raw payload bytes, e.g. after a byte- or text-string head.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    fn write_signed(&mut self, value: i64) {
        if value >= 0 {
            self.write_head(0, value as u64);
        } else {
            self.write_head(1, (-(value + 1)) as u64);
        }
    }

    fn dispatch(&mut self, value: &Value) -> Result<(), Error> {
        let canonical = self.options.style == EncodingStyle::Canonical;

        if self.options.style == EncodingStyle::Custom {
            if let Some(handler) = self.encoders.for_kind(value.kind()).cloned() {
                return handler(self, value);
            }
        }

        match value {
            Value::Integer(v) => {
                self.encode_integer(v);
                Ok(())
            }
            Value::Bytes(v) => {
                self.write_head(2, v.len() as u64);
                self.write_bytes(v);
                Ok(())
            }
            Value::Text(v) => {
                self.encode_text(v);
                Ok(())
            }
            Value::Array(items) => {
                self.write_head(4, items.len() as u64);
                for item in items {
                    self.encode_item(item)?;
                }
                Ok(())
            }
            Value::Map(entries) if canonical => self.encode_canonical_map(entries),
            Value::Map(entries) => {
                self.write_head(5, entries.len() as u64);
                for (key, value) in entries {
                    self.encode_item(key)?;
                    self.encode_item(value)?;
                }
                Ok(())
            }
            Value::Bool(v) => {
                self.data.push((7 << 5) | if *v { 21 } else { 20 });
                Ok(())
            }
            Value::Null => {
                self.data.push((7 << 5) | 22);
                Ok(())
            }
            Value::Undefined => {
                self.data.push((7 << 5) | 23);
                Ok(())
            }
            Value::Float(v) if canonical => {
                self.encode_float_minimal(*v);
                Ok(())
            }
            Value::Float(v) => {
                self.encode_float(*v);
                Ok(())
            }
            Value::Simple(v) => self.encode_simple(*v),
            Value::Tag(tag, inner) => {
                self.write_head(6, *tag);
                self.encode_item(inner)
            }
            Value::Set(members) if canonical => self.encode_canonical_set(members),
            Value::Set(members) => {
                self.write_head(6, tags::SET);
                self.write_head(4, members.len() as u64);
                for member in members {
                    self.encode_item(member)?;
                }
                Ok(())
            }
            Value::DateTime(v) => self.encode_datetime(*v),
            Value::NaiveDateTime(v) => {
                let timezone = self.naive_timezone()?;
                self.encode_datetime(v.assume_offset(timezone))
            }
            Value::Date(v) => {
                let timezone = self.naive_timezone()?;
                self.encode_datetime(v.with_time(Time::MIDNIGHT).assume_offset(timezone))
            }
            Value::Decimal(v) => {
                self.write_head(6, tags::DECIMAL_FRACTION);
                self.write_head(4, 2);
                self.write_signed(v.exponent);
                self.encode_integer(&v.mantissa);
                Ok(())
            }
            Value::BigFloat(v) => {
                self.write_head(6, tags::BIGFLOAT);
                self.write_head(4, 2);
                self.write_signed(v.exponent);
                self.encode_integer(&v.mantissa);
                Ok(())
            }
            Value::Rational(v) => {
                self.write_head(6, tags::RATIONAL);
                self.write_head(4, 2);
                self.encode_integer(&v.numerator);
                self.encode_integer(&v.denominator);
                Ok(())
            }
            Value::Regex(v) => {
                self.write_head(6, tags::REGEX);
                self.encode_text(v.as_str());
                Ok(())
            }
            Value::Mime(v) => {
                self.write_head(6, tags::MIME_MESSAGE);
                self.encode_text(v);
                Ok(())
            }
            Value::Uuid(v) => {
                self.write_head(6, tags::UUID);
                self.write_head(2, 16);
                self.write_bytes(v.as_bytes());
                Ok(())
            }
            Value::Address(v) => {
                self.write_head(6, tags::IP_ADDRESS);
                self.encode_packed_address(v);
                Ok(())
            }
            Value::Network(v) => {
                self.write_head(6, tags::IP_NETWORK);
                self.write_head(5, 1);
                self.encode_packed_address(&v.address);
                self.write_head(0, v.prefix_len as u64);
                Ok(())
            }
            Value::Shared(v) => self.encode_shared(v),
            Value::Custom(v) => {
                let handler = self
                    .encoders
                    .find_custom(v.as_ref(), self.loader.as_ref())?;
                match handler {
                    Some(handler) => handler(self, value),
                    None => match self.default_handler.clone() {
                        Some(handler) => handler(self, value),
                        None => Err(Error::UnencodableType(v.type_name().to_string())),
                    },
                }
            }
        }
    }

    fn encode_integer(&mut self, value: &BigInt) {
        if let Some(v) = value.to_u64() {
            self.write_head(0, v);
        } else if value.sign() == Sign::Minus {
            let magnitude: BigInt = -value - 1;
            if let Some(v) = magnitude.to_u64() {
                self.write_head(1, v);
            } else {
                self.encode_bignum(value);
            }
        } else {
            self.encode_bignum(value);
        }
    }

    fn encode_bignum(&mut self, value: &BigInt) {
        let (tag, bytes) = tags::bignum_to_bytes(value);
        self.write_head(6, tag);
        self.write_head(2, bytes.len() as u64);
        self.write_bytes(&bytes);
    }

    fn encode_text(&mut self, value: &str) {
        self.write_head(3, value.len() as u64);
        self.write_bytes(value.as_bytes());
    }

    fn encode_float(&mut self, value: f64) {
        // Non-finite values have exact half-width forms, so they are
        // emitted minimally in every style.
        if value.is_nan() {
            self.write_bytes(&[0xf9, 0x7e, 0x00]);
        } else if value == f64::INFINITY {
            self.write_bytes(&[0xf9, 0x7c, 0x00]);
        } else if value == f64::NEG_INFINITY {
            self.write_bytes(&[0xf9, 0xfc, 0x00]);
        } else {
            self.data.push((7 << 5) | 27);
            self.data.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn encode_float_minimal(&mut self, value: f64) {
        if value.is_nan() {
            self.write_bytes(&[0xf9, 0x7e, 0x00]);
        } else if let Some(v) = lossless_float_coerce::<f16>(value) {
            self.data.push((7 << 5) | 25);
            self.data.extend_from_slice(&v.to_be_bytes());
        } else if let Some(v) = lossless_float_coerce::<f32>(value) {
            self.data.push((7 << 5) | 26);
            self.data.extend_from_slice(&v.to_be_bytes());
        } else {
            self.data.push((7 << 5) | 27);
            self.data.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn encode_simple(&mut self, value: u8) -> Result<(), Error> {
        match value {
            0..=23 => {
                self.data.push(0xe0 | value);
                Ok(())
            }
            24..=31 => Err(Error::ReservedSimpleValue(value)),
            _ => {
                self.data.push(0xf8);
                self.data.push(value);
                Ok(())
            }
        }
    }

    fn naive_timezone(&self) -> Result<UtcOffset, Error> {
        self.options.timezone.ok_or(Error::NaiveDatetime)
    }

    fn encode_datetime(&mut self, value: OffsetDateTime) -> Result<(), Error> {
        match self.options.timestamp_format {
            TimestampFormat::Iso8601 => {
                let text = tags::format_rfc3339(value)?;
                self.write_head(6, tags::DATETIME_STRING);
                self.encode_text(&text);
            }
            TimestampFormat::Epoch => {
                self.write_head(6, tags::EPOCH_DATETIME);
                match tags::to_epoch(value) {
                    tags::Epoch::Seconds(seconds) => self.write_signed(seconds),
                    tags::Epoch::Fractional(seconds) => self.encode_float(seconds),
                }
            }
        }
        Ok(())
    }

    /// Canonical form: keys are sub-encoded, the triples sorted by the
    /// encoded key bytes, and the entries re-emitted in that order. Value
    /// sharing is suspended while sort keys are built so the scratch
    /// encodes cannot allocate shared indices that sorting would reorder.
    fn encode_canonical_map(&mut self, entries: &[(Value, Value)]) -> Result<(), Error> {
        let mut keyed = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let start = self.data.len();
            self.with_sharing_disabled(|e| e.encode_item(key))?;
            keyed.push((self.data.split_off(start), value));
        }
        keyed.sort_by(|a, b| a.0.cmp(&b.0));

        self.write_head(5, entries.len() as u64);
        for (key_bytes, value) in keyed {
            self.write_bytes(&key_bytes);
            self.encode_item(value)?;
        }
        Ok(())
    }

    fn encode_canonical_set(&mut self, members: &[Value]) -> Result<(), Error> {
        let mut encoded = Vec::with_capacity(members.len());
        for member in members {
            let start = self.data.len();
            self.with_sharing_disabled(|e| e.encode_item(member))?;
            encoded.push(self.data.split_off(start));
        }
        encoded.sort();

        self.write_head(6, tags::SET);
        self.write_head(4, members.len() as u64);
        for bytes in encoded {
            self.write_bytes(&bytes);
        }
        Ok(())
    }

    fn with_sharing_disabled<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let prev = std::mem::replace(&mut self.options.value_sharing, false);
        let result = f(self);
        self.options.value_sharing = prev;
        result
    }

    fn encode_packed_address(&mut self, address: &std::net::IpAddr) {
        match address {
            std::net::IpAddr::V4(v4) => {
                self.write_head(2, 4);
                self.write_bytes(&v4.octets());
            }
            std::net::IpAddr::V6(v6) => {
                self.write_head(2, 16);
                self.write_bytes(&v6.octets());
            }
        }
    }

    /// The sharing discipline. Identity is the handle address; an entry
    /// with an index has been emitted under tag 28 and is referenced with
    /// tag 29, while an index-less entry marks a body in progress with
    /// sharing disabled, where re-entry means a cycle.
    fn encode_shared(&mut self, shared: &Shared) -> Result<(), Error> {
        let address = shared.address();
        match self.shared.get(&address) {
            Some((_, Some(index))) => {
                let index = *index;
                self.write_head(6, tags::SHARED_REF);
                self.write_head(0, index as u64);
                Ok(())
            }
            Some((_, None)) => Err(Error::CyclicStructure),
            None if self.options.value_sharing => {
                let index = self.shared.len();
                self.shared.insert(address, (shared.clone(), Some(index)));
                self.write_head(6, tags::SHAREABLE);
                let inner = shared.borrow();
                self.encode_item(&inner)
            }
            None => {
                self.shared.insert(address, (shared.clone(), None));
                let result = {
                    let inner = shared.borrow();
                    self.encode_item(&inner)
                };
                self.shared.remove(&address);
                result
            }
        }
    }
}

fn lossless_float_coerce<T>(value: f64) -> Option<T>
where
    T: FromPrimitive + Into<f64> + Copy,
{
    match T::from_f64(value) {
        Some(f) if <T as Into<f64>>::into(f) == value => Some(f),
        _ => None,
    }
}

/// Encode a single value to a byte vector with default options.
pub fn to_vec(value: &Value) -> Result<Vec<u8>, Error> {
    to_vec_with(value, Options::default())
}

pub fn to_vec_with(value: &Value, options: Options) -> Result<Vec<u8>, Error> {
    let mut encoder = Encoder::with_options(Vec::new(), options);
    encoder.encode(value)?;
    Ok(encoder.into_inner())
}

/// Encode a single value to a writer with default options.
pub fn to_writer<W: Write>(writer: W, value: &Value) -> Result<(), Error> {
    to_writer_with(writer, Options::default(), value)
}

pub fn to_writer_with<W: Write>(writer: W, options: Options, value: &Value) -> Result<(), Error> {
    Encoder::with_options(writer, options).encode(value)
}
