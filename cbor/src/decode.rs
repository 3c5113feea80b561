/*!
Decoding of CBOR byte streams into [`Value`] graphs.

The decoder reads items in pre-order from any [`Read`] implementation and
reconstructs one fully-formed value per [`Decoder::decode`] call. Two
context flags thread through the recursion: `immutable`, set while decoding
map keys and set members, and the pending shared slot that tag 28 opens.
Containers claim the slot before populating themselves so that references
back into an enclosing value (tag 29) resolve mid-construction.
*/

use std::io::Read;
use std::str::Utf8Error;

use half::f16;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use thiserror::Error;

use crate::tags;
use crate::value::{IpNetwork, Shared, Value};

/// Input is consumed in bounded chunks so a hostile length cannot force a
/// single huge allocation up front.
const READ_CHUNK: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum Error {
    #[error("premature end of stream (expected to read {wanted} bytes, got {got} instead)")]
    EndOfStream { wanted: usize, got: usize },

    #[error("unknown subtype {subtype:#04x} for major type {major}")]
    InvalidSubtype { major: u8, subtype: u8 },

    #[error("break outside an indefinite-length item")]
    UnexpectedBreak,

    #[error("indefinite-length {0} contains an invalid chunk")]
    InvalidChunk(&'static str),

    /// Invalid UTF-8 under the `strict` policy.
    #[error("invalid UTF-8 in text string: {0}")]
    InvalidUtf8(Utf8Error),

    /// Invalid UTF-8 under the `error` policy, surfaced without wrapping.
    #[error(transparent)]
    Utf8(Utf8Error),

    #[error("invalid simple value {0}")]
    InvalidSimpleValue(u8),

    #[error("invalid datetime string {0:?}")]
    InvalidDateTime(String),

    #[error("invalid timestamp value {0}")]
    InvalidTimestamp(String),

    #[error("tag {tag} requires {expected}")]
    InvalidTaggedValue { tag: u64, expected: &'static str },

    #[error("shared reference {0} not found")]
    SharedRefNotFound(u64),

    #[error("shared value {0} has not been initialized")]
    UninitializedSharedValue(usize),

    #[error("invalid regular expression: {0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("length {0} exceeds the addressable range")]
    LengthOverflow(u64),

    #[error("maximum recursion depth reached")]
    MaxRecursion,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// What to do with invalid UTF-8 in text strings: fail with stream context,
/// fail with the bare conversion error, or substitute U+FFFD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrErrors {
    #[default]
    Strict,
    Error,
    Replace,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub str_errors: StrErrors,
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            str_errors: StrErrors::default(),
            max_depth: 1000,
        }
    }
}

/// Post-processes the wrapper produced for a tag with no built-in rule.
/// Receives the tag number and the `Value::Tag` wrapper.
pub type TagHook = std::rc::Rc<dyn Fn(u64, Value) -> Result<Value, Error>>;

/// Rewrites every decoded map.
pub type ObjectHook = std::rc::Rc<dyn Fn(Vec<(Value, Value)>) -> Result<Value, Error>>;

pub struct Decoder<R> {
    reader: R,
    options: Options,
    tag_hook: Option<TagHook>,
    object_hook: Option<ObjectHook>,
    shareables: Vec<Option<Shared>>,
    immutable: bool,
    shared_slot: Option<usize>,
    depth: usize,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, Options::default())
    }

    pub fn with_options(reader: R, options: Options) -> Self {
        let depth = options.max_depth;
        Decoder {
            reader,
            options,
            tag_hook: None,
            object_hook: None,
            shareables: Vec::new(),
            immutable: false,
            shared_slot: None,
            depth,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_tag_hook(&mut self, hook: TagHook) {
        self.tag_hook = Some(hook);
    }

    pub fn set_object_hook(&mut self, hook: ObjectHook) {
        self.object_hook = Some(hook);
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Decode the next top-level item from the stream.
    ///
    /// The shareables list and recursion budget are reset, so shared
    /// references are scoped to a single item.
    pub fn decode(&mut self) -> Result<Value, Error> {
        self.shareables.clear();
        self.immutable = false;
        self.shared_slot = None;
        self.depth = self.options.max_depth;
        self.decode_item()
    }

    /// Decode one nested item.
    pub fn decode_item(&mut self) -> Result<Value, Error> {
        let initial = self.read_byte()?;
        self.decode_initial(initial)
    }

    /// Decode one nested item without inheriting a pending shared slot.
    pub fn decode_unshared(&mut self) -> Result<Value, Error> {
        let slot = self.shared_slot.take();
        let result = self.decode_item();
        self.shared_slot = slot;
        result
    }

    /// Decode one nested item in immutable context (as for map keys and
    /// set members).
    pub fn decode_immutable(&mut self) -> Result<Value, Error> {
        let prev = std::mem::replace(&mut self.immutable, true);
        let result = self.decode_item();
        self.immutable = prev;
        result
    }

    pub fn decode_immutable_unshared(&mut self) -> Result<Value, Error> {
        let slot = self.shared_slot.take();
        let result = self.decode_immutable();
        self.shared_slot = slot;
        result
    }

    fn decode_initial(&mut self, initial: u8) -> Result<Value, Error> {
        if self.depth == 0 {
            return Err(Error::MaxRecursion);
        }
        self.depth -= 1;
        let result = self.dispatch(initial >> 5, initial & 0x1f);
        self.depth += 1;
        result
    }

    fn dispatch(&mut self, major: u8, subtype: u8) -> Result<Value, Error> {
        match major {
            0 => {
                let arg = self.read_definite_arg(0, subtype)?;
                Ok(Value::Integer(BigInt::from(arg)))
            }
            1 => {
                let arg = self.read_definite_arg(1, subtype)?;
                Ok(Value::Integer(-BigInt::from(arg) - 1))
            }
            2 => self.decode_bytes(subtype),
            3 => self.decode_text(subtype),
            4 => self.decode_array(subtype),
            5 => self.decode_map(subtype),
            6 => self.decode_tagged(subtype),
            _ => self.decode_special(subtype),
        }
    }

    // Stream plumbing.

    fn fill(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(filled)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let filled = self.fill(buf)?;
        if filled < buf.len() {
            return Err(Error::EndOfStream {
                wanted: buf.len(),
                got: filled,
            });
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, Error> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_vec(&mut self, len: u64) -> Result<Vec<u8>, Error> {
        let len = usize::try_from(len).map_err(|_| Error::LengthOverflow(len))?;
        let mut data = Vec::with_capacity(len.min(READ_CHUNK));
        while data.len() < len {
            let start = data.len();
            let take = (len - start).min(READ_CHUNK);
            data.resize(start + take, 0);
            let filled = self.fill(&mut data[start..])?;
            if filled < take {
                return Err(Error::EndOfStream {
                    wanted: len,
                    got: start + filled,
                });
            }
        }
        Ok(data)
    }

    /// Read the argument that follows an initial byte. `None` means the
    /// indefinite form, which is only legal for the string and container
    /// majors.
    fn read_arg(&mut self, major: u8, subtype: u8) -> Result<Option<u64>, Error> {
        match subtype {
            n @ 0..=23 => Ok(Some(n as u64)),
            24 => Ok(Some(self.read_byte()? as u64)),
            25 => {
                let mut buf = [0u8; 2];
                self.read_exact(&mut buf)?;
                Ok(Some(u16::from_be_bytes(buf) as u64))
            }
            26 => {
                let mut buf = [0u8; 4];
                self.read_exact(&mut buf)?;
                Ok(Some(u32::from_be_bytes(buf) as u64))
            }
            27 => {
                let mut buf = [0u8; 8];
                self.read_exact(&mut buf)?;
                Ok(Some(u64::from_be_bytes(buf)))
            }
            31 if (2..=5).contains(&major) => Ok(None),
            _ => Err(Error::InvalidSubtype { major, subtype }),
        }
    }

    fn read_definite_arg(&mut self, major: u8, subtype: u8) -> Result<u64, Error> {
        match self.read_arg(major, subtype)? {
            Some(arg) => Ok(arg),
            None => Err(Error::InvalidSubtype { major, subtype: 31 }),
        }
    }

    // Major types 2 and 3.

    fn decode_bytes(&mut self, subtype: u8) -> Result<Value, Error> {
        let slot = self.shared_slot.take();
        let data = match self.read_arg(2, subtype)? {
            Some(len) => self.read_vec(len)?,
            None => self.read_chunks(2, "byte string")?,
        };
        Ok(self.finish_shared(slot, Value::Bytes(data)))
    }

    fn decode_text(&mut self, subtype: u8) -> Result<Value, Error> {
        let slot = self.shared_slot.take();
        let text = match self.read_arg(3, subtype)? {
            Some(len) => {
                let raw = self.read_vec(len)?;
                self.convert_text(raw)?
            }
            None => {
                // Each chunk converts on its own, so a UTF-8 sequence may
                // never straddle a chunk boundary.
                let mut text = String::new();
                loop {
                    let initial = self.read_byte()?;
                    if initial == 0xff {
                        break;
                    }
                    if initial >> 5 != 3 {
                        return Err(Error::InvalidChunk("text string"));
                    }
                    let raw = self.read_chunk_payload(3, initial & 0x1f, "text string")?;
                    text.push_str(&self.convert_text(raw)?);
                }
                text
            }
        };
        Ok(self.finish_shared(slot, Value::Text(text)))
    }

    fn read_chunks(&mut self, major: u8, what: &'static str) -> Result<Vec<u8>, Error> {
        let mut data = Vec::new();
        loop {
            let initial = self.read_byte()?;
            if initial == 0xff {
                return Ok(data);
            }
            if initial >> 5 != major {
                return Err(Error::InvalidChunk(what));
            }
            let chunk = self.read_chunk_payload(major, initial & 0x1f, what)?;
            data.extend_from_slice(&chunk);
        }
    }

    fn read_chunk_payload(
        &mut self,
        major: u8,
        subtype: u8,
        what: &'static str,
    ) -> Result<Vec<u8>, Error> {
        match self.read_arg(major, subtype)? {
            Some(len) => self.read_vec(len),
            // Chunks must themselves be definite.
            None => Err(Error::InvalidChunk(what)),
        }
    }

    fn convert_text(&self, raw: Vec<u8>) -> Result<String, Error> {
        match self.options.str_errors {
            StrErrors::Strict => {
                String::from_utf8(raw).map_err(|e| Error::InvalidUtf8(e.utf8_error()))
            }
            StrErrors::Error => String::from_utf8(raw).map_err(|e| Error::Utf8(e.utf8_error())),
            StrErrors::Replace => Ok(String::from_utf8_lossy(&raw).into_owned()),
        }
    }

    // Major types 4 and 5.

    fn decode_array(&mut self, subtype: u8) -> Result<Value, Error> {
        let slot = self.shared_slot.take();
        let arg = self.read_arg(4, subtype)?;

        if let (Some(index), false) = (slot, self.immutable) {
            // Install the array before filling it so tag-29 references to
            // it resolve while its own body decodes.
            let shared = Shared::new(Value::Array(Vec::new()));
            self.shareables[index] = Some(shared.clone());
            match arg {
                Some(len) => {
                    for _ in 0..len {
                        let item = self.decode_item()?;
                        if let Value::Array(items) = &mut *shared.borrow_mut() {
                            items.push(item);
                        }
                    }
                }
                None => loop {
                    let initial = self.read_byte()?;
                    if initial == 0xff {
                        break;
                    }
                    let item = self.decode_initial(initial)?;
                    if let Value::Array(items) = &mut *shared.borrow_mut() {
                        items.push(item);
                    }
                },
            }
            return Ok(Value::Shared(shared));
        }

        let items = match arg {
            Some(len) => {
                let mut items =
                    Vec::with_capacity(usize::try_from(len).unwrap_or(0).min(READ_CHUNK));
                for _ in 0..len {
                    items.push(self.decode_item()?);
                }
                items
            }
            None => {
                let mut items = Vec::new();
                loop {
                    let initial = self.read_byte()?;
                    if initial == 0xff {
                        break;
                    }
                    items.push(self.decode_initial(initial)?);
                }
                items
            }
        };
        Ok(self.finish_shared(slot, Value::Array(items)))
    }

    fn decode_map(&mut self, subtype: u8) -> Result<Value, Error> {
        let slot = self.shared_slot.take();
        let arg = self.read_arg(5, subtype)?;

        if let (Some(index), false) = (slot, self.immutable) {
            let shared = Shared::new(Value::Map(Vec::new()));
            self.shareables[index] = Some(shared.clone());
            match arg {
                Some(len) => {
                    for _ in 0..len {
                        let key = self.decode_immutable_unshared()?;
                        let value = self.decode_item()?;
                        if let Value::Map(entries) = &mut *shared.borrow_mut() {
                            entries.push((key, value));
                        }
                    }
                }
                None => loop {
                    let initial = self.read_byte()?;
                    if initial == 0xff {
                        break;
                    }
                    let key = self.decode_key_initial(initial)?;
                    let value = self.decode_item()?;
                    if let Value::Map(entries) = &mut *shared.borrow_mut() {
                        entries.push((key, value));
                    }
                },
            }
            if let Some(hook) = self.object_hook.clone() {
                // Rewrite in place through the handle so references taken
                // during construction observe the hook's result.
                let Value::Map(entries) = shared.replace(Value::Null) else {
                    unreachable!()
                };
                shared.replace(hook(entries)?);
            }
            return Ok(Value::Shared(shared));
        }

        let mut entries = Vec::new();
        match arg {
            Some(len) => {
                for _ in 0..len {
                    let key = self.decode_immutable_unshared()?;
                    let value = self.decode_item()?;
                    entries.push((key, value));
                }
            }
            None => loop {
                let initial = self.read_byte()?;
                if initial == 0xff {
                    break;
                }
                let key = self.decode_key_initial(initial)?;
                let value = self.decode_item()?;
                entries.push((key, value));
            },
        }

        let value = match self.object_hook.clone() {
            Some(hook) => hook(entries)?,
            None => Value::Map(entries),
        };
        Ok(self.finish_shared(slot, value))
    }

    /// Decode a map key whose initial byte has already been consumed by the
    /// indefinite-length loop.
    fn decode_key_initial(&mut self, initial: u8) -> Result<Value, Error> {
        let prev = std::mem::replace(&mut self.immutable, true);
        let result = self.decode_initial(initial);
        self.immutable = prev;
        result
    }

    // Major type 6.

    fn decode_tagged(&mut self, subtype: u8) -> Result<Value, Error> {
        let tag = self.read_definite_arg(6, subtype)?;
        match tag {
            tags::SHAREABLE => self.decode_shareable(),
            tags::SHARED_REF => self.decode_shared_ref(),
            _ => {
                let slot = self.shared_slot.take();
                let value = self.decode_tag_body(tag)?;
                Ok(self.finish_shared(slot, value))
            }
        }
    }

    fn decode_shareable(&mut self) -> Result<Value, Error> {
        let index = self.shareables.len();
        self.shareables.push(None);
        let prev = std::mem::replace(&mut self.shared_slot, Some(index));
        let result = self.decode_item();
        self.shared_slot = prev;
        let value = result?;
        if self.shareables[index].is_none() {
            // The inner decoder did not claim the slot (strings, scalars,
            // immutable containers): fill it now that the value is whole.
            let shared = Shared::new(value);
            self.shareables[index] = Some(shared.clone());
            Ok(Value::Shared(shared))
        } else {
            Ok(value)
        }
    }

    fn decode_shared_ref(&mut self) -> Result<Value, Error> {
        let inner = self.decode_unshared()?;
        let index = match &inner {
            Value::Integer(v) => v.to_u64(),
            _ => None,
        }
        .ok_or(Error::InvalidTaggedValue {
            tag: tags::SHARED_REF,
            expected: "an unsigned integer",
        })?;
        let slot = usize::try_from(index).map_err(|_| Error::SharedRefNotFound(index))?;
        match self.shareables.get(slot) {
            Some(Some(shared)) => Ok(Value::Shared(shared.clone())),
            Some(None) => Err(Error::UninitializedSharedValue(slot)),
            None => Err(Error::SharedRefNotFound(index)),
        }
    }

    fn decode_tag_body(&mut self, tag: u64) -> Result<Value, Error> {
        match tag {
            tags::DATETIME_STRING => {
                let Value::Text(text) = self.decode_item()? else {
                    return Err(Error::InvalidTaggedValue {
                        tag,
                        expected: "a text string",
                    });
                };
                match tags::parse_rfc3339(&text) {
                    Some(datetime) => Ok(Value::DateTime(datetime)),
                    None => Err(Error::InvalidDateTime(text)),
                }
            }
            tags::EPOCH_DATETIME => {
                let inner = self.decode_item()?;
                let datetime = match &inner {
                    Value::Integer(seconds) => tags::datetime_from_epoch_seconds(seconds),
                    Value::Float(seconds) => tags::datetime_from_epoch_float(*seconds),
                    _ => None,
                };
                datetime
                    .map(Value::DateTime)
                    .ok_or_else(|| Error::InvalidTimestamp(inner.to_string()))
            }
            tags::POSITIVE_BIGNUM | tags::NEGATIVE_BIGNUM => {
                let Value::Bytes(bytes) = self.decode_item()? else {
                    return Err(Error::InvalidTaggedValue {
                        tag,
                        expected: "a byte string",
                    });
                };
                Ok(Value::Integer(tags::bignum_from_bytes(tag, &bytes)))
            }
            tags::DECIMAL_FRACTION => {
                let (exponent, mantissa) = self.decode_fraction_parts(tag)?;
                Ok(Value::Decimal(crate::value::Decimal {
                    mantissa,
                    exponent,
                }))
            }
            tags::BIGFLOAT => {
                let (exponent, mantissa) = self.decode_fraction_parts(tag)?;
                Ok(Value::BigFloat(crate::value::BigFloat {
                    mantissa,
                    exponent,
                }))
            }
            tags::RATIONAL => {
                let expected = "a [numerator, denominator] array";
                let Value::Array(items) = self.decode_item()? else {
                    return Err(Error::InvalidTaggedValue { tag, expected });
                };
                let invalid = || Error::InvalidTaggedValue { tag, expected };
                let [numerator, denominator]: [Value; 2] =
                    items.try_into().map_err(|_| invalid())?;
                let (Value::Integer(numerator), Value::Integer(denominator)) =
                    (numerator, denominator)
                else {
                    return Err(invalid());
                };
                if denominator == BigInt::from(0) {
                    return Err(Error::InvalidTaggedValue {
                        tag,
                        expected: "a nonzero denominator",
                    });
                }
                Ok(Value::Rational(crate::value::Rational {
                    numerator,
                    denominator,
                }))
            }
            tags::REGEX => {
                let Value::Text(pattern) = self.decode_item()? else {
                    return Err(Error::InvalidTaggedValue {
                        tag,
                        expected: "a text string",
                    });
                };
                Ok(Value::Regex(regex::Regex::new(&pattern)?))
            }
            tags::MIME_MESSAGE => {
                let Value::Text(text) = self.decode_item()? else {
                    return Err(Error::InvalidTaggedValue {
                        tag,
                        expected: "a text string",
                    });
                };
                Ok(Value::Mime(text))
            }
            tags::UUID => {
                let Value::Bytes(bytes) = self.decode_item()? else {
                    return Err(Error::InvalidTaggedValue {
                        tag,
                        expected: "a byte string",
                    });
                };
                let bytes: [u8; 16] =
                    bytes
                        .try_into()
                        .map_err(|_| Error::InvalidTaggedValue {
                            tag,
                            expected: "a 16-byte string",
                        })?;
                Ok(Value::Uuid(uuid::Uuid::from_bytes(bytes)))
            }
            tags::SET => {
                let invalid = || Error::InvalidTaggedValue {
                    tag,
                    expected: "an array",
                };
                // The member array may itself have been marked shareable,
                // in which case the set takes over its members.
                let members = match self.decode_immutable()? {
                    Value::Array(members) => members,
                    Value::Shared(shared) => {
                        let inner = shared.borrow();
                        match &*inner {
                            Value::Array(members) => members.clone(),
                            _ => return Err(invalid()),
                        }
                    }
                    _ => return Err(invalid()),
                };
                Ok(Value::Set(members))
            }
            tags::IP_ADDRESS => {
                let Value::Bytes(bytes) = self.decode_item()? else {
                    return Err(Error::InvalidTaggedValue {
                        tag,
                        expected: "a byte string",
                    });
                };
                match bytes.len() {
                    4 => {
                        let octets: [u8; 4] = bytes.try_into().unwrap();
                        Ok(Value::Address(std::net::IpAddr::from(octets)))
                    }
                    16 => {
                        let octets: [u8; 16] = bytes.try_into().unwrap();
                        Ok(Value::Address(std::net::IpAddr::from(octets)))
                    }
                    // A 6-byte value is a MAC address; pass it through as
                    // an unhandled tag.
                    6 => Ok(Value::Tag(tag, Box::new(Value::Bytes(bytes)))),
                    _ => Err(Error::InvalidTaggedValue {
                        tag,
                        expected: "a 4- or 16-byte address",
                    }),
                }
            }
            tags::IP_NETWORK => {
                let expected = "a single {address: prefix-length} entry";
                let Value::Map(entries) = self.decode_item()? else {
                    return Err(Error::InvalidTaggedValue { tag, expected });
                };
                let invalid = || Error::InvalidTaggedValue { tag, expected };
                let [(address, prefix)]: [(Value, Value); 1] =
                    entries.try_into().map_err(|_| invalid())?;
                let (Value::Bytes(bytes), Value::Integer(prefix)) = (address, prefix) else {
                    return Err(invalid());
                };
                let prefix_len = prefix.to_u8().ok_or_else(invalid)?;
                let address = match bytes.len() {
                    4 => {
                        let octets: [u8; 4] = bytes.try_into().unwrap();
                        std::net::IpAddr::from(octets)
                    }
                    16 => {
                        let octets: [u8; 16] = bytes.try_into().unwrap();
                        std::net::IpAddr::from(octets)
                    }
                    _ => return Err(invalid()),
                };
                Ok(Value::Network(IpNetwork {
                    address,
                    prefix_len,
                }))
            }
            _ => {
                let inner = self.decode_item()?;
                let wrapped = Value::Tag(tag, Box::new(inner));
                match self.tag_hook.clone() {
                    Some(hook) => hook(tag, wrapped),
                    None => Ok(wrapped),
                }
            }
        }
    }

    fn decode_fraction_parts(&mut self, tag: u64) -> Result<(i64, BigInt), Error> {
        let expected = "an [exponent, mantissa] array";
        let Value::Array(items) = self.decode_item()? else {
            return Err(Error::InvalidTaggedValue { tag, expected });
        };
        let invalid = || Error::InvalidTaggedValue { tag, expected };
        let [exponent, mantissa]: [Value; 2] = items.try_into().map_err(|_| invalid())?;
        let (Value::Integer(exponent), Value::Integer(mantissa)) = (exponent, mantissa) else {
            return Err(invalid());
        };
        let exponent = exponent.to_i64().ok_or_else(invalid)?;
        Ok((exponent, mantissa))
    }

    // Major type 7.

    fn decode_special(&mut self, subtype: u8) -> Result<Value, Error> {
        match subtype {
            n @ 0..=19 => Ok(Value::Simple(n)),
            20 => Ok(Value::Bool(false)),
            21 => Ok(Value::Bool(true)),
            22 => Ok(Value::Null),
            23 => Ok(Value::Undefined),
            24 => {
                let value = self.read_byte()?;
                if value < 32 {
                    // The two-byte form may not shadow the one-byte range.
                    Err(Error::InvalidSimpleValue(value))
                } else {
                    Ok(Value::Simple(value))
                }
            }
            25 => {
                let mut buf = [0u8; 2];
                self.read_exact(&mut buf)?;
                Ok(Value::Float(f64::from(f16::from_be_bytes(buf))))
            }
            26 => {
                let mut buf = [0u8; 4];
                self.read_exact(&mut buf)?;
                Ok(Value::Float(f64::from(f32::from_be_bytes(buf))))
            }
            27 => {
                let mut buf = [0u8; 8];
                self.read_exact(&mut buf)?;
                Ok(Value::Float(f64::from_be_bytes(buf)))
            }
            31 => Err(Error::UnexpectedBreak),
            _ => Err(Error::InvalidSubtype { major: 7, subtype }),
        }
    }

    fn finish_shared(&mut self, slot: Option<usize>, value: Value) -> Value {
        match slot {
            Some(index) => {
                let shared = Shared::new(value);
                self.shareables[index] = Some(shared.clone());
                Value::Shared(shared)
            }
            None => value,
        }
    }
}

/// Decode a single item from a byte slice with default options.
pub fn from_slice(data: &[u8]) -> Result<Value, Error> {
    Decoder::new(data).decode()
}

pub fn from_slice_with(data: &[u8], options: Options) -> Result<Value, Error> {
    Decoder::with_options(data, options).decode()
}

/// Decode a single item from a reader with default options.
pub fn from_reader<R: Read>(reader: R) -> Result<Value, Error> {
    Decoder::new(reader).decode()
}

pub fn from_reader_with<R: Read>(reader: R, options: Options) -> Result<Value, Error> {
    Decoder::with_options(reader, options).decode()
}
