/*!
Well-known semantic tag numbers and their pure conversion rules.

The stateful halves of tag handling (recursing into inner items, the
shareables protocol) live with the [`encode`](crate::encode) and
[`decode`](crate::decode) modules; this module holds the tag numbers and
the conversions that need no codec state.
*/

use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Text datetime in RFC 3339 form.
pub const DATETIME_STRING: u64 = 0;
/// Numeric epoch timestamp, integer or float, UTC.
pub const EPOCH_DATETIME: u64 = 1;
/// Unsigned bignum over a big-endian byte string.
pub const POSITIVE_BIGNUM: u64 = 2;
/// Negative bignum: `-1 - n` over a big-endian byte string.
pub const NEGATIVE_BIGNUM: u64 = 3;
/// Decimal fraction `[exponent, mantissa]`, base 10.
pub const DECIMAL_FRACTION: u64 = 4;
/// Bigfloat `[exponent, mantissa]`, base 2.
pub const BIGFLOAT: u64 = 5;
/// Mark the next item as shareable.
pub const SHAREABLE: u64 = 28;
/// Reference to a previously marked shareable, by index.
pub const SHARED_REF: u64 = 29;
/// Rational number `[numerator, denominator]`.
pub const RATIONAL: u64 = 30;
/// Regular expression pattern text.
pub const REGEX: u64 = 35;
/// MIME message text.
pub const MIME_MESSAGE: u64 = 36;
/// UUID in its 16-byte form.
pub const UUID: u64 = 37;
/// Set of unique items over an array.
pub const SET: u64 = 258;
/// IP address over its packed bytes.
pub const IP_ADDRESS: u64 = 260;
/// IP network over a `{packed-address: prefix-length}` map.
pub const IP_NETWORK: u64 = 261;

/// Reconstruct a bignum from its big-endian magnitude, applying the tag's
/// sign rule.
pub(crate) fn bignum_from_bytes(tag: u64, bytes: &[u8]) -> BigInt {
    let n = BigInt::from_bytes_be(Sign::Plus, bytes);
    if tag == NEGATIVE_BIGNUM {
        -n - 1
    } else {
        n
    }
}

/// The minimal big-endian magnitude bytes for a bignum, with its tag.
/// The value must be outside the range of major types 0 and 1.
pub(crate) fn bignum_to_bytes(value: &BigInt) -> (u64, Vec<u8>) {
    if value.sign() == Sign::Minus {
        let magnitude: BigInt = -value - 1;
        (NEGATIVE_BIGNUM, magnitude.to_bytes_be().1)
    } else {
        (POSITIVE_BIGNUM, value.to_bytes_be().1)
    }
}

/// Render a datetime as RFC 3339 text with the `+00:00` suffix contracted
/// to `Z`.
pub(crate) fn format_rfc3339(value: OffsetDateTime) -> Result<String, time::error::Format> {
    let mut text = value.format(&Rfc3339)?;
    if let Some(base) = text.strip_suffix("+00:00") {
        let len = base.len();
        text.truncate(len);
        text.push('Z');
    }
    Ok(text)
}

pub(crate) fn parse_rfc3339(text: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(text, &Rfc3339).ok()
}

/// An epoch timestamp split the way tag 1 encodes it: integral seconds as
/// an integer, anything finer as a float.
pub(crate) enum Epoch {
    Seconds(i64),
    Fractional(f64),
}

pub(crate) fn to_epoch(value: OffsetDateTime) -> Epoch {
    let nanos = value.unix_timestamp_nanos();
    if nanos % 1_000_000_000 == 0 {
        Epoch::Seconds((nanos / 1_000_000_000) as i64)
    } else if nanos % 1_000 == 0 {
        // Microsecond-precision values divide exactly, which keeps the
        // float identical to one computed from whole microseconds.
        Epoch::Fractional((nanos / 1_000) as f64 / 1e6)
    } else {
        Epoch::Fractional(nanos as f64 / 1e9)
    }
}

pub(crate) fn datetime_from_epoch_seconds(seconds: &BigInt) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(seconds.to_i64()?).ok()
}

pub(crate) fn datetime_from_epoch_float(seconds: f64) -> Option<OffsetDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    // The float-to-int cast saturates; out-of-range instants are rejected
    // by the range check in `from_unix_timestamp_nanos`.
    let nanos = (seconds * 1e9).round() as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
}
