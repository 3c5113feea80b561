/*!
A bidirectional CBOR (RFC 8949) codec over a polymorphic value graph.

The crate converts between [`Value`] graphs and CBOR byte streams:

- [`encode`]: pre-order emission with pluggable handlers for opaque host
  types, value sharing (tags 28/29) for aliased and cyclic graphs, and a
  canonical mode with byte-sorted map keys and minimal-width floats.
- [`decode`]: major-type dispatch over any [`std::io::Read`], rebuilding
  shared structure through a shareables table, with hooks for unknown tags
  and for every decoded map.
- [`tags`]: the well-known semantic tags (datetimes, bignums, decimal
  fractions, rationals, regular expressions, MIME, UUIDs, sets, IP
  addresses and networks).

```rust
use skein_cbor::{decode, encode, Value};

let value = Value::Array(vec![Value::from(1), Value::from("two")]);
let bytes = encode::to_vec(&value)?;
assert_eq!(decode::from_slice(&bytes)?, value);
# Ok::<_, Box<dyn std::error::Error>>(())
```
*/

// Lengths move between `usize` and the wire's 64-bit arguments without
// loss only on these targets.
#[cfg(not(any(
    target_pointer_width = "16",
    target_pointer_width = "32",
    target_pointer_width = "64"
)))]
compile_error!("only targets with at most 64 bit pointer width are supported");

pub mod decode;
pub mod encode;
pub mod registry;
pub mod tags;
pub mod value;

pub use decode::{from_reader, from_slice, Decoder};
pub use encode::{to_vec, to_writer, Encoder};
pub use value::{Shared, Value};

#[cfg(test)]
mod decode_tests;


#[cfg(test)]
mod roundtrip_tests;
