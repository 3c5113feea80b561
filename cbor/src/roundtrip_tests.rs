#![cfg(test)]
use hex_literal::hex;
use num_bigint::BigInt;
use time::macros::datetime;

use super::decode::{self, from_slice};
use super::encode::{self, to_vec, to_vec_with, Options, TimestampFormat};
use super::value::{BigFloat, Decimal, IpNetwork, Rational, Shared, Value};

fn roundtrip(value: Value) {
    let bytes = to_vec(&value).unwrap();
    assert_eq!(from_slice(&bytes).unwrap(), value, "{value}");
}

#[test]
fn scalars() {
    roundtrip(Value::from(0));
    roundtrip(Value::from(23));
    roundtrip(Value::from(24));
    roundtrip(Value::from(u64::MAX));
    roundtrip(Value::from(-1));
    roundtrip(Value::from(-1000));
    let two_to_100: BigInt = BigInt::from(1u8) << 100;
    roundtrip(Value::Integer(two_to_100.clone()));
    roundtrip(Value::Integer(-two_to_100));
    roundtrip(Value::Bool(true));
    roundtrip(Value::Bool(false));
    roundtrip(Value::Null);
    roundtrip(Value::Undefined);
    roundtrip(Value::Simple(0));
    roundtrip(Value::Simple(99));
    roundtrip(Value::Float(0.0));
    roundtrip(Value::Float(-0.0));
    roundtrip(Value::Float(1.1));
    roundtrip(Value::Float(f64::INFINITY));
    roundtrip(Value::Float(f64::NAN));
}

#[test]
fn strings() {
    roundtrip(Value::from(""));
    roundtrip(Value::from("streaming"));
    roundtrip(Value::from("\u{6c34}\u{00fc}"));
    roundtrip(Value::Bytes(vec![]));
    roundtrip(Value::Bytes((0..=255).collect()));
}

#[test]
fn containers() {
    roundtrip(Value::Array(vec![]));
    roundtrip(Value::Array(vec![1.into(), "two".into(), Value::Null]));
    roundtrip(Value::Map(vec![
        ("a".into(), 1.into()),
        (2.into(), Value::Array(vec![3.into()])),
        (Value::Bytes(vec![0xff]), Value::Bool(false)),
    ]));
    roundtrip(Value::Set(vec!["a".into(), "b".into()]));
    roundtrip(Value::Tag(
        6000,
        Box::new(Value::Map(vec![("k".into(), "v".into())])),
    ));
}

#[test]
fn typed_values() {
    roundtrip(Value::DateTime(datetime!(2013-03-21 20:04:00 UTC)));
    roundtrip(Value::DateTime(datetime!(2013-03-21 20:04:00.380841 UTC)));
    roundtrip(Value::DateTime(datetime!(2013-03-21 22:04:00 +2)));
    roundtrip(Value::Decimal(Decimal::new(27315, -2)));
    roundtrip(Value::BigFloat(BigFloat::new(3, -1)));
    roundtrip(Value::Rational(Rational::new(-7, 12)));
    roundtrip(Value::Regex(regex::Regex::new("a+(b|c)?").unwrap()));
    roundtrip(Value::Mime("MIME-Version: 1.0\n\nHi".to_string()));
    roundtrip(Value::Uuid(uuid::Uuid::from_bytes(hex!(
        "5eaffac8b51e480581277fdcc7842faf"
    ))));
    roundtrip(Value::Address("192.10.10.1".parse().unwrap()));
    roundtrip(Value::Address("2001:db8:85a3::8a2e:370:7334".parse().unwrap()));
    roundtrip(Value::Network(IpNetwork::new(
        "192.168.0.0".parse().unwrap(),
        24,
    )));
}

#[test]
fn epoch_datetimes() {
    let options = Options {
        timestamp_format: TimestampFormat::Epoch,
        ..Default::default()
    };
    for value in [
        Value::DateTime(datetime!(2013-03-21 20:04:00 UTC)),
        Value::DateTime(datetime!(2013-03-21 20:04:00.5 UTC)),
        Value::DateTime(datetime!(1969-12-31 23:59:59 UTC)),
    ] {
        let bytes = to_vec_with(&value, options.clone()).unwrap();
        assert_eq!(from_slice(&bytes).unwrap(), value);
    }
}

#[test]
fn iso_datetime_bytes_are_stable() {
    // Decoding tag 0 text and re-encoding in the default style reproduces
    // the input bytes.
    let payload = hex!("c074323031332d30332d32315432303a30343a30305a");
    let decoded = from_slice(&payload).unwrap();
    assert_eq!(to_vec(&decoded).unwrap(), payload);
}

#[test]
fn canonical_encodes_are_order_independent() {
    let a = Value::Map(vec![
        ("one".into(), 1.into()),
        ("two".into(), 2.into()),
        (3.into(), "three".into()),
    ]);
    let b = Value::Map(vec![
        (3.into(), "three".into()),
        ("two".into(), 2.into()),
        ("one".into(), 1.into()),
    ]);

    let canonical_a = to_vec_with(&a, Options::canonical()).unwrap();
    let canonical_b = to_vec_with(&b, Options::canonical()).unwrap();
    assert_eq!(canonical_a, canonical_b);
    assert_ne!(to_vec(&a).unwrap(), to_vec(&b).unwrap());

    // Decoding and re-encoding canonically is a fixed point.
    let decoded = from_slice(&canonical_a).unwrap();
    assert_eq!(to_vec_with(&decoded, Options::canonical()).unwrap(), canonical_a);
}

#[test]
fn shared_body_is_emitted_once() {
    let x = Shared::new(Value::Array(vec![42.into()]));
    let graph = Value::Array(vec![
        Value::Shared(x.clone()),
        Value::Shared(x.clone()),
        Value::Shared(x),
    ]);
    let options = Options {
        value_sharing: true,
        ..Default::default()
    };
    let bytes = to_vec_with(&graph, options).unwrap();
    assert_eq!(bytes, hex!("83d81c81182ad81d00d81d00"));

    // The decoded graph aliases a single value.
    let decoded = from_slice(&bytes).unwrap();
    let Value::Array(items) = &decoded else {
        panic!("expected an array");
    };
    let handles: Vec<_> = items
        .iter()
        .map(|item| match item {
            Value::Shared(shared) => shared.clone(),
            other => panic!("expected a shared element, got {other:?}"),
        })
        .collect();
    assert!(handles[0].ptr_eq(&handles[1]));
    assert!(handles[1].ptr_eq(&handles[2]));
}

#[test]
fn cyclic_graph_roundtrip() {
    let a = Shared::new(Value::Array(vec![]));
    if let Value::Array(items) = &mut *a.borrow_mut() {
        items.push(Value::Shared(a.clone()));
    }
    let options = Options {
        value_sharing: true,
        ..Default::default()
    };
    let bytes = to_vec_with(&Value::Shared(a), options).unwrap();
    let decoded = from_slice(&bytes).unwrap();

    let Value::Shared(outer) = &decoded else {
        panic!("expected a shared value");
    };
    let inner = outer.borrow();
    let Value::Array(items) = &*inner else {
        panic!("expected an array");
    };
    let Value::Shared(element) = &items[0] else {
        panic!("expected a shared element");
    };
    assert!(element.ptr_eq(outer));
}

#[test]
fn decoder_and_encoder_agree_over_readers() {
    // Exercise the io::Read / io::Write surfaces rather than the slice
    // helpers.
    let value = Value::Map(vec![
        ("numbers".into(), Value::Array((0..100).map(Value::from).collect())),
        ("text".into(), "the quick brown fox".into()),
    ]);

    let mut buffer = Vec::new();
    encode::to_writer(&mut buffer, &value).unwrap();
    let decoded = decode::from_reader(std::io::Cursor::new(buffer)).unwrap();
    assert_eq!(decoded, value);
}
