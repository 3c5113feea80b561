#![cfg(test)]
use std::net::IpAddr;
use std::rc::Rc;

use hex_literal::hex;
use num_bigint::BigInt;
use time::macros::datetime;

use super::decode::*;
use super::value::{BigFloat, Decimal, IpNetwork, Rational, Value};

fn dec(data: &[u8]) -> Value {
    from_slice(data).unwrap()
}

fn dec_with(data: &[u8], options: Options) -> Result<Value, Error> {
    from_slice_with(data, options)
}

#[test]
fn integers() {
    assert_eq!(dec(&hex!("00")), Value::from(0));
    assert_eq!(dec(&hex!("01")), Value::from(1));
    assert_eq!(dec(&hex!("0a")), Value::from(10));
    assert_eq!(dec(&hex!("17")), Value::from(23));
    assert_eq!(dec(&hex!("1818")), Value::from(24));
    assert_eq!(dec(&hex!("1819")), Value::from(25));
    assert_eq!(dec(&hex!("1864")), Value::from(100));
    assert_eq!(dec(&hex!("1903e8")), Value::from(1000));
    assert_eq!(dec(&hex!("1a000f4240")), Value::from(1000000));
    assert_eq!(dec(&hex!("1b000000e8d4a51000")), Value::from(1000000000000u64));
    assert_eq!(
        dec(&hex!("1bffffffffffffffff")),
        Value::from(18446744073709551615u64)
    );
    assert_eq!(dec(&hex!("20")), Value::from(-1));
    assert_eq!(dec(&hex!("29")), Value::from(-10));
    assert_eq!(dec(&hex!("3863")), Value::from(-100));
    assert_eq!(dec(&hex!("3903e7")), Value::from(-1000));
}

#[test]
fn bignums() {
    let two_to_64: BigInt = BigInt::from(1u8) << 64;
    assert_eq!(
        dec(&hex!("c249010000000000000000")),
        Value::Integer(two_to_64.clone())
    );
    assert_eq!(
        dec(&hex!("3bffffffffffffffff")),
        Value::Integer(-two_to_64.clone())
    );
    assert_eq!(
        dec(&hex!("c349010000000000000000")),
        Value::Integer(-two_to_64 - 1)
    );
}

#[test]
fn bignum_requires_bytes() {
    assert!(matches!(
        from_slice(&hex!("c269010000000000000000")),
        Err(Error::InvalidTaggedValue { tag: 2, .. })
    ));
}

#[test]
fn invalid_integer_subtype() {
    assert!(matches!(
        from_slice(&[0x1c]),
        Err(Error::InvalidSubtype {
            major: 0,
            subtype: 0x1c
        })
    ));
}

#[test]
fn floats() {
    assert_eq!(dec(&hex!("f90000")), Value::Float(0.0));
    assert_eq!(dec(&hex!("f98000")), Value::Float(-0.0));
    assert_eq!(dec(&hex!("f93c00")), Value::Float(1.0));
    assert_eq!(dec(&hex!("fb3ff199999999999a")), Value::Float(1.1));
    assert_eq!(dec(&hex!("f93e00")), Value::Float(1.5));
    assert_eq!(dec(&hex!("f97bff")), Value::Float(65504.0));
    assert_eq!(dec(&hex!("fa47c35000")), Value::Float(100000.0));
    assert_eq!(dec(&hex!("f90001")), Value::Float(5.960464477539063e-8));
    assert_eq!(dec(&hex!("f9c400")), Value::Float(-4.0));
    assert_eq!(dec(&hex!("fbc010666666666666")), Value::Float(-4.1));
    assert_eq!(dec(&hex!("f97c00")), Value::Float(f64::INFINITY));
    assert_eq!(dec(&hex!("f9fc00")), Value::Float(f64::NEG_INFINITY));
    assert_eq!(dec(&hex!("fa7f800000")), Value::Float(f64::INFINITY));
    assert_eq!(dec(&hex!("faff800000")), Value::Float(f64::NEG_INFINITY));
    assert_eq!(dec(&hex!("fb7ff0000000000000")), Value::Float(f64::INFINITY));

    for payload in [
        hex!("f97e00").to_vec(),
        hex!("fa7fc00000").to_vec(),
        hex!("fb7ff8000000000000").to_vec(),
    ] {
        assert!(matches!(dec(&payload), Value::Float(v) if v.is_nan()));
    }
}

#[test]
fn specials() {
    assert_eq!(dec(&hex!("f4")), Value::Bool(false));
    assert_eq!(dec(&hex!("f5")), Value::Bool(true));
    assert_eq!(dec(&hex!("f6")), Value::Null);
    assert_eq!(dec(&hex!("f7")), Value::Undefined);
}

#[test]
fn simple_values() {
    assert_eq!(dec(&hex!("e0")), Value::Simple(0));
    assert_eq!(dec(&hex!("e2")), Value::Simple(2));
    assert_eq!(dec(&hex!("f3")), Value::Simple(19));
    assert_eq!(dec(&hex!("f820")), Value::Simple(32));
    assert_eq!(dec(&hex!("f8ff")), Value::Simple(255));

    // The two-byte form may not encode the one-byte range.
    assert!(matches!(
        from_slice(&hex!("f81f")),
        Err(Error::InvalidSimpleValue(31))
    ));
    assert!(matches!(
        from_slice(&hex!("f814")),
        Err(Error::InvalidSimpleValue(20))
    ));
}

#[test]
fn reserved_subtypes() {
    for subtype in [28u8, 29, 30] {
        assert!(matches!(
            from_slice(&[(7 << 5) | subtype]),
            Err(Error::InvalidSubtype { major: 7, .. })
        ));
    }
}

#[test]
fn strings_and_bytes() {
    assert_eq!(dec(&hex!("40")), Value::Bytes(vec![]));
    assert_eq!(dec(&hex!("4401020304")), Value::Bytes(vec![1, 2, 3, 4]));
    assert_eq!(dec(&hex!("60")), Value::from(""));
    assert_eq!(dec(&hex!("6161")), Value::from("a"));
    assert_eq!(dec(&hex!("6449455446")), Value::from("IETF"));
    assert_eq!(dec(&hex!("62225c")), Value::from("\"\\"));
    assert_eq!(dec(&hex!("62c3bc")), Value::from("\u{00fc}"));
    assert_eq!(dec(&hex!("63e6b0b4")), Value::from("\u{6c34}"));
}

#[test]
fn indefinite_strings() {
    assert_eq!(
        dec(&hex!("5f42010243030405ff")),
        Value::Bytes(vec![1, 2, 3, 4, 5])
    );
    assert_eq!(
        dec(&hex!("7f657374726561646d696e67ff")),
        Value::from("streaming")
    );
}

#[test]
fn mismatched_chunks() {
    // A text chunk inside an indefinite byte string, and vice versa.
    assert!(matches!(
        from_slice(&hex!("5f42010263030405ff")),
        Err(Error::InvalidChunk("byte string"))
    ));
    assert!(matches!(
        from_slice(&hex!("7f657374726561446d696e67ff")),
        Err(Error::InvalidChunk("text string"))
    ));
    // Chunks must be definite.
    assert!(matches!(
        from_slice(&hex!("5f5f4101ffff")),
        Err(Error::InvalidChunk("byte string"))
    ));
}

#[test]
fn arrays() {
    assert_eq!(dec(&hex!("80")), Value::Array(vec![]));
    assert_eq!(
        dec(&hex!("83010203")),
        Value::Array(vec![1.into(), 2.into(), 3.into()])
    );
    assert_eq!(
        dec(&hex!("8301820203820405")),
        Value::Array(vec![
            1.into(),
            Value::Array(vec![2.into(), 3.into()]),
            Value::Array(vec![4.into(), 5.into()]),
        ])
    );
    let long: Vec<Value> = (1..=25).map(Value::from).collect();
    assert_eq!(
        dec(&hex!(
            "98190102030405060708090a0b0c0d0e0f101112131415161718181819"
        )),
        Value::Array(long)
    );
}

#[test]
fn maps() {
    assert_eq!(dec(&hex!("a0")), Value::Map(vec![]));
    assert_eq!(
        dec(&hex!("a201020304")),
        Value::Map(vec![(1.into(), 2.into()), (3.into(), 4.into())])
    );
    assert_eq!(
        dec(&hex!("a26161016162820203")),
        Value::Map(vec![
            ("a".into(), 1.into()),
            ("b".into(), Value::Array(vec![2.into(), 3.into()])),
        ])
    );
    assert_eq!(
        dec(&hex!("826161a161626163")),
        Value::Array(vec![
            "a".into(),
            Value::Map(vec![("b".into(), "c".into())]),
        ])
    );
}

#[test]
fn indefinite_containers() {
    assert_eq!(dec(&hex!("9fff")), Value::Array(vec![]));
    let expected = Value::Array(vec![
        1.into(),
        Value::Array(vec![2.into(), 3.into()]),
        Value::Array(vec![4.into(), 5.into()]),
    ]);
    assert_eq!(dec(&hex!("9f018202039f0405ffff")), expected);
    assert_eq!(dec(&hex!("9f01820203820405ff")), expected);
    assert_eq!(dec(&hex!("83018202039f0405ff")), expected);
    assert_eq!(dec(&hex!("83019f0203ff820405")), expected);

    assert_eq!(
        dec(&hex!("bf61610161629f0203ffff")),
        Value::Map(vec![
            ("a".into(), 1.into()),
            ("b".into(), Value::Array(vec![2.into(), 3.into()])),
        ])
    );
    assert_eq!(
        dec(&hex!("bf6346756ef563416d7421ff")),
        Value::Map(vec![
            ("Fun".into(), true.into()),
            ("Amt".into(), (-2).into()),
        ])
    );
    // An indefinite string as a map key.
    assert_eq!(
        dec(&hex!("a17f657374726561646d696e67ff01")),
        Value::Map(vec![("streaming".into(), 1.into())])
    );
}

#[test]
fn break_outside_indefinite_item() {
    assert!(matches!(from_slice(&hex!("ff")), Err(Error::UnexpectedBreak)));
    // A break in value position inside a definite array.
    assert!(matches!(
        from_slice(&hex!("82ff01")),
        Err(Error::UnexpectedBreak)
    ));
    // A break between a key and its value.
    assert!(matches!(
        from_slice(&hex!("bf6161ffff")),
        Err(Error::UnexpectedBreak)
    ));
}

#[test]
fn datetimes() {
    assert_eq!(
        dec(&hex!("c074323031332d30332d32315432303a30343a30305a")),
        Value::DateTime(datetime!(2013-03-21 20:04:00 UTC))
    );
    assert_eq!(
        dec(&hex!("c07816323031332d30332d32315432303a30343a30302e335a")),
        Value::DateTime(datetime!(2013-03-21 20:04:00.3 UTC))
    );
    assert_eq!(
        dec(&hex!(
            "c0781b323031332d30332d32315432303a30343a30302e3338303834315a"
        )),
        Value::DateTime(datetime!(2013-03-21 20:04:00.380841 UTC))
    );
    assert_eq!(
        dec(&hex!("c07819323031332d30332d32315432323a30343a30302b30323a3030")),
        Value::DateTime(datetime!(2013-03-21 22:04:00 +2))
    );
    assert_eq!(
        dec(&hex!("c11a514b67b0")),
        Value::DateTime(datetime!(2013-03-21 20:04:00 UTC))
    );
    assert_eq!(
        dec(&hex!("c1fb41d452d9ec200000")),
        Value::DateTime(datetime!(2013-03-21 20:04:00.5 UTC))
    );
}

#[test]
fn invalid_datetimes() {
    assert!(matches!(
        from_slice(&hex!("c06b303030302d3132332d3031")),
        Err(Error::InvalidDateTime(text)) if text == "0000-123-01"
    ));
    // Tag 0 over a byte string.
    assert!(matches!(
        from_slice(&hex!("c04b303030302d3132332d3031")),
        Err(Error::InvalidTaggedValue { tag: 0, .. })
    ));
    // Tag 1 over a text string.
    assert!(matches!(
        from_slice(&hex!("c16b303030302d3132332d3031")),
        Err(Error::InvalidTimestamp(_))
    ));
}

#[test]
fn decimal_fractions() {
    assert_eq!(
        dec(&hex!("c48221196ab3")),
        Value::Decimal(Decimal::new(27315, -2))
    );
}

#[test]
fn bigfloats() {
    assert_eq!(
        dec(&hex!("c5822003")),
        Value::BigFloat(BigFloat::new(3, -1))
    );
}

#[test]
fn rationals() {
    assert_eq!(
        dec(&hex!("d81e820205")),
        Value::Rational(Rational::new(2, 5))
    );
    assert!(matches!(
        from_slice(&hex!("d81e820200")),
        Err(Error::InvalidTaggedValue { tag: 30, .. })
    ));
}

#[test]
fn regexes() {
    let decoded = dec(&hex!("d8236d68656c6c6f2028776f726c6429"));
    assert!(matches!(
        &decoded,
        Value::Regex(pattern) if pattern.as_str() == "hello (world)"
    ));

    // "(" alone is not a valid pattern.
    assert!(matches!(
        from_slice(&hex!("d8236128")),
        Err(Error::InvalidRegex(_))
    ));
}

#[test]
fn uuids() {
    assert_eq!(
        dec(&hex!("d825505eaffac8b51e480581277fdcc7842faf")),
        Value::Uuid(uuid::Uuid::from_bytes(hex!(
            "5eaffac8b51e480581277fdcc7842faf"
        )))
    );
    assert!(matches!(
        from_slice(&hex!("d825426162")),
        Err(Error::InvalidTaggedValue { tag: 37, .. })
    ));
}

#[test]
fn ip_addresses() {
    let v4: IpAddr = "192.10.10.1".parse().unwrap();
    assert_eq!(dec(&hex!("d9010444c00a0a01")), Value::Address(v4));

    let v6: IpAddr = "2001:db8:85a3::8a2e:370:7334".parse().unwrap();
    assert_eq!(
        dec(&hex!("d901045020010db885a3000000008a2e03707334")),
        Value::Address(v6)
    );

    // A six-byte value is a MAC address and passes through untyped.
    assert_eq!(
        dec(&hex!("d9010446010203040506")),
        Value::Tag(260, Box::new(Value::Bytes(vec![1, 2, 3, 4, 5, 6])))
    );

    assert!(matches!(
        from_slice(&hex!("d9010443c00a0a")),
        Err(Error::InvalidTaggedValue { tag: 260, .. })
    ));
    assert!(matches!(
        from_slice(&hex!("d9010401")),
        Err(Error::InvalidTaggedValue { tag: 260, .. })
    ));
}

#[test]
fn ip_networks() {
    assert_eq!(
        dec(&hex!("d90105a144c0a800641818")),
        Value::Network(IpNetwork::new("192.168.0.100".parse().unwrap(), 24))
    );
    assert_eq!(
        dec(&hex!("d90105a15020010db885a3000000008a2e000000001860")),
        Value::Network(IpNetwork::new("2001:db8:85a3:0:0:8a2e::".parse().unwrap(), 96))
    );

    // Two entries.
    assert!(matches!(
        from_slice(&hex!("d90105a244c0a80064181844c0a800001818")),
        Err(Error::InvalidTaggedValue { tag: 261, .. })
    ));
    // A prefix that is not an integer.
    assert!(matches!(
        from_slice(&hex!("d90105a144c0a80064420102")),
        Err(Error::InvalidTaggedValue { tag: 261, .. })
    ));
}

#[test]
fn sets() {
    assert_eq!(
        dec(&hex!("d9010283616361626161")),
        Value::Set(vec!["c".into(), "b".into(), "a".into()])
    );
    assert_eq!(
        dec(&hex!("d901029f010203ff")),
        Value::Set(vec![1.into(), 2.into(), 3.into()])
    );
    assert!(matches!(
        from_slice(&hex!("d901024101")),
        Err(Error::InvalidTaggedValue { tag: 258, .. })
    ));
}

#[test]
fn set_keys() {
    assert_eq!(
        dec(&hex!("a1d901028301020304")),
        Value::Map(vec![(
            Value::Set(vec![1.into(), 2.into(), 3.into()]),
            4.into()
        )])
    );
}

#[test]
fn unknown_tags_wrap() {
    assert_eq!(
        dec(&hex!("d917706548656c6c6f")),
        Value::Tag(6000, Box::new("Hello".into()))
    );
}

#[test]
fn tag_hook() {
    let mut decoder = Decoder::new(hex!("d917706548656c6c6f").as_slice());
    decoder.set_tag_hook(Rc::new(|tag, wrapped| {
        assert_eq!(tag, 6000);
        let Value::Tag(_, inner) = wrapped else {
            unreachable!()
        };
        let Value::Text(text) = *inner else {
            unreachable!()
        };
        Ok(Value::Text(text.chars().rev().collect()))
    }));
    assert_eq!(decoder.decode().unwrap(), Value::from("olleH"));
}

#[test]
fn object_hook() {
    let mut decoder = Decoder::new(hex!("a2616103616205").as_slice());
    decoder.set_object_hook(Rc::new(|entries| {
        Ok(Value::from(entries.len() as u64))
    }));
    assert_eq!(decoder.decode().unwrap(), Value::from(2));
}

#[test]
fn cyclic_array() {
    let decoded = dec(&hex!("d81c81d81d00"));
    let Value::Shared(outer) = &decoded else {
        panic!("expected a shared value, got {decoded:?}");
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
fn cyclic_map() {
    let decoded = dec(&hex!("d81ca100d81d00"));
    let Value::Shared(outer) = &decoded else {
        panic!("expected a shared value, got {decoded:?}");
    };
    let inner = outer.borrow();
    let Value::Map(entries) = &*inner else {
        panic!("expected a map");
    };
    assert_eq!(entries[0].0, Value::from(0));
    let Value::Shared(element) = &entries[0].1 else {
        panic!("expected a shared entry value");
    };
    assert!(element.ptr_eq(outer));
}

#[test]
fn shared_scalars() {
    // Tag 28 around a non-container still produces one handle for both
    // occurrences.
    let decoded = dec(&hex!("82d81c1863d81d00"));
    let Value::Array(items) = &decoded else {
        panic!("expected an array");
    };
    let (Value::Shared(a), Value::Shared(b)) = (&items[0], &items[1]) else {
        panic!("expected shared elements, got {decoded:?}");
    };
    assert!(a.ptr_eq(b));
    assert_eq!(*a.borrow(), Value::from(99));
}

#[test]
fn bad_shared_references() {
    assert!(matches!(
        from_slice(&hex!("d81d05")),
        Err(Error::SharedRefNotFound(5))
    ));
    assert!(matches!(
        from_slice(&hex!("d81d4101")),
        Err(Error::InvalidTaggedValue { tag: 29, .. })
    ));
}

#[test]
fn uninitialized_shared_reference() {
    // The set forces its members immutable, so the inner array only fills
    // its slot after construction; the self-reference cannot resolve.
    assert!(matches!(
        from_slice(&hex!("d90102d81c81d81d00")),
        Err(Error::UninitializedSharedValue(0))
    ));
}

#[test]
fn immutable_shared_references() {
    // set((a, a), a) with a = (1, 2, 3): sharing across immutable members
    // works once each member is fully constructed.
    let decoded = dec(&hex!("d90102d81c82d81c82d81c83010203d81d02d81d02"));
    let Value::Set(members) = &decoded else {
        panic!("expected a set, got {decoded:?}");
    };
    let (Value::Shared(pair), Value::Shared(a)) = (&members[0], &members[1]) else {
        panic!("expected shared members, got {decoded:?}");
    };
    let pair = pair.borrow();
    let Value::Array(pair_items) = &*pair else {
        panic!("expected an array");
    };
    let (Value::Shared(x), Value::Shared(y)) = (&pair_items[0], &pair_items[1]) else {
        panic!("expected shared elements");
    };
    assert!(x.ptr_eq(y));
    assert!(y.ptr_eq(a));
    assert_eq!(
        *a.borrow(),
        Value::Array(vec![1.into(), 2.into(), 3.into()])
    );
}

#[test]
fn premature_end_of_stream() {
    assert!(matches!(
        from_slice(&hex!("437879")),
        Err(Error::EndOfStream { wanted: 3, got: 2 })
    ));
    assert!(matches!(
        from_slice(&[]),
        Err(Error::EndOfStream { wanted: 1, got: 0 })
    ));
    assert!(matches!(
        from_slice(&hex!("19ff")),
        Err(Error::EndOfStream { wanted: 2, got: 1 })
    ));
}

#[test]
fn str_errors_policies() {
    // 0xc3 0x28 is an invalid two-byte sequence.
    let payload = hex!("62c328");

    assert!(matches!(
        from_slice(&payload),
        Err(Error::InvalidUtf8(_))
    ));
    assert!(matches!(
        dec_with(
            &payload,
            Options {
                str_errors: StrErrors::Error,
                ..Default::default()
            }
        ),
        Err(Error::Utf8(_))
    ));
    assert_eq!(
        dec_with(
            &payload,
            Options {
                str_errors: StrErrors::Replace,
                ..Default::default()
            }
        )
        .unwrap(),
        Value::from("\u{fffd}(")
    );
}

#[test]
fn recursion_limit() {
    // The default test-thread stack is too small to hold 1000 nested
    // decode_item frames in a debug build; run on a thread with a
    // generous stack so we're exercising the MaxRecursion check itself,
    // not the host stack size.
    std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| {
            let payload = vec![0x81u8; 2000];
            assert!(matches!(
                from_slice(&payload),
                Err(Error::MaxRecursion)
            ));
        })
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn decoder_is_reusable_across_items() {
    let payload = hex!("d81c8101 d81c8102");
    let mut decoder = Decoder::new(payload.as_slice());
    let first = decoder.decode().unwrap();
    let second = decoder.decode().unwrap();
    // Shared indices restart per item.
    assert_eq!(first, Value::Array(vec![1.into()]));
    assert_eq!(second, Value::Array(vec![2.into()]));
}
