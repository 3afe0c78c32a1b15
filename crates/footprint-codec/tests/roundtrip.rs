use std::collections::{BTreeSet, HashMap, HashSet};

use bytes::{Bytes, BytesMut};
use footprint_codec::{
    current_version, decode, decode_with, encode, encode_with_version, from_footprint,
    to_footprint, BigInt, Complex, FootprintError, Mapping, NumericArray, Record, Registry,
    ToValue, Value, LEGACY_VERSION,
};

fn round_trip(value: &Value) -> Value {
    let footprint = encode(value).unwrap();
    let decoded = decode(&footprint).unwrap();
    assert_eq!(
        encode(&decoded).unwrap(),
        footprint,
        "re-encoding changed the bytes of {:?}",
        value
    );
    decoded
}

#[test]
fn atoms_round_trip() {
    let two_pow_65: BigInt = "36893488147419103232".parse().unwrap();
    let minus_three_pow_65: BigInt = "-10301051460877537453973547267843".parse().unwrap();
    let atoms = vec![
        Value::int(12345678),
        Value::int(0),
        Value::int(-1),
        Value::Int(two_pow_65),
        Value::Int(minus_three_pow_65),
        Value::Float(3.141),
        Value::Float(-0.0),
        Value::Float(f64::INFINITY),
        Value::text("hallo Welt"),
        Value::text("öäüß"),
        Value::text(""),
        Value::Bool(true),
        Value::Bool(false),
        Value::Null,
        Value::bytes(&b"ab4+#"[..]),
        Value::Complex(Complex::new(3.0, 4.0)),
    ];
    for atom in atoms {
        assert_eq!(round_trip(&atom), atom);
    }
}

#[test]
fn negative_zero_keeps_its_sign() {
    match round_trip(&Value::Float(-0.0)) {
        Value::Float(f) => assert!(f.is_sign_negative()),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn nan_round_trips_as_nan() {
    let footprint = encode(&Value::Float(f64::NAN)).unwrap();
    assert!(matches!(decode(&footprint).unwrap(), Value::Float(f) if f.is_nan()));
    assert_eq!(encode(&decode(&footprint).unwrap()).unwrap(), footprint);
}

#[test]
fn five_round_trips_byte_identically() {
    let first = to_footprint(&5i64).unwrap();
    let decoded: i64 = from_footprint(&first, &Registry::new()).unwrap();
    assert_eq!(decoded, 5);
    assert_eq!(to_footprint(&decoded).unwrap(), first);
}

#[test]
fn containers_round_trip() {
    let value = Value::List(vec![
        Value::Tuple(vec![Value::int(1), Value::text("a")]),
        Value::List(vec![]),
        Value::Tuple(vec![]),
        Value::Map(Mapping::from_pairs(vec![(
            Value::text("nested"),
            Value::List(vec![Value::Null, Value::Bool(true)]),
        )])),
    ]);
    assert_eq!(round_trip(&value), value);
}

#[test]
fn list_and_tuple_survive_as_themselves() {
    let native = (vec![1u8, 2], (3u8, 4u8));
    let footprint = to_footprint(&native).unwrap();
    let back: (Vec<u8>, (u8, u8)) = from_footprint(&footprint, &Registry::new()).unwrap();
    assert_eq!(back, native);
}

#[test]
fn three_dimensional_double_array_round_trips() {
    let shape = vec![3u64, 53, 2];
    let values: Vec<f64> = (0..3 * 53 * 2).map(|i| i as f64 * 0.5 - 7.25).collect();
    let array = NumericArray::from_f64(shape.clone(), &values).unwrap();
    let decoded = round_trip(&Value::Array(array));
    match decoded {
        Value::Array(back) => {
            assert_eq!(back.shape(), shape.as_slice());
            assert_eq!(back.to_f64().unwrap(), values);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn heterogeneous_keys_retrieve_their_values() {
    let map = Mapping::from_pairs(vec![
        (Value::text("a"), Value::int(1)),
        (Value::int(5), Value::int(5)),
        (Value::Complex(Complex::new(3.0, 4.0)), Value::text("l")),
        (Value::Bool(false), Value::bytes(&b"ab4+#"[..])),
    ]);
    let decoded = round_trip(&Value::Map(map.clone()));
    let decoded = decoded.as_map().unwrap();
    assert_eq!(decoded.len(), 4);
    for (key, value) in map.iter() {
        assert_eq!(decoded.get(key), Some(value), "key {:?}", key);
    }
    // Bool false and int 0 are distinct keys.
    assert_eq!(decoded.get(&Value::int(0)), None);
}

#[test]
fn insertion_order_does_not_change_the_footprint() {
    let mut forward = HashMap::new();
    forward.insert("a".to_string(), 1i64);
    forward.insert("b".to_string(), 2i64);
    let backward = Mapping::from_pairs(vec![
        (Value::text("b"), Value::int(2)),
        (Value::text("a"), Value::int(1)),
    ]);
    assert_eq!(
        to_footprint(&forward).unwrap(),
        encode(&Value::Map(backward)).unwrap()
    );
}

#[test]
fn first_byte_is_the_current_version() {
    for value in [Value::Null, Value::int(5), Value::text("x")] {
        assert_eq!(encode(&value).unwrap()[0], current_version());
    }
}

#[test]
fn legacy_footprints_stay_canonical() {
    let value = Value::List(vec![
        Value::Map(Mapping::from_pairs(vec![
            (Value::text("b"), Value::int(2)),
            (Value::text("a"), Value::int(1)),
        ])),
        Value::Float(3.141),
    ]);
    let legacy = encode_with_version(&value, LEGACY_VERSION).unwrap();
    assert_eq!(legacy[0], LEGACY_VERSION);
    let decoded = decode(&legacy).unwrap();
    assert_eq!(decoded, value);
    assert_eq!(
        encode_with_version(&decoded, LEGACY_VERSION).unwrap(),
        legacy
    );
}

#[test]
fn mutable_buffers_are_rejected_before_encoding() {
    let err = to_footprint(&BytesMut::from(&b"abc"[..])).unwrap_err();
    assert!(matches!(err, FootprintError::UnsupportedType { .. }));

    let nested = vec![Some(BytesMut::new())];
    assert!(matches!(
        to_footprint(&nested).unwrap_err(),
        FootprintError::UnsupportedType { .. }
    ));

    // The frozen form is fine.
    let frozen: Bytes = BytesMut::from(&b"abc"[..]).freeze();
    assert_eq!(frozen.to_value().unwrap(), Value::bytes(&b"abc"[..]));
}

#[test]
fn footprints_are_hashable() {
    let values = [Value::int(5), Value::int(5), Value::text("5"), Value::Null];
    let hashed: HashSet<_> = values.iter().map(|v| encode(v).unwrap()).collect();
    let ordered: BTreeSet<_> = values.iter().map(|v| encode(v).unwrap()).collect();
    assert_eq!(hashed.len(), 3);
    assert_eq!(ordered.len(), 3);

    let mut cache = HashMap::new();
    cache.insert(encode(&Value::int(5)).unwrap(), "five");
    assert_eq!(cache.get(&encode(&Value::int(5)).unwrap()), Some(&"five"));
}

#[test]
fn parallel_decoding_shares_one_registry() {
    let mut registry = Registry::new();
    registry.register_record("nt", &["x", "y"]);
    let registry = &registry;

    let footprints: Vec<_> = (0..16i64)
        .map(|n| {
            let record = Record::from_positional("nt", &["x", "y"], vec![Value::int(n), Value::int(n)])
                .unwrap();
            encode_with_version(&Value::Record(record), LEGACY_VERSION).unwrap()
        })
        .collect();
    std::thread::scope(|scope| {
        for (n, footprint) in footprints.iter().enumerate() {
            scope.spawn(move || {
                let value = decode_with(footprint, registry).unwrap();
                assert_eq!(value.as_record().unwrap().get("x"), Some(&Value::int(n as i64)));
            });
        }
    });
}
