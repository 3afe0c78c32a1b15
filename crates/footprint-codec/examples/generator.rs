use footprint_codec::{encode, encode_with_version, Mapping, Record, Value, LEGACY_VERSION};

fn main() {
    let point = match Record::from_positional("Point", &["x", "y"], vec![Value::int(4), Value::int(5)])
    {
        Ok(record) => record,
        Err(err) => {
            eprintln!("invalid record: {}", err);
            std::process::exit(1);
        }
    };
    let value = Value::Map(Mapping::from_pairs(vec![
        (Value::text("label"), Value::text("hallo Welt")),
        (Value::text("point"), Value::Record(point)),
        (Value::int(5), Value::Float(3.141)),
    ]));

    for version in [LEGACY_VERSION, footprint_codec::current_version()] {
        match encode_with_version(&value, version) {
            Ok(footprint) => println!("v{:#04x} {} {}", version, footprint, footprint.digest().b64),
            Err(err) => {
                eprintln!("encoding failed: {}", err);
                std::process::exit(1);
            }
        }
    }

    if let Ok(footprint) = encode(&Value::int(5)) {
        println!("5 => {}", footprint);
    }
}
