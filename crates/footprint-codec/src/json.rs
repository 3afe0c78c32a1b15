//! Lossless bridge between JSON documents and the value model.
//!
//! Plain JSON maps onto null, bool, int, float, text, list and text-keyed
//! maps. Everything else is written as a single-discriminator object whose
//! tag key starts with `$`:
//!
//! ```text
//! {"$int": "36893488147419103232"}
//! {"$float": "nan" | "inf" | "-inf"}
//! {"$complex": [re, im]}
//! {"$bytes": "<base64url>"}
//! {"$tuple": [...]}
//! {"$map": [[key, value], ...]}
//! {"$record": "name", "fields": [["field", value], ...]}
//! {"$extension": "class", "state": value}
//! {"$array": "<f8", "shape": [2, 3], "data": "<base64url>"}
//! ```
//!
//! Conversion recurses, so callers bound nesting before converting; values
//! from [`decode`](crate::decode) are already bounded by
//! [`DecodeOptions::max_depth`](crate::DecodeOptions::max_depth).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde_json::{json, Map as JsonMap, Number, Value as Json};

use crate::array::{DType, NumericArray};
use crate::errors::{FootprintError, Result};
use crate::value::{Complex, Mapping, Record, Value};

/// Renders `value` as JSON.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => {
            if let Some(n) = i.to_i64() {
                Json::from(n)
            } else if let Some(n) = i.to_u128().and_then(|n| u64::try_from(n).ok()) {
                Json::from(n)
            } else {
                json!({ "$int": i.to_string() })
            }
        }
        Value::Float(f) => float_to_json(*f),
        Value::Complex(c) => json!({ "$complex": [float_to_json(c.re), float_to_json(c.im)] }),
        Value::Bytes(b) => json!({ "$bytes": URL_SAFE_NO_PAD.encode(b) }),
        Value::Text(s) => Json::String(s.clone()),
        Value::List(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Tuple(items) => json!({ "$tuple": items.iter().map(to_json).collect::<Vec<_>>() }),
        Value::Map(map) => {
            let plain = map
                .iter()
                .all(|(k, _)| matches!(k, Value::Text(s) if !s.starts_with('$')));
            if plain {
                let mut object = JsonMap::new();
                for (k, v) in map.iter() {
                    if let Value::Text(key) = k {
                        object.insert(key.clone(), to_json(v));
                    }
                }
                Json::Object(object)
            } else {
                let pairs: Vec<Json> = map
                    .iter()
                    .map(|(k, v)| json!([to_json(k), to_json(v)]))
                    .collect();
                json!({ "$map": pairs })
            }
        }
        Value::Record(record) => {
            let fields: Vec<Json> = record
                .fields()
                .iter()
                .map(|(name, v)| json!([name, to_json(v)]))
                .collect();
            json!({ "$record": record.type_name(), "fields": fields })
        }
        Value::Extension(ext) => {
            json!({ "$extension": ext.class_name(), "state": to_json(&ext.capture_state()) })
        }
        Value::Array(array) => json!({
            "$array": array.dtype().label(),
            "shape": array.shape(),
            "data": URL_SAFE_NO_PAD.encode(array.data()),
        }),
    }
}

fn float_to_json(f: f64) -> Json {
    match Number::from_f64(f) {
        Some(n) => Json::Number(n),
        None if f.is_nan() => json!({ "$float": "nan" }),
        None if f > 0.0 => json!({ "$float": "inf" }),
        None => json!({ "$float": "-inf" }),
    }
}

/// Parses a JSON document into a value.
///
/// # Errors
///
/// [`FootprintError::TypeMismatch`] for malformed tagged objects and
/// [`FootprintError::UnsupportedType`] for unknown tags or `$extension`,
/// which has no meaning without a registered class.
pub fn from_json(json: &Json) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => Ok(number_to_value(n)),
        Json::String(s) => Ok(Value::Text(s.clone())),
        Json::Array(items) => items
            .iter()
            .map(from_json)
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        Json::Object(object) => match object.keys().find(|k| k.starts_with('$')) {
            Some(tag) => tagged_from_json(tag, object),
            None => object
                .iter()
                .map(|(k, v)| Ok((Value::Text(k.clone()), from_json(v)?)))
                .collect::<Result<Vec<_>>>()
                .map(|pairs| Value::Map(Mapping::from_pairs(pairs))),
        },
    }
}

fn number_to_value(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::int(i)
    } else if let Some(u) = n.as_u64() {
        Value::int(u)
    } else {
        Value::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn shape_error<T>(expected: &'static str, found: &Json) -> Result<T> {
    Err(FootprintError::TypeMismatch {
        expected,
        found: json_kind(found),
    })
}

fn field<'a>(object: &'a JsonMap<String, Json>, key: &str, expected: &'static str) -> Result<&'a Json> {
    object.get(key).ok_or(FootprintError::TypeMismatch {
        expected,
        found: "missing member",
    })
}

fn as_str<'a>(json: &'a Json, expected: &'static str) -> Result<&'a str> {
    json.as_str().map_or_else(|| shape_error(expected, json), Ok)
}

fn as_array<'a>(json: &'a Json, expected: &'static str) -> Result<&'a Vec<Json>> {
    json.as_array().map_or_else(|| shape_error(expected, json), Ok)
}

fn as_pair<'a>(json: &'a Json, expected: &'static str) -> Result<(&'a Json, &'a Json)> {
    match json.as_array().map(Vec::as_slice) {
        Some([a, b]) => Ok((a, b)),
        _ => shape_error(expected, json),
    }
}

fn decode_b64(json: &Json, expected: &'static str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(as_str(json, expected)?)
        .map_err(|_| FootprintError::TypeMismatch {
            expected,
            found: "string that is not base64url",
        })
}

fn float_from_json(json: &Json) -> Result<f64> {
    match json {
        Json::Number(n) => n.as_f64().map_or_else(|| shape_error("float", json), Ok),
        Json::Object(object) => match object.get("$float").and_then(Json::as_str) {
            Some("nan") => Ok(f64::NAN),
            Some("inf") => Ok(f64::INFINITY),
            Some("-inf") => Ok(f64::NEG_INFINITY),
            _ => shape_error("\"nan\", \"inf\" or \"-inf\"", json),
        },
        other => shape_error("float", other),
    }
}

fn tagged_from_json(tag: &str, object: &JsonMap<String, Json>) -> Result<Value> {
    let body = &object[tag];
    match tag {
        "$int" => as_str(body, "decimal integer string")?
            .parse::<BigInt>()
            .map(Value::Int)
            .map_err(|_| FootprintError::TypeMismatch {
                expected: "decimal integer string",
                found: "string that is not an integer",
            }),
        "$float" => float_from_json(&Json::Object(object.clone())).map(Value::Float),
        "$complex" => {
            let (re, im) = as_pair(body, "[re, im]")?;
            Ok(Value::Complex(Complex::new(
                float_from_json(re)?,
                float_from_json(im)?,
            )))
        }
        "$bytes" => decode_b64(body, "base64url string").map(|b| Value::bytes(b)),
        "$tuple" => as_array(body, "array of tuple items")?
            .iter()
            .map(from_json)
            .collect::<Result<Vec<_>>>()
            .map(Value::Tuple),
        "$map" => {
            let mut pairs = Vec::new();
            for pair in as_array(body, "array of [key, value] pairs")? {
                let (k, v) = as_pair(pair, "[key, value] pair")?;
                pairs.push((from_json(k)?, from_json(v)?));
            }
            Ok(Value::Map(Mapping::from_pairs(pairs)))
        }
        "$record" => {
            let type_name = as_str(body, "record type name")?;
            let mut fields = Vec::new();
            for entry in as_array(field(object, "fields", "record fields")?, "record fields")? {
                let (name, v) = as_pair(entry, "[name, value] field")?;
                fields.push((as_str(name, "field name")?.to_string(), from_json(v)?));
            }
            Record::new(type_name, fields)
                .map(Value::Record)
                .map_err(|e| FootprintError::Reconstruct {
                    name: type_name.to_string(),
                    reason: e.to_string(),
                })
        }
        "$extension" => Err(FootprintError::UnsupportedType {
            type_name: "extension",
            reason: format!(
                "extension '{}' cannot be built from JSON without its class",
                body.as_str().unwrap_or("?")
            ),
        }),
        "$array" => {
            let label = as_str(body, "dtype label")?;
            let dtype = DType::from_label(label).ok_or_else(|| {
                FootprintError::InvalidArray(format!("unknown dtype label '{}'", label))
            })?;
            let shape = as_array(field(object, "shape", "array shape")?, "array shape")?
                .iter()
                .map(|d| d.as_u64().map_or_else(|| shape_error("dimension", d), Ok))
                .collect::<Result<Vec<_>>>()?;
            let data = decode_b64(field(object, "data", "array data")?, "base64url string")?;
            NumericArray::new(dtype, shape, data).map(Value::Array)
        }
        other => Err(FootprintError::UnsupportedType {
            type_name: "json tag",
            reason: format!("unknown tag '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::OpaqueExtension;
    use crate::value::ExtensionValue;

    #[test]
    fn plain_json_stays_plain() {
        let doc = json!({ "name": "hallo Welt", "n": 5, "pi": 3.141, "ok": true, "xs": [1, null] });
        let value = from_json(&doc).unwrap();
        assert_eq!(value.as_map().unwrap().get(&Value::text("n")), Some(&Value::int(5)));
        assert_eq!(to_json(&value), doc);
    }

    #[test]
    fn tagged_forms_round_trip() {
        let big: BigInt = "-10301051460877537453973547267843".parse().unwrap();
        let value = Value::List(vec![
            Value::Int(big),
            Value::Float(f64::INFINITY),
            Value::Complex(Complex::new(3.0, 4.0)),
            Value::bytes(&b"ab4+#"[..]),
            Value::Tuple(vec![Value::int(1), Value::Null]),
            Value::Map(Mapping::from_pairs(vec![(Value::int(5), Value::int(5))])),
            Value::Record(
                Record::new("nt", vec![("x".into(), Value::int(4)), ("y".into(), Value::int(5))])
                    .unwrap(),
            ),
            Value::Array(NumericArray::from_f64(vec![2], &[1.0, 2.0]).unwrap()),
        ]);
        let json = to_json(&value);
        assert_eq!(from_json(&json).unwrap(), value);
    }

    #[test]
    fn nan_survives() {
        let json = to_json(&Value::Float(f64::NAN));
        assert_eq!(json, json!({ "$float": "nan" }));
        assert!(matches!(from_json(&json).unwrap(), Value::Float(f) if f.is_nan()));
    }

    #[test]
    fn dollar_keys_force_pair_form() {
        let map = Mapping::from_pairs(vec![(Value::text("$int"), Value::int(1))]);
        let json = to_json(&Value::Map(map.clone()));
        assert!(json.get("$map").is_some());
        assert_eq!(from_json(&json).unwrap(), Value::Map(map));
    }

    #[test]
    fn extensions_render_but_do_not_parse() {
        let ext = ExtensionValue::new(OpaqueExtension::new("pkg.T", Value::int(1)));
        let json = to_json(&Value::Extension(ext));
        assert_eq!(json, json!({ "$extension": "pkg.T", "state": 1 }));
        assert!(matches!(
            from_json(&json).unwrap_err(),
            FootprintError::UnsupportedType { .. }
        ));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!(from_json(&json!({ "$what": 1 })).is_err());
    }
}
