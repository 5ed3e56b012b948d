//! JSON to Firestore REST value encoding.
//!
//! Firestore does not accept plain JSON documents, every value is wrapped in a
//! typed object such as `{"stringValue": "soup"}`. Integers travel as decimal
//! strings.
use serde_json::{Map, Number, Value, json};

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => encode_number(n),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => {
            let values: Vec<Value> = values.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

fn encode_number(n: &Number) -> Value {
    match n.as_i64() {
        Some(i) => json!({ "integerValue": i.to_string() }),
        // u64 above i64::MAX and floats
        None => json!({ "doubleValue": n.as_f64() }),
    }
}

/// Reads a string field out of an encoded document, ignoring any other type.
pub fn decode_string<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key)?.get("stringValue")?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(encode_value(&json!(null)), json!({ "nullValue": null }));
        assert_eq!(encode_value(&json!(true)), json!({ "booleanValue": true }));
        assert_eq!(encode_value(&json!("rice")), json!({ "stringValue": "rice" }));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(encode_value(&json!(42)), json!({ "integerValue": "42" }));
        assert_eq!(encode_value(&json!(-7)), json!({ "integerValue": "-7" }));
        assert_eq!(encode_value(&json!(2.5)), json!({ "doubleValue": 2.5 }));
        assert_eq!(
            encode_value(&json!(u64::MAX)),
            json!({ "doubleValue": u64::MAX as f64 })
        );
    }

    #[test]
    fn test_nested() {
        let encoded = encode_value(&json!({
            "nutrition": { "protein": 12 },
            "steps": ["boil", "serve"]
        }));

        assert_eq!(
            encoded,
            json!({
                "mapValue": { "fields": {
                    "nutrition": { "mapValue": { "fields": {
                        "protein": { "integerValue": "12" }
                    } } },
                    "steps": { "arrayValue": { "values": [
                        { "stringValue": "boil" },
                        { "stringValue": "serve" }
                    ] } }
                } }
            })
        );
    }

    #[test]
    fn test_decode_string() {
        let fields = json!({
            "name": { "stringValue": "Soup" },
            "votes": { "integerValue": "3" }
        });
        let fields = fields.as_object().unwrap();

        assert_eq!(decode_string(fields, "name"), Some("Soup"));
        assert_eq!(decode_string(fields, "votes"), None);
        assert_eq!(decode_string(fields, "missing"), None);
    }
}
