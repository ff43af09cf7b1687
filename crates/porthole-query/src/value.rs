use bson::{Bson, Document};
use serde_json::Value;

/// Convert a JSON tree into BSON structurally, without extended-JSON
/// interpretation. Marker documents like `{"$date": ...}` and `{"$oid": ...}`
/// survive as plain sub-documents so the normalizer decides what they mean.
pub fn json_to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if let Ok(small) = i32::try_from(i) {
                    Bson::Int32(small)
                } else {
                    Bson::Int64(i)
                }
            } else {
                Bson::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Bson::String(s),
        Value::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
        Value::Object(map) => {
            Bson::Document(map.into_iter().map(|(k, v)| (k, json_to_bson(v))).collect())
        }
    }
}

/// Serialize a BSON value for the client.
///
/// Native identifiers come back as their 24-hex-char textual form and dates
/// as RFC 3339 strings, so a value that round-trips through the normalizer
/// reads back exactly as it was typed.
pub fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::from(*i),
        Bson::Double(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Bson::String(s) => Value::String(s.clone()),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => Value::String(s),
            Err(_) => Value::from(dt.timestamp_millis()),
        },
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(doc) => Value::Object(
            doc.iter()
                .map(|(k, v)| (k.clone(), bson_to_json(v)))
                .collect(),
        ),
        // Binary, Decimal128, regex and friends rarely show up in dashboard
        // data; relaxed extended JSON is good enough for display.
        other => other.clone().into_relaxed_extjson(),
    }
}

/// Serialize a whole document for the client. See [`bson_to_json`].
pub fn document_to_json(doc: &Document) -> Value {
    Value::Object(
        doc.iter()
            .map(|(k, v)| (k.clone(), bson_to_json(v)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;
    use bson::doc;
    use serde_json::json;

    #[test]
    fn markers_survive_json_to_bson() {
        let value = json_to_bson(json!({ "createdAt": { "$date": "2023-05-02T00:00:00.000Z" } }));
        let doc = match value {
            Bson::Document(d) => d,
            other => panic!("expected document, got {:?}", other),
        };
        assert!(matches!(
            doc.get("createdAt"),
            Some(Bson::Document(inner)) if inner.get_str("$date").is_ok()
        ));
    }

    #[test]
    fn integers_stay_integers() {
        assert_eq!(json_to_bson(json!(42)), Bson::Int32(42));
        assert_eq!(json_to_bson(json!(9_000_000_000_i64)), Bson::Int64(9_000_000_000));
        assert_eq!(json_to_bson(json!(1.5)), Bson::Double(1.5));
    }

    #[test]
    fn object_id_serializes_as_hex() {
        let oid = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let out = document_to_json(&doc! { "_id": oid });
        assert_eq!(out["_id"], json!("507f1f77bcf86cd799439011"));
    }

    #[test]
    fn datetime_serializes_as_rfc3339() {
        let dt = bson::DateTime::parse_rfc3339_str("2023-05-02T00:00:00Z").unwrap();
        let out = bson_to_json(&Bson::DateTime(dt));
        let s = out.as_str().unwrap();
        assert!(s.starts_with("2023-05-02T00:00:00"), "{s}");
    }

    #[test]
    fn nested_structures_recurse() {
        let oid = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let out = document_to_json(&doc! {
            "items": [ { "ownerId": oid }, 3_i32 ],
        });
        assert_eq!(out["items"][0]["ownerId"], json!("507f1f77bcf86cd799439011"));
        assert_eq!(out["items"][1], json!(3));
    }
}
