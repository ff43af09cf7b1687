use bson::oid::ObjectId;
use bson::{Bson, Document, doc};

/// A supplied id is not coercible to a native identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidIdError(pub String);

impl std::fmt::Display for InvalidIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid identifier: {}", self.0)
    }
}

impl std::error::Error for InvalidIdError {}

/// The canonical textual form of a native identifier: 24 hex characters.
fn is_hex_object_id(s: &str) -> bool {
    s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Heuristic for fields that hold identifiers by convention: `_id`, `id`,
/// or anything ending in `Id` (`userId`, `accountId`, ...). Over schema-less
/// data this is guesswork, not a guarantee — a legitimate non-identifier
/// string that happens to be 24 hex characters in such a field will be
/// coerced. Kept deliberately narrow; plain strings elsewhere are never
/// touched.
fn is_id_field(key: &str) -> bool {
    key == "_id" || key == "id" || key.ends_with("Id")
}

/// Coerce a textual identifier to its native form.
pub fn to_object_id(id: &str) -> Result<ObjectId, InvalidIdError> {
    ObjectId::parse_str(id).map_err(|_| InvalidIdError(id.to_string()))
}

/// Recursively rewrite `{"$date": "<RFC 3339>"}` markers into native dates.
///
/// A marker whose string does not parse is left in place unchanged rather
/// than aborting the whole tree. Already-native dates pass through, so the
/// transform is idempotent. Does not mutate its input shape otherwise.
pub fn convert_date_markers(value: Bson) -> Bson {
    if let Bson::Document(doc) = &value {
        if doc.len() == 1 {
            if let Ok(raw) = doc.get_str("$date") {
                if let Ok(dt) = bson::DateTime::parse_rfc3339_str(raw) {
                    return Bson::DateTime(dt);
                }
            }
        }
    }

    match value {
        Bson::Document(doc) => Bson::Document(
            doc.into_iter()
                .map(|(k, v)| (k, convert_date_markers(v)))
                .collect(),
        ),
        Bson::Array(items) => {
            Bson::Array(items.into_iter().map(convert_date_markers).collect())
        }
        other => other,
    }
}

/// Recursively rewrite textual identifiers into native ones.
///
/// Two rules, applied independently of each other:
/// - a `{"$oid": "<24 hex>"}` document collapses to the identifier itself,
///   regardless of which key it sits under;
/// - a 24-hex-char string under an id-like key (see [`is_id_field`])
///   becomes an identifier.
///
/// Strings that are not exactly 24 hex characters are never touched, even
/// under id-like keys.
pub fn convert_id_fields(value: Bson) -> Bson {
    if let Bson::Document(doc) = &value {
        if doc.len() == 1 {
            if let Ok(raw) = doc.get_str("$oid") {
                if let Ok(oid) = ObjectId::parse_str(raw) {
                    return Bson::ObjectId(oid);
                }
            }
        }
    }

    match value {
        Bson::Document(doc) => Bson::Document(
            doc.into_iter()
                .map(|(key, val)| {
                    let val = match val {
                        Bson::String(s) if is_id_field(&key) && is_hex_object_id(&s) => {
                            match ObjectId::parse_str(&s) {
                                Ok(oid) => Bson::ObjectId(oid),
                                Err(_) => Bson::String(s),
                            }
                        }
                        other => convert_id_fields(other),
                    };
                    (key, val)
                })
                .collect(),
        ),
        Bson::Array(items) => Bson::Array(items.into_iter().map(convert_id_fields).collect()),
        other => other,
    }
}

/// Apply the full normalization pipeline to a filter document:
/// date markers first, then identifier coercion, over the same tree.
pub fn normalize_document(filter: Document) -> Document {
    match convert_id_fields(convert_date_markers(Bson::Document(filter))) {
        Bson::Document(doc) => doc,
        // A top-level `{"$oid": ...}` collapses to a bare identifier;
        // the only sensible reading is an id filter.
        other => doc! { "_id": other },
    }
}

/// True when any top-level key is a `$`-prefixed operator keyword.
///
/// A well-formed operator document has *every* key prefixed; the check is
/// deliberately existential so a partial document is never merged into an
/// operator form, and a malformed mix passes through for the storage engine
/// to reject.
pub fn is_operator_document(doc: &Document) -> bool {
    doc.keys().any(|k| k.starts_with('$'))
}

/// Normalize an update specification.
///
/// Operator documents pass through with their values normalized. A plain
/// partial document is normalized, has its `_id` stripped (`_id` is
/// immutable), and is wrapped in `$set` — exactly once.
pub fn normalize_update(update: Document) -> Document {
    let mut update = normalize_document(update);
    if is_operator_document(&update) {
        update
    } else {
        update.remove("_id");
        doc! { "$set": update }
    }
}
