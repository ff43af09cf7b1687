use bson::{Bson, Document};

use crate::normalize::{convert_date_markers, convert_id_fields};
use crate::value::json_to_bson;

/// Query text was not a well-formed JSON object. Carries the underlying
/// parse message so callers can show "fix your query" with detail, distinct
/// from a storage-side execution failure.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFormatError(pub String);

impl std::fmt::Display for QueryFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid query format: {}", self.0)
    }
}

impl std::error::Error for QueryFormatError {}

/// Parse untyped query text into a normalized filter document.
///
/// The text must be a JSON object (not an array, not a scalar). Date markers
/// are converted first, then identifier fields, over the same tree. The
/// result is re-checked to still be a document before it is handed to the
/// storage engine.
pub fn parse_query(text: &str) -> Result<Document, QueryFormatError> {
    let parsed: serde_json::Value =
        serde_json::from_str(text).map_err(|e| QueryFormatError(e.to_string()))?;

    if !parsed.is_object() {
        return Err(QueryFormatError("query must be a JSON object".into()));
    }

    match convert_id_fields(convert_date_markers(json_to_bson(parsed))) {
        Bson::Document(doc) => Ok(doc),
        _ => Err(QueryFormatError(
            "query did not normalize to a document".into(),
        )),
    }
}

/// Best-effort salvage of a JSON object from model output that wraps it in
/// prose or code fences: the substring from the first `{` to the last `}`.
/// A heuristic patch, not a JSON repair strategy — the result still goes
/// through [`parse_query`] and fails there if it isn't a real object.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
