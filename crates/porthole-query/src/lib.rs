mod normalize;
mod parse;
mod value;

pub use normalize::{
    InvalidIdError, convert_date_markers, convert_id_fields, is_operator_document,
    normalize_document, normalize_update, to_object_id,
};
pub use parse::{QueryFormatError, extract_json_object, parse_query};
pub use value::{bson_to_json, document_to_json, json_to_bson};
