use axum::Json;
use axum::extract::State;
use bson::Document;
use porthole_ai::GenerateRequest;
use porthole_db::Page;
use porthole_query::{extract_json_object, parse_query};

use crate::request::{CostInfo, GenerateQueryRequest, GenerateQueryResponse};
use crate::state::AppState;

/// How many sample documents the model sees for collection shape.
const SAMPLE_LIMIT: i64 = 5;

pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateQueryRequest>,
) -> Json<GenerateQueryResponse> {
    Json(match generate_inner(&state, req).await {
        Ok(resp) => resp,
        Err(error) => GenerateQueryResponse {
            error: Some(error),
            ..Default::default()
        },
    })
}

async fn generate_inner(
    state: &AppState,
    req: GenerateQueryRequest,
) -> Result<GenerateQueryResponse, String> {
    let Some(generator) = state.generator.clone() else {
        return Err("query generation is not configured".into());
    };
    let db = req.database_name.as_deref();

    let samples = state
        .docs
        .find_many(
            &req.collection_name,
            Document::new(),
            Page {
                limit: Some(SAMPLE_LIMIT),
                skip: None,
            },
            db,
        )
        .await
        .map_err(|e| e.to_string())?;

    let generated = generator
        .generate(&GenerateRequest {
            collection: req.collection_name.clone(),
            prompt: req.natural_language_text,
            samples,
            now: bson::DateTime::now(),
            model: req.model_id,
        })
        .await
        .map_err(|e| e.to_string())?;

    let query_text = validate_candidate(&generated.query_text)?;
    Ok(GenerateQueryResponse {
        query_text,
        cost: generated.cost.map(|c| CostInfo {
            total_cost: c.total_cost,
        }),
        error: None,
    })
}

/// The model's output is just another producer of untyped query text: accept
/// it only if it passes the same parse/normalize gate as hand-typed input.
/// One salvage attempt extracts a brace-delimited object before giving up.
fn validate_candidate(raw: &str) -> Result<String, String> {
    let raw = raw.trim();
    match parse_query(raw) {
        Ok(_) => Ok(raw.to_string()),
        Err(err) => {
            if let Some(candidate) = extract_json_object(raw) {
                if parse_query(candidate).is_ok() {
                    return Ok(candidate.to_string());
                }
            }
            Err(err.to_string())
        }
    }
}
