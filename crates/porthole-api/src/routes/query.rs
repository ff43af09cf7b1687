use axum::Json;
use axum::extract::State;
use porthole_query::document_to_json;

use crate::request::{RunQueryRequest, RunQueryResponse};
use crate::state::AppState;

pub async fn run(
    State(state): State<AppState>,
    Json(req): Json<RunQueryRequest>,
) -> Json<RunQueryResponse> {
    let result = state
        .docs
        .execute_query(
            &req.collection_name,
            &req.query_text,
            req.database_name.as_deref(),
        )
        .await;

    Json(match result {
        Ok(documents) => RunQueryResponse {
            results: documents.iter().map(document_to_json).collect(),
            error: None,
        },
        // The DbError display already distinguishes "invalid query format"
        // from "query execution failed" for the UI.
        Err(e) => RunQueryResponse {
            results: vec![],
            error: Some(e.to_string()),
        },
    })
}
