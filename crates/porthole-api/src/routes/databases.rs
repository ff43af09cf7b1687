use axum::Json;
use axum::extract::State;

use crate::request::ListDatabasesResponse;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Json<ListDatabasesResponse> {
    Json(match state.docs.list_databases().await {
        Ok(databases) => ListDatabasesResponse {
            databases,
            error: None,
        },
        Err(e) => ListDatabasesResponse {
            databases: vec![],
            error: Some(e.to_string()),
        },
    })
}
