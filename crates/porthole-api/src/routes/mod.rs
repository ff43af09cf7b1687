mod ai;
mod collections;
mod databases;
mod documents;
mod health;
mod query;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/v1/databases/list", post(databases::list))
        .route("/v1/collections/list", post(collections::list))
        .route("/v1/collections/stats", post(collections::stats))
        .route("/v1/collections/create", post(collections::create))
        .route("/v1/collections/drop", post(collections::drop))
        .route("/v1/documents/list", post(documents::list))
        .route("/v1/documents/modify", post(documents::modify))
        .route("/v1/query/run", post(query::run))
        .route("/v1/query/generate", post(ai::generate))
}
