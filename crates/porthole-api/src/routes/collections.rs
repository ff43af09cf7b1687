use axum::Json;
use axum::extract::State;
use porthole_query::document_to_json;

use crate::request::{
    CollectionNameRequest, CollectionOpResponse, CollectionStatsRequest, CollectionStatsResponse,
    ListCollectionsRequest, ListCollectionsResponse,
};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Json(req): Json<ListCollectionsRequest>,
) -> Json<ListCollectionsResponse> {
    Json(
        match state.docs.list_collections(req.database_name.as_deref()).await {
            Ok(collections) => ListCollectionsResponse {
                collections,
                error: None,
            },
            Err(e) => ListCollectionsResponse {
                collections: vec![],
                error: Some(e.to_string()),
            },
        },
    )
}

pub async fn stats(
    State(state): State<AppState>,
    Json(req): Json<CollectionStatsRequest>,
) -> Json<CollectionStatsResponse> {
    Json(
        match state
            .docs
            .stats(&req.collection_name, req.database_name.as_deref())
            .await
        {
            Ok(stats) => CollectionStatsResponse {
                stats: Some(document_to_json(&stats)),
                error: None,
            },
            Err(e) => CollectionStatsResponse {
                stats: None,
                error: Some(e.to_string()),
            },
        },
    )
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CollectionNameRequest>,
) -> Json<CollectionOpResponse> {
    Json(
        match state
            .docs
            .create_collection(&req.name, req.database_name.as_deref())
            .await
        {
            Ok(()) => CollectionOpResponse {
                success: true,
                error: None,
            },
            Err(e) => CollectionOpResponse {
                success: false,
                error: Some(e.to_string()),
            },
        },
    )
}

pub async fn drop(
    State(state): State<AppState>,
    Json(req): Json<CollectionNameRequest>,
) -> Json<CollectionOpResponse> {
    Json(
        match state
            .docs
            .drop_collection(&req.name, req.database_name.as_deref())
            .await
        {
            Ok(()) => CollectionOpResponse {
                success: true,
                error: None,
            },
            Err(e) => CollectionOpResponse {
                success: false,
                error: Some(e.to_string()),
            },
        },
    )
}
