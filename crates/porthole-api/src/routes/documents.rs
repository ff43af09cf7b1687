use axum::Json;
use axum::extract::State;
use bson::{Bson, Document};
use porthole_db::{Page, Selector};
use porthole_query::{document_to_json, json_to_bson};

use crate::request::{
    ListDocumentsRequest, ListDocumentsResponse, ModifyDocumentRequest, ModifyDocumentResponse,
    Pagination,
};
use crate::state::AppState;

/// Page size applied when the client does not ask for one.
const DEFAULT_LIMIT: i64 = 100;

pub async fn list(
    State(state): State<AppState>,
    Json(req): Json<ListDocumentsRequest>,
) -> Json<ListDocumentsResponse> {
    Json(match list_inner(&state, req).await {
        Ok(resp) => resp,
        Err(error) => ListDocumentsResponse {
            error: Some(error),
            ..Default::default()
        },
    })
}

async fn list_inner(
    state: &AppState,
    req: ListDocumentsRequest,
) -> Result<ListDocumentsResponse, String> {
    let db = req.database_name.as_deref();

    // A document id means a single-document fetch; absence comes back as a
    // missing `document`, not as an error.
    if let Some(id) = &req.document_id {
        let document = state
            .docs
            .find_by_id(&req.collection_name, id, db)
            .await
            .map_err(|e| e.to_string())?;
        return Ok(ListDocumentsResponse {
            document: document.as_ref().map(document_to_json),
            ..Default::default()
        });
    }

    let filter = parse_filter(req.filter)?;
    let limit = effective_limit(req.limit);
    let skip = req.skip.unwrap_or(0);

    let total = state
        .docs
        .count(&req.collection_name, filter.clone(), db)
        .await
        .map_err(|e| e.to_string())?;
    let documents = state
        .docs
        .find_many(
            &req.collection_name,
            filter,
            Page {
                limit: Some(limit),
                skip: Some(skip),
            },
            db,
        )
        .await
        .map_err(|e| e.to_string())?;

    Ok(ListDocumentsResponse {
        documents: Some(documents.iter().map(document_to_json).collect()),
        pagination: Some(Pagination { total, limit, skip }),
        ..Default::default()
    })
}

pub async fn modify(
    State(state): State<AppState>,
    Json(req): Json<ModifyDocumentRequest>,
) -> Json<ModifyDocumentResponse> {
    Json(match modify_inner(&state, req).await {
        Ok(resp) => resp,
        Err(error) => ModifyDocumentResponse {
            success: false,
            error: Some(error),
            ..Default::default()
        },
    })
}

async fn modify_inner(
    state: &AppState,
    req: ModifyDocumentRequest,
) -> Result<ModifyDocumentResponse, String> {
    let db = req.database_name.as_deref();
    let mut document = match json_to_bson(req.document) {
        Bson::Document(doc) => doc,
        _ => return Err("document must be a JSON object".into()),
    };
    let action = classify(req.document_id.as_deref(), &mut document)?;

    let outcome = match action {
        Action::DeleteAll => {
            let deleted = state
                .docs
                .delete_all(&req.collection_name, Document::new(), db)
                .await
                .map_err(|e| e.to_string())?;
            ModifyDocumentResponse {
                success: true,
                deleted_count: Some(deleted.deleted),
                ..Default::default()
            }
        }
        Action::DeleteOne(id) => {
            let deleted = state
                .docs
                .delete_one(&req.collection_name, Selector::Id(id), db)
                .await
                .map_err(|e| e.to_string())?;
            ModifyDocumentResponse {
                success: deleted,
                deleted_count: Some(u64::from(deleted)),
                ..Default::default()
            }
        }
        Action::Duplicate(id) => match state
            .docs
            .duplicate(&req.collection_name, &id, db)
            .await
            .map_err(|e| e.to_string())?
        {
            Some(inserted) => ModifyDocumentResponse {
                success: true,
                inserted_id: Some(inserted.id),
                ..Default::default()
            },
            None => ModifyDocumentResponse {
                success: false,
                error: Some(format!("document not found: {id}")),
                ..Default::default()
            },
        },
        Action::Update(id) => {
            if is_empty_update(&document) {
                return Err("update document has no fields to apply".into());
            }
            let updated = state
                .docs
                .update(&req.collection_name, Selector::Id(id), document, db)
                .await
                .map_err(|e| e.to_string())?;
            ModifyDocumentResponse {
                success: true,
                matched_count: Some(updated.matched),
                ..Default::default()
            }
        }
        Action::Insert => {
            let inserted = state
                .docs
                .insert(&req.collection_name, document, db)
                .await
                .map_err(|e| e.to_string())?;
            ModifyDocumentResponse {
                success: true,
                inserted_id: Some(inserted.id),
                ..Default::default()
            }
        }
    };

    Ok(outcome)
}

enum Action {
    DeleteAll,
    DeleteOne(String),
    Duplicate(String),
    Update(String),
    Insert,
}

/// Resolve the sentinel flags in a modify payload into one action. The
/// sentinel keys are reserved and removed from the document either way.
fn classify(document_id: Option<&str>, document: &mut Document) -> Result<Action, String> {
    let delete_all = take_flag(document, "_deleteAll");
    let delete = take_flag(document, "_delete");
    let duplicate = take_flag(document, "_duplicate");

    if delete_all {
        return Ok(Action::DeleteAll);
    }
    if delete {
        return match document_id {
            Some(id) => Ok(Action::DeleteOne(id.to_string())),
            None => Err("_delete requires a documentId".into()),
        };
    }
    if duplicate {
        return match document_id {
            Some(id) => Ok(Action::Duplicate(id.to_string())),
            None => Err("_duplicate requires a documentId".into()),
        };
    }
    Ok(match document_id {
        Some(id) => Action::Update(id.to_string()),
        None => Action::Insert,
    })
}

fn take_flag(document: &mut Document, key: &str) -> bool {
    document.remove(key).is_some_and(|v| v.as_bool() == Some(true))
}

/// An update that sets nothing (empty, or `_id` only since `_id` is
/// immutable) would reach storage as an empty `$set`, which the engine
/// rejects with a raw server error. Catch it here with a clear message.
fn is_empty_update(document: &Document) -> bool {
    document.keys().all(|k| k == "_id")
}

/// A negative limit carries single-batch semantics at the driver level;
/// clamp so client input cannot select that mode.
fn effective_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).max(0)
}

fn parse_filter(filter: Option<serde_json::Value>) -> Result<Document, String> {
    match filter {
        Some(value) => match json_to_bson(value) {
            Bson::Document(doc) => Ok(doc),
            _ => Err("filter must be a JSON object".into()),
        },
        None => Ok(Document::new()),
    }
}
