use std::sync::Arc;

use bson::{Document, doc};
use futures::TryStreamExt;
use mongodb::Collection;
use porthole_query::{normalize_document, normalize_update, parse_query, to_object_id};

use crate::context::DbContext;
use crate::error::DbError;
use crate::result::{DeleteOutcome, InsertOutcome, UpdateOutcome};

/// Pagination window for [`Documents::find_many`]. Skip applies before
/// limit. No upper bound is enforced here; callers own sane defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Page {
    pub limit: Option<i64>,
    pub skip: Option<u64>,
}

/// Selects documents either by a textual/native id or by a filter.
#[derive(Debug, Clone)]
pub enum Selector {
    Id(String),
    Filter(Document),
}

impl Selector {
    /// Coerce to a normalized filter document. An id becomes
    /// `{_id: <native id>}`; fails with `InvalidId` if not coercible.
    fn into_filter(self) -> Result<Document, DbError> {
        match self {
            Selector::Id(id) => Ok(doc! { "_id": to_object_id(&id)? }),
            Selector::Filter(filter) => Ok(normalize_document(filter)),
        }
    }
}

/// Generic, collection-name-parameterized document operations.
///
/// Every operation takes an optional explicit target-database name; when
/// present, a scoped handle is derived directly from it rather than going
/// through the ambient current target, so concurrent callers against
/// different databases do not interfere. Filters and update specifications
/// are run through the normalizer before every storage call. Each mutating
/// operation is a single storage-engine call; atomicity is whatever the
/// engine guarantees for that call.
pub struct Documents {
    ctx: Arc<DbContext>,
}

impl Documents {
    pub fn new(ctx: Arc<DbContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &DbContext {
        &self.ctx
    }

    async fn collection(
        &self,
        name: &str,
        db: Option<&str>,
    ) -> Result<Collection<Document>, DbError> {
        Ok(self.ctx.database_for(db).await?.collection(name))
    }

    // ── Query operations ────────────────────────────────────────

    /// Documents matching `filter` in storage-native order, bounded by the
    /// page window.
    pub async fn find_many(
        &self,
        collection: &str,
        filter: Document,
        page: Page,
        db: Option<&str>,
    ) -> Result<Vec<Document>, DbError> {
        let coll = self.collection(collection, db).await?;
        let mut find = coll.find(normalize_document(filter));
        if let Some(skip) = page.skip {
            find = find.skip(skip);
        }
        if let Some(limit) = page.limit {
            find = find.limit(limit);
        }
        Ok(find.await?.try_collect().await?)
    }

    /// First document matching `filter`, if any.
    pub async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        db: Option<&str>,
    ) -> Result<Option<Document>, DbError> {
        let coll = self.collection(collection, db).await?;
        Ok(coll.find_one(normalize_document(filter)).await?)
    }

    /// Document with the given id, if any. Absence is a `None`, not an
    /// error; a non-coercible id fails with `InvalidId`.
    pub async fn find_by_id(
        &self,
        collection: &str,
        id: &str,
        db: Option<&str>,
    ) -> Result<Option<Document>, DbError> {
        let oid = to_object_id(id)?;
        self.find_one(collection, doc! { "_id": oid }, db).await
    }

    pub async fn count(
        &self,
        collection: &str,
        filter: Document,
        db: Option<&str>,
    ) -> Result<u64, DbError> {
        let coll = self.collection(collection, db).await?;
        Ok(coll.count_documents(normalize_document(filter)).await?)
    }

    /// Run raw query text: parse and normalize it (`InvalidQuery` on
    /// malformed input), then execute with full-scan semantics. Engine
    /// rejection of a well-formed query surfaces as `QueryFailed`,
    /// distinct from the parse error.
    pub async fn execute_query(
        &self,
        collection: &str,
        query_text: &str,
        db: Option<&str>,
    ) -> Result<Vec<Document>, DbError> {
        let filter = parse_query(query_text)?;
        tracing::debug!(collection, "executing raw query");
        let coll = self.collection(collection, db).await?;
        let cursor = coll
            .find(filter)
            .await
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;
        cursor
            .try_collect()
            .await
            .map_err(|e| DbError::QueryFailed(e.to_string()))
    }

    // ── Mutations ───────────────────────────────────────────────

    /// Insert a document, letting storage assign a fresh `_id` (any id in
    /// the input is stripped). Returns the new id in textual form.
    pub async fn insert(
        &self,
        collection: &str,
        mut document: Document,
        db: Option<&str>,
    ) -> Result<InsertOutcome, DbError> {
        let coll = self.collection(collection, db).await?;
        document.remove("_id");
        let result = coll.insert_one(normalize_document(document)).await?;
        match result.inserted_id.as_object_id() {
            Some(oid) => Ok(InsertOutcome { id: oid.to_hex() }),
            None => Err(DbError::NotAcknowledged("insert".into())),
        }
    }

    /// Update the first document the selector matches. The update
    /// specification is wrapped in `$set` iff it carries no operator keys.
    pub async fn update(
        &self,
        collection: &str,
        selector: Selector,
        update: Document,
        db: Option<&str>,
    ) -> Result<UpdateOutcome, DbError> {
        let coll = self.collection(collection, db).await?;
        let filter = selector.into_filter()?;
        let result = coll.update_one(filter, normalize_update(update)).await?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    /// Delete the first document the selector matches. `false` when nothing
    /// matched — absence is an expected case, not an error.
    pub async fn delete_one(
        &self,
        collection: &str,
        selector: Selector,
        db: Option<&str>,
    ) -> Result<bool, DbError> {
        let coll = self.collection(collection, db).await?;
        let result = coll.delete_one(selector.into_filter()?).await?;
        Ok(result.deleted_count > 0)
    }

    /// Delete every document matching `filter`; an empty filter clears the
    /// whole collection.
    pub async fn delete_all(
        &self,
        collection: &str,
        filter: Document,
        db: Option<&str>,
    ) -> Result<DeleteOutcome, DbError> {
        let coll = self.collection(collection, db).await?;
        let result = coll.delete_many(normalize_document(filter)).await?;
        Ok(DeleteOutcome {
            deleted: result.deleted_count,
        })
    }

    /// Copy the document with the given id under a fresh id. `None` when
    /// the source does not exist.
    pub async fn duplicate(
        &self,
        collection: &str,
        id: &str,
        db: Option<&str>,
    ) -> Result<Option<InsertOutcome>, DbError> {
        match self.find_by_id(collection, id, db).await? {
            Some(mut document) => {
                document.remove("_id");
                Ok(Some(self.insert(collection, document, db).await?))
            }
            None => Ok(None),
        }
    }

    // ── Administrative passthroughs ─────────────────────────────

    /// Storage-engine-native statistics for a collection.
    pub async fn stats(&self, collection: &str, db: Option<&str>) -> Result<Document, DbError> {
        let database = self.ctx.database_for(db).await?;
        Ok(database.run_command(doc! { "collStats": collection }).await?)
    }

    pub async fn create_collection(&self, name: &str, db: Option<&str>) -> Result<(), DbError> {
        let database = self.ctx.database_for(db).await?;
        Ok(database.create_collection(name).await?)
    }

    pub async fn drop_collection(&self, name: &str, db: Option<&str>) -> Result<(), DbError> {
        let database = self.ctx.database_for(db).await?;
        Ok(database.collection::<Document>(name).drop().await?)
    }

    pub async fn list_databases(&self) -> Result<Vec<String>, DbError> {
        Ok(self.ctx.client().await?.list_database_names().await?)
    }

    pub async fn list_collections(&self, db: Option<&str>) -> Result<Vec<String>, DbError> {
        let database = self.ctx.database_for(db).await?;
        Ok(database.list_collection_names().await?)
    }
}
