#![cfg(feature = "mongo-tests")]

use std::sync::Arc;

use bson::oid::ObjectId;
use bson::{Bson, doc};
use porthole_db::{DbContext, DbError, Documents, Page, Selector};

const TEST_DB: &str = "porthole_test";

fn docs() -> Documents {
    let uri = std::env::var("PORTHOLE_TEST_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".into());
    Documents::new(Arc::new(DbContext::new(uri, TEST_DB)))
}

fn unique(name: &str) -> String {
    format!("{name}_{}", ObjectId::new().to_hex())
}

#[tokio::test]
async fn insert_find_round_trip() {
    let docs = docs();
    let coll = unique("users");

    let outcome = docs
        .insert(&coll, doc! { "name": "Bob", "age": 30 }, None)
        .await
        .unwrap();
    assert_eq!(outcome.id.len(), 24);
    assert!(outcome.id.bytes().all(|b| b.is_ascii_hexdigit()));

    let found = docs.find_by_id(&coll, &outcome.id, None).await.unwrap().unwrap();
    assert_eq!(found.get_str("name").unwrap(), "Bob");
    assert_eq!(found.get_i32("age").unwrap(), 30);
    let oid = ObjectId::parse_str(&outcome.id).unwrap();
    assert_eq!(found.get_object_id("_id").unwrap(), oid);

    docs.drop_collection(&coll, None).await.unwrap();
}

#[tokio::test]
async fn pagination_skip_before_limit() {
    let docs = docs();
    let coll = unique("items");

    for n in 0..25 {
        docs.insert(&coll, doc! { "n": n }, None).await.unwrap();
    }

    let page = Page {
        limit: Some(10),
        skip: Some(20),
    };
    let window = docs.find_many(&coll, doc! {}, page, None).await.unwrap();
    assert_eq!(window.len(), 5);

    let total = docs.count(&coll, doc! {}, None).await.unwrap();
    assert_eq!(total, 25);

    docs.drop_collection(&coll, None).await.unwrap();
}

#[tokio::test]
async fn find_by_id_absent_is_none() {
    let docs = docs();
    let coll = unique("users");

    let found = docs
        .find_by_id(&coll, "ffffffffffffffffffffffff", None)
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn find_by_id_rejects_bad_id() {
    let docs = docs();
    let err = docs
        .find_by_id("users", "not-an-id", None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidId(_)), "{err}");
}

#[tokio::test]
async fn delete_by_absent_id_returns_false() {
    let docs = docs();
    let coll = unique("users");

    let deleted = docs
        .delete_one(&coll, Selector::Id("ffffffffffffffffffffffff".into()), None)
        .await
        .unwrap();
    assert!(!deleted);
}

#[tokio::test]
async fn delete_all_empties_collection() {
    let docs = docs();
    let coll = unique("items");

    for n in 0..4 {
        docs.insert(&coll, doc! { "n": n }, None).await.unwrap();
    }

    let outcome = docs.delete_all(&coll, doc! {}, None).await.unwrap();
    assert_eq!(outcome.deleted, 4);
    assert_eq!(docs.count(&coll, doc! {}, None).await.unwrap(), 0);

    docs.drop_collection(&coll, None).await.unwrap();
}

#[tokio::test]
async fn plain_update_sets_without_replacing() {
    let docs = docs();
    let coll = unique("users");

    let id = docs
        .insert(&coll, doc! { "name": "Alice", "age": 30 }, None)
        .await
        .unwrap()
        .id;

    let outcome = docs
        .update(&coll, Selector::Id(id.clone()), doc! { "name": "Bob" }, None)
        .await
        .unwrap();
    assert_eq!(outcome.matched, 1);
    assert_eq!(outcome.modified, 1);

    // Wrapped in $set, so untouched fields survive.
    let found = docs.find_by_id(&coll, &id, None).await.unwrap().unwrap();
    assert_eq!(found.get_str("name").unwrap(), "Bob");
    assert_eq!(found.get_i32("age").unwrap(), 30);

    docs.drop_collection(&coll, None).await.unwrap();
}

#[tokio::test]
async fn operator_update_passes_through() {
    let docs = docs();
    let coll = unique("users");

    let id = docs
        .insert(&coll, doc! { "visits": 1 }, None)
        .await
        .unwrap()
        .id;

    docs.update(
        &coll,
        Selector::Id(id.clone()),
        doc! { "$inc": { "visits": 2 } },
        None,
    )
    .await
    .unwrap();

    let found = docs.find_by_id(&coll, &id, None).await.unwrap().unwrap();
    assert_eq!(found.get_i32("visits").unwrap(), 3);

    docs.drop_collection(&coll, None).await.unwrap();
}

#[tokio::test]
async fn update_against_absent_id_reports_zero_matched() {
    let docs = docs();
    let coll = unique("users");

    let outcome = docs
        .update(
            &coll,
            Selector::Id("ffffffffffffffffffffffff".into()),
            doc! { "name": "Nobody" },
            None,
        )
        .await
        .unwrap();
    assert_eq!(outcome.matched, 0);
    assert_eq!(outcome.modified, 0);
}

#[tokio::test]
async fn raw_query_matches_native_date_filter() {
    let docs = docs();
    let coll = unique("events");

    let before = bson::DateTime::parse_rfc3339_str("2023-05-01T00:00:00Z").unwrap();
    let after = bson::DateTime::parse_rfc3339_str("2023-05-03T00:00:00Z").unwrap();
    docs.insert(&coll, doc! { "createdAt": before }, None).await.unwrap();
    docs.insert(&coll, doc! { "createdAt": after }, None).await.unwrap();

    let via_text = docs
        .execute_query(
            &coll,
            r#"{"createdAt": {"$gte": {"$date": "2023-05-02T00:00:00.000Z"}}}"#,
            None,
        )
        .await
        .unwrap();

    let cutoff = bson::DateTime::parse_rfc3339_str("2023-05-02T00:00:00Z").unwrap();
    let via_filter = docs
        .find_many(
            &coll,
            doc! { "createdAt": { "$gte": cutoff } },
            Page::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(via_text, via_filter);
    assert_eq!(via_text.len(), 1);

    docs.drop_collection(&coll, None).await.unwrap();
}

#[tokio::test]
async fn raw_query_id_strings_coerce() {
    let docs = docs();
    let coll = unique("users");

    let id = docs.insert(&coll, doc! { "name": "Bob" }, None).await.unwrap().id;

    let results = docs
        .execute_query(&coll, &format!(r#"{{"_id": "{id}"}}"#), None)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get_str("name").unwrap(), "Bob");

    docs.drop_collection(&coll, None).await.unwrap();
}

#[tokio::test]
async fn malformed_query_text_is_a_format_error() {
    let docs = docs();
    let err = docs.execute_query("users", "{not json", None).await.unwrap_err();
    match err {
        DbError::InvalidQuery(msg) => assert!(!msg.is_empty()),
        other => panic!("expected InvalidQuery, got {other}"),
    }
}

#[tokio::test]
async fn engine_rejection_is_a_query_failure() {
    let docs = docs();
    let coll = unique("users");

    // Well-formed JSON, unknown operator: rejected by the server, not the parser.
    let err = docs
        .execute_query(&coll, r#"{"age": {"$notanoperator": 1}}"#, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::QueryFailed(_)), "{err}");
}

#[tokio::test]
async fn duplicate_copies_under_fresh_id() {
    let docs = docs();
    let coll = unique("users");

    let id = docs
        .insert(&coll, doc! { "name": "Bob", "age": 30 }, None)
        .await
        .unwrap()
        .id;

    let copy = docs.duplicate(&coll, &id, None).await.unwrap().unwrap();
    assert_ne!(copy.id, id);

    let copied = docs.find_by_id(&coll, &copy.id, None).await.unwrap().unwrap();
    assert_eq!(copied.get_str("name").unwrap(), "Bob");
    assert_eq!(copied.get_i32("age").unwrap(), 30);
    assert_eq!(docs.count(&coll, doc! {}, None).await.unwrap(), 2);

    docs.drop_collection(&coll, None).await.unwrap();
}

#[tokio::test]
async fn duplicate_of_absent_id_is_none() {
    let docs = docs();
    let copy = docs
        .duplicate("users", "ffffffffffffffffffffffff", None)
        .await
        .unwrap();
    assert!(copy.is_none());
}

#[tokio::test]
async fn explicit_target_does_not_disturb_ambient() {
    let docs = docs();
    let coll = unique("scoped");
    let other_db = "porthole_test_other";

    docs.insert(&coll, doc! { "n": 1 }, Some(other_db)).await.unwrap();

    // Ambient target still the default database, where the collection is empty.
    assert_eq!(docs.context().current_target(), TEST_DB);
    assert_eq!(docs.count(&coll, doc! {}, None).await.unwrap(), 0);
    assert_eq!(docs.count(&coll, doc! {}, Some(other_db)).await.unwrap(), 1);

    docs.drop_collection(&coll, Some(other_db)).await.unwrap();
}

#[tokio::test]
async fn use_database_switches_ambient_target() {
    let docs = docs();
    let coll = unique("ambient");
    let other_db = "porthole_test_switch";

    docs.insert(&coll, doc! { "n": 1 }, Some(other_db)).await.unwrap();
    assert_eq!(docs.context().current_target(), TEST_DB);

    // Switching the ambient target redirects subsequent implicit-target calls.
    docs.context().use_database(Some(other_db)).await.unwrap();
    assert_eq!(docs.context().current_target(), other_db);
    assert_eq!(docs.count(&coll, doc! {}, None).await.unwrap(), 1);

    // Repeating the same name leaves the target as-is.
    docs.context().use_database(Some(other_db)).await.unwrap();
    assert_eq!(docs.context().current_target(), other_db);

    // An omitted name falls back to the configured default, where the
    // collection does not exist.
    docs.context().use_database(None).await.unwrap();
    assert_eq!(docs.context().current_target(), TEST_DB);
    assert_eq!(docs.count(&coll, doc! {}, None).await.unwrap(), 0);

    docs.drop_collection(&coll, Some(other_db)).await.unwrap();
}

#[tokio::test]
async fn stats_reports_document_count() {
    let docs = docs();
    let coll = unique("items");

    docs.insert(&coll, doc! { "n": 1 }, None).await.unwrap();

    let stats = docs.stats(&coll, None).await.unwrap();
    let count = match stats.get("count") {
        Some(Bson::Int32(n)) => i64::from(*n),
        Some(Bson::Int64(n)) => *n,
        Some(Bson::Double(n)) => *n as i64,
        other => panic!("unexpected count: {other:?}"),
    };
    assert_eq!(count, 1);

    docs.drop_collection(&coll, None).await.unwrap();
}

#[tokio::test]
async fn create_and_list_collections() {
    let docs = docs();
    let coll = unique("fresh");

    docs.create_collection(&coll, None).await.unwrap();
    let names = docs.list_collections(None).await.unwrap();
    assert!(names.contains(&coll));

    docs.drop_collection(&coll, None).await.unwrap();
    let names = docs.list_collections(None).await.unwrap();
    assert!(!names.contains(&coll));
}
