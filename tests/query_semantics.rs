//! Read-path invariant tests
//!
//! Categories:
//! 1. Subset property: results satisfy the filter, count matches
//! 2. Window stability: identical queries return identical slices
//! 3. Ordering before windowing before projection
//! 4. Strict vs lenient single-row lookups
//! 5. Compile-time rejection of malformed queries

use serde_json::json;

use plinth::{
    Client, ClientOptions, EntityMeta, QueryError, QuerySpec, Record, SortSpec, UniqueKey,
};

async fn seeded_client() -> Client<plinth::MemoryBackend> {
    let client = Client::in_memory(EntityMeta::users(), ClientOptions::default());
    for (name, email, age) in [
        ("aaa", "aaa@xx.com", Some(1)),
        ("bbb", "bbb@xx.com", Some(5)),
        ("ccc", "ccc@xx.com", Some(3)),
        ("ddd", "ddd@xx.com", None),
        ("eee", "eee@yy.org", Some(7)),
    ] {
        let mut data = json!({"name": name, "email": email});
        if let Some(age) = age {
            data["age"] = json!(age);
        }
        client.create(data, None).await.unwrap();
    }
    client
}

// =============================================================================
// SUBSET PROPERTY
// =============================================================================

#[tokio::test]
async fn test_find_many_results_satisfy_the_filter() {
    let client = seeded_client().await;

    let spec = QuerySpec::new().with_filter(json!({"email": {"contains": "xx"}}));
    let records: Vec<Record> = client.find_many(&spec).await.unwrap().collect();

    assert_eq!(records.len(), 4);
    for record in &records {
        assert!(record.email.as_deref().unwrap().contains("xx"));
    }
}

#[tokio::test]
async fn test_count_without_window_equals_subset_size() {
    let client = seeded_client().await;

    let spec = QuerySpec::new().with_filter(json!({"email": {"contains": "xx"}}));
    let records: Vec<Record> = client.find_many(&spec).await.unwrap().collect();
    let count = client.count(&spec).await.unwrap();

    assert_eq!(count, records.len() as u64);
}

#[tokio::test]
async fn test_count_honors_the_window() {
    let client = seeded_client().await;

    let spec = QuerySpec::new()
        .with_filter(json!({"email": {"contains": "xx"}}))
        .with_order(SortSpec::desc("name"))
        .with_skip(2)
        .with_take(3);

    // 4 matching rows, skip 2, take 3 -> 2 remain
    assert_eq!(client.count(&spec).await.unwrap(), 2);
}

#[tokio::test]
async fn test_conjunction_narrows_results() {
    let client = seeded_client().await;

    let spec = QuerySpec::new()
        .with_filter(json!({"email": {"contains": "xx"}, "age": {"gt": 2}}));
    let records: Vec<Record> = client.find_many(&spec).await.unwrap().collect();

    // bbb (5) and ccc (3); ddd has null age and never matches
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_ends_with_matches_suffix_only() {
    let client = seeded_client().await;

    let spec = QuerySpec::new().with_filter(json!({"email": {"endsWith": ".org"}}));
    let records: Vec<Record> = client.find_many(&spec).await.unwrap().collect();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].email.as_deref(), Some("eee@yy.org"));
}

// =============================================================================
// WINDOW STABILITY
// =============================================================================

#[tokio::test]
async fn test_identical_queries_return_identical_slices() {
    let client = seeded_client().await;

    let spec = QuerySpec::new()
        .with_filter(json!({"email": {"contains": "xx"}}))
        .with_order(SortSpec::desc("name"))
        .with_skip(1)
        .with_take(2);

    let first: Vec<Record> = client.find_many(&spec).await.unwrap().collect();
    let second: Vec<Record> = client.find_many(&spec).await.unwrap().collect();
    let third: Vec<Record> = client.find_many(&spec).await.unwrap().collect();

    assert_eq!(first, second);
    assert_eq!(second, third);
    // Ordered desc by name: ddd, ccc, bbb, aaa; skip 1 take 2
    let names: Vec<_> = first.iter().map(|r| r.name.clone().unwrap()).collect();
    assert_eq!(names, vec!["ccc".to_string(), "bbb".to_string()]);
}

#[tokio::test]
async fn test_skip_defaults_to_zero_and_take_to_unbounded() {
    let client = seeded_client().await;

    let all: Vec<Record> = client
        .find_many(&QuerySpec::new())
        .await
        .unwrap()
        .collect();
    assert_eq!(all.len(), 5);
}

#[tokio::test]
async fn test_skip_past_the_end_yields_empty() {
    let client = seeded_client().await;

    let spec = QuerySpec::new().with_skip(100);
    let records: Vec<Record> = client.find_many(&spec).await.unwrap().collect();
    assert!(records.is_empty());
}

// =============================================================================
// ORDERING / WINDOW / PROJECTION ORDER
// =============================================================================

#[tokio::test]
async fn test_ordering_by_unselected_field_still_applies() {
    let client = seeded_client().await;

    // Order by name (not selected), project down to email
    let spec = QuerySpec::new()
        .with_filter(json!({"email": {"contains": "xx"}}))
        .with_select(["email"])
        .with_order(SortSpec::desc("name"))
        .with_skip(2)
        .with_take(3);

    let records: Vec<Record> = client.find_many(&spec).await.unwrap().collect();
    let emails: Vec<_> = records.iter().map(|r| r.email.clone().unwrap()).collect();

    // desc by name: ddd, ccc, bbb, aaa; skip 2 -> bbb, aaa
    assert_eq!(
        emails,
        vec!["bbb@xx.com".to_string(), "aaa@xx.com".to_string()]
    );
    // Projection trimmed the ordering field
    for record in &records {
        assert_eq!(record.name, None);
    }
}

#[tokio::test]
async fn test_projection_keeps_the_primary_key() {
    let client = seeded_client().await;

    let spec = QuerySpec::new().with_select(["email"]).with_take(1);
    let record = client.find_first(&spec).await.unwrap().unwrap();
    assert!(record.id > 0);
    assert!(record.email.is_some());
    assert_eq!(record.name, None);
    assert_eq!(record.age, None);
}

#[tokio::test]
async fn test_find_first_is_find_many_take_one() {
    let client = seeded_client().await;

    let spec = QuerySpec::new()
        .with_filter(json!({"email": {"contains": "xx"}}))
        .with_order(SortSpec::desc("name"))
        .with_skip(2);

    let first = client.find_first(&spec).await.unwrap().unwrap();
    let many: Vec<Record> = client
        .find_many(&spec.clone().with_take(1))
        .await
        .unwrap()
        .collect();

    assert_eq!(many, vec![first]);
}

#[tokio::test]
async fn test_find_first_on_no_match_is_none() {
    let client = seeded_client().await;

    let spec = QuerySpec::new().with_filter(json!({"email": {"contains": "zz"}}));
    assert_eq!(client.find_first(&spec).await.unwrap(), None);
}

// =============================================================================
// STRICT VS LENIENT LOOKUPS
// =============================================================================

#[tokio::test]
async fn test_find_unique_on_missing_key_is_none_not_error() {
    let client = seeded_client().await;

    let found = client.find_unique(&UniqueKey::id(-1)).await.unwrap();
    assert_eq!(found, None);
}

#[tokio::test]
async fn test_find_unique_or_throw_on_missing_key_errors() {
    let client = seeded_client().await;

    let err = client
        .find_unique_or_throw(&UniqueKey::id(-1))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::NotFound { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_find_unique_works_on_conventionally_unique_email() {
    let client = seeded_client().await;

    let record = client
        .find_unique(&UniqueKey::email("bbb@xx.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.name.as_deref(), Some("bbb"));
}

// =============================================================================
// COMPILE-TIME REJECTION
// =============================================================================

#[tokio::test]
async fn test_unknown_filter_field_is_invalid_filter() {
    let client = seeded_client().await;

    let spec = QuerySpec::new().with_filter(json!({"nickname": "kk"}));
    let err = client.find_many(&spec).await.unwrap_err();
    assert!(matches!(err, QueryError::InvalidFilter(_)));
}

#[tokio::test]
async fn test_unknown_operator_is_invalid_filter() {
    let client = seeded_client().await;

    let spec = QuerySpec::new().with_filter(json!({"email": {"startsWith": "a"}}));
    let err = client.find_many(&spec).await.unwrap_err();
    assert!(matches!(err, QueryError::InvalidFilter(_)));
}

#[tokio::test]
async fn test_unknown_projection_field_is_invalid_query() {
    let client = seeded_client().await;

    let spec = QuerySpec::new().with_select(["id", "nickname"]);
    let err = client.find_many(&spec).await.unwrap_err();
    assert!(matches!(err, QueryError::InvalidQuery(_)));
}

#[tokio::test]
async fn test_rejected_queries_touch_no_state() {
    let client = seeded_client().await;

    let spec = QuerySpec::new().with_filter(json!({"nope": 1}));
    let _ = client.find_many(&spec).await;

    // Table unchanged and still queryable
    assert_eq!(client.count(&QuerySpec::new()).await.unwrap(), 5);
}
