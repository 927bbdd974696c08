//! Aggregation and grouping invariant tests
//!
//! Categories:
//! 1. Scalar aggregates over matching rows
//! 2. Empty-set semantics: null aggregates, zero count
//! 3. Group-by partitioning and per-group aggregates
//! 4. Having filters over computed aggregates, boundary exclusivity

use serde_json::{json, Value};

use plinth::{AggregateSpec, Client, ClientOptions, EntityMeta, MemoryBackend, QueryError};

fn client() -> Client<MemoryBackend> {
    Client::in_memory(EntityMeta::users(), ClientOptions::default())
}

async fn seeded_client() -> Client<MemoryBackend> {
    let client = client();
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
// SCALAR AGGREGATES
// =============================================================================

#[tokio::test]
async fn test_aggregate_over_matching_rows() {
    let client = seeded_client().await;

    let spec = AggregateSpec::new()
        .with_filter(json!({"email": {"contains": "xx"}}))
        .with_count()
        .with_min("age")
        .with_max("age")
        .with_avg("age");

    let result = client.aggregate(&spec).await.unwrap();

    // Count counts rows; min/max/avg skip the null age
    assert_eq!(result.count, Some(4));
    assert_eq!(result.min["age"], json!(1));
    assert_eq!(result.max["age"], json!(5));
    assert_eq!(result.avg["age"], json!(3.0));
}

#[tokio::test]
async fn test_aggregate_sum() {
    let client = seeded_client().await;

    let spec = AggregateSpec::new().with_sum("age");
    let result = client.aggregate(&spec).await.unwrap();
    assert_eq!(result.sum["age"], json!(16));
}

#[tokio::test]
async fn test_unrequested_aggregates_are_absent() {
    let client = seeded_client().await;

    let spec = AggregateSpec::new().with_min("age");
    let result = client.aggregate(&spec).await.unwrap();
    assert_eq!(result.count, None);
    assert!(result.max.is_empty());
    assert!(result.avg.is_empty());
    assert!(result.sum.is_empty());
}

// =============================================================================
// EMPTY-SET SEMANTICS
// =============================================================================

#[tokio::test]
async fn test_aggregates_over_no_rows_yield_null_and_zero_count() {
    let client = seeded_client().await;

    let spec = AggregateSpec::new()
        .with_filter(json!({"email": {"contains": "nope"}}))
        .with_count()
        .with_min("age")
        .with_max("age")
        .with_avg("age")
        .with_sum("age");

    let result = client.aggregate(&spec).await.unwrap();
    assert_eq!(result.count, Some(0));
    assert_eq!(result.min["age"], Value::Null);
    assert_eq!(result.max["age"], Value::Null);
    assert_eq!(result.avg["age"], Value::Null);
    assert_eq!(result.sum["age"], Value::Null);
}

#[tokio::test]
async fn test_aggregate_of_non_numeric_field_is_rejected() {
    let client = seeded_client().await;

    let spec = AggregateSpec::new().with_avg("email");
    let err = client.aggregate(&spec).await.unwrap_err();
    assert!(matches!(err, QueryError::InvalidQuery(_)));
}

// =============================================================================
// GROUP-BY
// =============================================================================

async fn grouped_client() -> Client<MemoryBackend> {
    // Two rows share an email to form a two-row group
    let client = client();
    for (name, email, age) in [("a1", "a@xx.com", 3), ("b1", "b@xx.com", 5), ("b2", "b@xx.com", 1)]
    {
        client
            .backend()
            .seed([json!({"name": name, "email": email, "age": age})])
            .await
            .unwrap();
    }
    client
}

#[tokio::test]
async fn test_group_by_partitions_by_key_tuple() {
    let client = grouped_client().await;

    let spec = AggregateSpec::new()
        .with_group_by(["email"])
        .with_count()
        .with_sum("age");

    let groups = client.group_by(&spec).await.unwrap();
    assert_eq!(groups.len(), 2);

    let a = groups
        .iter()
        .find(|g| g.key["email"] == json!("a@xx.com"))
        .unwrap();
    assert_eq!(a.aggregates.count, Some(1));
    assert_eq!(a.aggregates.sum["age"], json!(3));

    let b = groups
        .iter()
        .find(|g| g.key["email"] == json!("b@xx.com"))
        .unwrap();
    assert_eq!(b.aggregates.count, Some(2));
    assert_eq!(b.aggregates.sum["age"], json!(6));
}

#[tokio::test]
async fn test_group_by_requires_grouping_keys() {
    let client = grouped_client().await;

    let spec = AggregateSpec::new().with_count();
    let err = client.group_by(&spec).await.unwrap_err();
    assert!(matches!(err, QueryError::InvalidQuery(_)));
}

#[tokio::test]
async fn test_groups_with_no_rows_are_never_emitted() {
    let client = grouped_client().await;

    let spec = AggregateSpec::new()
        .with_filter(json!({"age": {"gt": 100}}))
        .with_group_by(["email"])
        .with_count();

    let groups = client.group_by(&spec).await.unwrap();
    assert!(groups.is_empty());
}

// =============================================================================
// HAVING
// =============================================================================

#[tokio::test]
async fn test_having_filters_over_computed_aggregates() {
    let client = grouped_client().await;

    // avg(age): a -> 3, b -> (5+1)/2 = 3; both strictly exceed 2.
    // The averaged aggregate is not part of the requested output.
    let spec = AggregateSpec::new()
        .with_group_by(["email"])
        .with_count()
        .with_sum("age")
        .with_having(json!({"age": {"_avg": {"gt": 2}}}));

    let groups = client.group_by(&spec).await.unwrap();
    assert_eq!(groups.len(), 2);
    for group in &groups {
        assert!(group.aggregates.avg.is_empty());
    }
}

#[tokio::test]
async fn test_having_boundary_is_strictly_exclusive() {
    let client = client();
    client
        .backend()
        .seed([
            json!({"name": "a1", "email": "a@xx.com", "age": 2}),
            json!({"name": "b1", "email": "b@xx.com", "age": 3}),
        ])
        .await
        .unwrap();

    // Group a has avg(age) exactly 2: strictly-greater-than excludes it
    let spec = AggregateSpec::new()
        .with_group_by(["email"])
        .with_count()
        .with_sum("age")
        .with_having(json!({"age": {"_avg": {"gt": 2}}}));

    let groups = client.group_by(&spec).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key["email"], json!("b@xx.com"));
    assert_eq!(groups[0].aggregates.sum["age"], json!(3));
}

#[tokio::test]
async fn test_having_rejects_groups_below_the_bound() {
    let client = grouped_client().await;

    let spec = AggregateSpec::new()
        .with_group_by(["email"])
        .with_count()
        .with_having(json!({"age": {"_avg": {"gt": 4}}}));

    // No group averages above 4
    let groups = client.group_by(&spec).await.unwrap();
    assert!(groups.is_empty());
}

#[tokio::test]
async fn test_having_with_unknown_function_is_rejected() {
    let client = grouped_client().await;

    let spec = AggregateSpec::new()
        .with_group_by(["email"])
        .with_count()
        .with_having(json!({"age": {"_median": {"gt": 2}}}));

    let err = client.group_by(&spec).await.unwrap_err();
    assert!(matches!(err, QueryError::InvalidQuery(_)));
}

#[tokio::test]
async fn test_groups_are_emitted_in_deterministic_order() {
    let client = client();
    client
        .backend()
        .seed([
            json!({"name": "z", "email": "z@xx.com", "age": 1}),
            json!({"name": "a", "email": "a@xx.com", "age": 1}),
            json!({"name": "m", "email": "m@xx.com", "age": 1}),
        ])
        .await
        .unwrap();

    let spec = AggregateSpec::new().with_group_by(["email"]).with_count();

    let first = client.group_by(&spec).await.unwrap();
    let second = client.group_by(&spec).await.unwrap();
    assert_eq!(first, second);

    let emails: Vec<_> = first.iter().map(|g| g.key["email"].clone()).collect();
    assert_eq!(
        emails,
        vec![json!("a@xx.com"), json!("m@xx.com"), json!("z@xx.com")]
    );
}
