//! End-to-end tests for the criteria facade against SQLite.
//!
//! These tests cover:
//! - Skipping of absent filter values
//! - Relation navigation and registered joins
//! - Pagination, ordering and distinct counting
//! - Subqueries through the builder escape hatch
//! - Rendered SQL for the common shapes

use pretty_assertions::assert_eq;
use serde::Deserialize;
use tiny_criteria::prelude::*;
use tiny_criteria::sqlite::types::bool_from_int;
use tiny_criteria::sqlite::{SqliteConfig, SqliteEngine};
use tiny_criteria::{ErrorCode, SqlRenderer};

static CUSTOMER: EntityMeta = EntityMeta {
    name: "Customer",
    table: "customers",
    primary_key: &["id"],
    columns: &["id", "name", "email", "age", "active", "address_id"],
    relations: &[
        Relation::new("address", address_meta, "address_id", "id"),
        Relation::new("orders", order_meta, "id", "customer_id"),
    ],
};

static ADDRESS: EntityMeta = EntityMeta {
    name: "Address",
    table: "addresses",
    primary_key: &["id"],
    columns: &["id", "street", "city"],
    relations: &[],
};

static ORDER: EntityMeta = EntityMeta {
    name: "Order",
    table: "order",
    primary_key: &["id"],
    columns: &["id", "customer_id", "total", "status"],
    relations: &[Relation::new("customer", customer_meta, "customer_id", "id")],
};

fn customer_meta() -> &'static EntityMeta {
    &CUSTOMER
}

fn address_meta() -> &'static EntityMeta {
    &ADDRESS
}

fn order_meta() -> &'static EntityMeta {
    &ORDER
}

#[derive(Debug, Deserialize)]
struct Customer {
    id: i64,
    name: String,
    email: Option<String>,
    age: Option<i64>,
    #[serde(deserialize_with = "bool_from_int")]
    active: bool,
}

impl Model for Customer {
    fn meta() -> &'static EntityMeta {
        &CUSTOMER
    }
}

#[derive(Debug, Deserialize)]
struct Purchase {
    id: i64,
    total: f64,
    status: String,
}

impl Model for Purchase {
    fn meta() -> &'static EntityMeta {
        &ORDER
    }
}

const SCHEMA: &str = r#"
    CREATE TABLE addresses (id INTEGER PRIMARY KEY, street TEXT NOT NULL, city TEXT NOT NULL);
    CREATE TABLE customers (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT,
        age INTEGER,
        active INTEGER NOT NULL,
        address_id INTEGER REFERENCES addresses(id)
    );
    CREATE TABLE "order" (
        id INTEGER PRIMARY KEY,
        customer_id INTEGER NOT NULL REFERENCES customers(id),
        total REAL NOT NULL,
        status TEXT NOT NULL
    );

    INSERT INTO addresses VALUES (1, 'Main St', 'Berlin'), (2, 'Rue Haute', 'Paris'), (3, 'Elm Rd', 'Berlin');
    INSERT INTO customers VALUES
        (1, 'Alice', 'alice@example.com', 34, 1, 1),
        (2, 'Bob', 'bob@example.org', 17, 1, 2),
        (3, 'Carol', 'carol@example.com', 52, 0, 3),
        (4, 'Dave', NULL, 41, 1, NULL),
        (5, 'Erin', 'erin@example.com', NULL, 1, 1);
    INSERT INTO "order" VALUES
        (1, 1, 120.0, 'paid'),
        (2, 1, 80.0, 'paid'),
        (3, 2, 15.5, 'cancelled'),
        (4, 3, 300.0, 'paid'),
        (5, 5, 60.0, 'cancelled');
"#;

async fn shop() -> SqliteEngine {
    let engine = SqliteEngine::memory().await.unwrap();
    engine.execute_batch(SCHEMA).await.unwrap();
    engine
}

fn ids(customers: &[Customer]) -> Vec<i64> {
    customers.iter().map(|c| c.id).collect()
}

#[tokio::test]
async fn test_absent_values_are_skipped() {
    let engine = shop().await;
    let name: Option<&str> = None;
    let min_age: Option<i64> = None;

    let criteria = engine
        .criteria::<Customer>()
        .eq("name", name)
        .ge("age", min_age)
        .like("email", None::<String>)
        .r#in("id", Vec::<i64>::new())
        .between("age", 10, None::<i64>)
        .add_order("id", true);
    assert_eq!(criteria.predicate_count(), 0);

    let customers = criteria.list().await.unwrap();
    assert_eq!(ids(&customers), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_decoding_nullable_columns() {
    let engine = shop().await;
    let dave = engine
        .criteria::<Customer>()
        .is_null("email")
        .unique_result()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(dave.name, "Dave");
    assert_eq!(dave.email, None);
    assert_eq!(dave.age, Some(41));
    assert!(dave.active);
}

#[tokio::test]
async fn test_ilike_is_case_insensitive() {
    let engine = shop().await;
    let customers = engine
        .criteria::<Customer>()
        .ilike("email", "%@EXAMPLE.COM")
        .add_order("id", true)
        .list()
        .await
        .unwrap();

    assert_eq!(ids(&customers), vec![1, 3, 5]);
}

#[tokio::test]
async fn test_navigation_uses_inner_join() {
    let engine = shop().await;
    let customers = engine
        .criteria::<Customer>()
        .eq("address.city", "Berlin")
        .add_order("name", false)
        .list()
        .await
        .unwrap();

    let names: Vec<_> = customers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Erin", "Carol", "Alice"]);
}

#[tokio::test]
async fn test_left_join_keeps_unmatched_rows() {
    let engine = shop().await;
    let criteria = engine.criteria::<Customer>().join("address", JoinType::Left);
    let cb = criteria.builder();
    let city = criteria.path("address.city");

    let customers = criteria
        .or([cb.equal(&city, "Paris"), cb.is_null(&city)])
        .add_order("id", true)
        .list()
        .await
        .unwrap();

    assert_eq!(ids(&customers), vec![2, 4]);
}

#[tokio::test]
async fn test_or_and_between() {
    let engine = shop().await;
    let criteria = engine.criteria::<Customer>();
    let cb = criteria.builder();
    let age = criteria.path("age");

    let minors_or_unknown = criteria
        .or([cb.less_than(&age, 18), cb.is_null(&age)])
        .add_order("id", true)
        .list()
        .await
        .unwrap();
    assert_eq!(ids(&minors_or_unknown), vec![2, 5]);

    let middle_aged = engine
        .criteria::<Customer>()
        .between("age", 30, 45)
        .add_order("age", true)
        .list()
        .await
        .unwrap();
    assert_eq!(ids(&middle_aged), vec![1, 4]);
}

#[tokio::test]
async fn test_pagination() {
    let engine = shop().await;

    let page = engine
        .criteria::<Customer>()
        .add_order("id", true)
        .first_result(1)
        .max_results(2)
        .list()
        .await
        .unwrap();
    assert_eq!(ids(&page), vec![2, 3]);

    let tail = engine
        .criteria::<Customer>()
        .add_order("id", true)
        .first_result(3)
        .list()
        .await
        .unwrap();
    assert_eq!(ids(&tail), vec![4, 5]);
}

#[tokio::test]
async fn test_count_ignores_pagination_and_honors_distinct() {
    let engine = shop().await;

    let paged = engine
        .criteria::<Customer>()
        .eq("active", true)
        .add_order("name", true)
        .max_results(1)
        .count()
        .await
        .unwrap();
    assert_eq!(paged, 4);

    let rows = engine
        .criteria::<Customer>()
        .join("orders", JoinType::Inner)
        .gt("orders.total", 50.0)
        .count()
        .await
        .unwrap();
    assert_eq!(rows, 4);

    let customers = engine
        .criteria::<Customer>()
        .join("orders", JoinType::Inner)
        .gt("orders.total", 50.0)
        .distinct(true)
        .count()
        .await
        .unwrap();
    assert_eq!(customers, 3);
}

#[tokio::test]
async fn test_not_in_subquery() {
    let engine = shop().await;
    let mut criteria = engine.criteria::<Customer>();
    let cb = criteria.builder();

    let cancelled = criteria.subquery::<Purchase>();
    let order = cancelled.root().clone();
    let cancelled = cancelled
        .select(order.get("customer_id"))
        .r#where(cb.equal(order.get("status"), "cancelled"));
    let id = criteria.path("id");

    let loyal = criteria
        .add(cb.not_in_subquery(id, cancelled))
        .eq("active", true)
        .add_order("id", true)
        .list()
        .await
        .unwrap();
    assert_eq!(ids(&loyal), vec![1, 4]);
}

#[tokio::test]
async fn test_navigation_from_many_side() {
    let engine = shop().await;
    let purchases: Vec<Purchase> = engine
        .criteria::<Purchase>()
        .eq("customer.name", "Alice")
        .add_order("total", false)
        .list()
        .await
        .unwrap();

    let totals: Vec<f64> = purchases.iter().map(|p| p.total).collect();
    assert_eq!(totals, vec![120.0, 80.0]);
    assert!(purchases.iter().all(|p| p.status == "paid"));
    assert_eq!(purchases[0].id, 1);
}

#[tokio::test]
async fn test_unknown_attribute_is_rejected() {
    let engine = shop().await;
    let err = engine
        .criteria::<Customer>()
        .eq("nickname", "al")
        .list()
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidPath);
}

#[tokio::test]
async fn test_decode_failure_names_model() {
    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Strict {
        id: i64,
        status: i64,
    }

    impl Model for Strict {
        fn meta() -> &'static EntityMeta {
            &ORDER
        }
    }

    let engine = shop().await;
    let err = engine.criteria::<Strict>().list().await.unwrap_err();

    assert_eq!(err.code, ErrorCode::DeserializationError);
    assert_eq!(err.context.model.as_deref(), Some("Order"));
}

#[tokio::test]
async fn test_file_database_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.db");

    let engine = SqliteEngine::open(SqliteConfig::file(&path)).await.unwrap();
    engine.execute_batch(SCHEMA).await.unwrap();
    drop(engine);

    let reopened = SqliteEngine::from_url(format!("sqlite://{}?foreign_keys=true", path.display()))
        .await
        .unwrap();
    let count = reopened
        .criteria::<Customer>()
        .is_not_null("email")
        .count()
        .await
        .unwrap();
    assert_eq!(count, 4);
}

mod rendering {
    use super::*;
    use pretty_assertions::assert_eq;
    use futures::future::BoxFuture;

    struct Offline;

    impl QueryEngine for Offline {
        fn query_rows<'a>(
            &'a self,
            _query: &'a tiny_criteria::TypedQuery,
        ) -> BoxFuture<'a, QueryResult<Vec<Row>>> {
            Box::pin(async { Ok::<_, QueryError>(Vec::new()) })
        }

        fn query_count<'a>(
            &'a self,
            _query: &'a tiny_criteria::CriteriaQuery,
        ) -> BoxFuture<'a, QueryResult<u64>> {
            Box::pin(async { Ok::<_, QueryError>(0) })
        }
    }

    #[test]
    fn test_render_filtered_page() {
        let request = Offline
            .criteria::<Customer>()
            .ilike("name", "Jo%")
            .eq("address.city", "Berlin")
            .ge("age", None::<i64>)
            .add_order("name", true)
            .first_result(20)
            .max_results(10)
            .into_typed_query();

        let (sql, params) = SqlRenderer::sqlite().render_select(&request).unwrap();
        insta::assert_snapshot!(sql, @"SELECT t0.* FROM customers t0 INNER JOIN addresses t0_address ON t0_address.id = t0.address_id WHERE LOWER(t0.name) LIKE ? AND t0_address.city = ? ORDER BY t0.name ASC LIMIT 10 OFFSET 20");
        assert_eq!(params, vec![Value::from("jo%"), Value::from("Berlin")]);
    }

    #[test]
    fn test_render_distinct_count() {
        let query = Offline
            .criteria::<Customer>()
            .join("orders", JoinType::Left)
            .r#in("orders.status", ["paid", "refunded"])
            .distinct(true)
            .into_count_query();

        let (sql, _) = SqlRenderer::postgres().render_count(&query).unwrap();
        insta::assert_snapshot!(sql, @r#"SELECT COUNT(*) FROM (SELECT DISTINCT t0.* FROM customers t0 LEFT JOIN "order" t1 ON t1.customer_id = t0.id WHERE t1.status IN ($1, $2)) AS q"#);
    }
}
