//! # tiny-criteria-query
//!
//! Criteria API and fluent query facade for tiny-criteria.
//!
//! This crate provides:
//! - A fluent, null-tolerant builder ([`Criteria`]) for the common query shapes
//! - The criteria expression model underneath it (`CriteriaBuilder`,
//!   `CriteriaQuery`, roots, joins, paths, predicates, subqueries)
//! - A SQL renderer for PostgreSQL, MySQL and SQLite
//! - The [`QueryEngine`] seam that database drivers implement
//!
//! ## Entities
//!
//! Criteria are written against attribute names. An entity describes its
//! table, columns and relations once, statically:
//!
//! ```rust
//! use tiny_criteria_query::{EntityMeta, Model, Relation};
//!
//! static CUSTOMER: EntityMeta = EntityMeta {
//!     name: "Customer",
//!     table: "customers",
//!     primary_key: &["id"],
//!     columns: &["id", "name", "age", "address_id"],
//!     relations: &[Relation::new("address", address_meta, "address_id", "id")],
//! };
//!
//! static ADDRESS: EntityMeta = EntityMeta {
//!     name: "Address",
//!     table: "addresses",
//!     primary_key: &["id"],
//!     columns: &["id", "city"],
//!     relations: &[],
//! };
//!
//! fn address_meta() -> &'static EntityMeta {
//!     &ADDRESS
//! }
//!
//! #[derive(serde::Deserialize)]
//! struct Customer {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl Model for Customer {
//!     fn meta() -> &'static EntityMeta {
//!         &CUSTOMER
//!     }
//! }
//! ```
//!
//! ## Building criteria
//!
//! Absent values are skipped, so optional filters chain without branching:
//!
//! ```rust,ignore
//! use tiny_criteria_query::prelude::*;
//!
//! let min_age: Option<i64> = None;
//!
//! let customers: Vec<Customer> = engine
//!     .criteria::<Customer>()
//!     .ilike("name", "jo%")
//!     .ge("age", min_age)               // skipped
//!     .eq("address.city", "Berlin")     // navigates customer -> address
//!     .add_order("name", true)
//!     .max_results(50)
//!     .list()
//!     .await?;
//!
//! let total = engine.criteria::<Customer>().ge("age", 18).count().await?;
//! ```
//!
//! ## Beyond the fluent surface
//!
//! The builder, query and root are reachable for predicates the facade does
//! not cover, such as negated membership against a subquery:
//!
//! ```rust,ignore
//! let mut criteria = engine.criteria::<Customer>();
//! let cb = criteria.builder();
//! let cancelled = criteria.subquery::<Order>();
//! let order = cancelled.root().clone();
//! let cancelled = cancelled
//!     .select(order.get("customer_id"))
//!     .r#where(cb.equal(order.get("status"), "cancelled"));
//! let id = criteria.path("id");
//!
//! let loyal = criteria.add(cb.not_in_subquery(id, cancelled)).list().await?;
//! ```
//!
//! ## Rendering SQL
//!
//! ```rust
//! use tiny_criteria_query::{CriteriaBuilder, CriteriaQuery, SqlRenderer, TypedQuery};
//! # use tiny_criteria_query::EntityMeta;
//! # static USER: EntityMeta = EntityMeta {
//! #     name: "User", table: "user", primary_key: &["id"],
//! #     columns: &["id", "age"], relations: &[],
//! # };
//!
//! let cb = CriteriaBuilder;
//! let mut query = CriteriaQuery::select(&USER);
//! let root = query.root().clone();
//! query.r#where(cb.greater_than(root.get("age"), 18));
//!
//! let (sql, _) = SqlRenderer::sqlite().render_select(&TypedQuery::new(query)).unwrap();
//! assert_eq!(sql, r#"SELECT t0.* FROM "user" t0 WHERE t0.age > ?"#);
//! ```

pub mod builder;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod expr;
pub mod logging;
pub mod model;
pub mod pagination;
pub mod path;
pub mod query;
pub mod sql;
pub mod types;
pub mod value;

pub use builder::CriteriaBuilder;
pub use criteria::Criteria;
pub use engine::{QueryEngine, Row};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use expr::{ComparisonOp, Expression, Predicate};
pub use model::{EntityMeta, Model, Relation};
pub use pagination::Pagination;
pub use path::{Join, JoinType, Path, Root};
pub use query::{CriteriaQuery, Selection, Subquery, TypedQuery};
pub use sql::{DatabaseType, SqlRenderer};
pub use types::{NullsOrder, Order, SortOrder};
pub use value::Value;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::builder::CriteriaBuilder;
    pub use crate::criteria::Criteria;
    pub use crate::engine::{QueryEngine, Row};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::expr::Predicate;
    pub use crate::model::{EntityMeta, Model, Relation};
    pub use crate::path::JoinType;
    pub use crate::types::{NullsOrder, Order, SortOrder};
    pub use crate::value::Value;
}
