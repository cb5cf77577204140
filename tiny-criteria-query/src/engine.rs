//! The execution seam between the criteria facade and a database.

use futures::future::BoxFuture;

use crate::criteria::Criteria;
use crate::error::QueryResult;
use crate::model::Model;
use crate::query::{CriteriaQuery, TypedQuery};

/// A result row: column name to JSON value.
///
/// Rows are decoded into entities with `serde_json::from_value`.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Executes criteria queries.
///
/// Implementations own connectivity and SQL generation. Errors they return
/// reach the facade's caller unchanged.
pub trait QueryEngine: Send + Sync {
    /// Execute a row-returning request, honouring its pagination.
    fn query_rows<'a>(&'a self, query: &'a TypedQuery) -> BoxFuture<'a, QueryResult<Vec<Row>>>;

    /// Execute a counting query.
    fn query_count<'a>(&'a self, query: &'a CriteriaQuery) -> BoxFuture<'a, QueryResult<u64>>;

    /// Start a criteria builder for `M` on this engine.
    fn criteria<M: Model>(&self) -> Criteria<'_, M, Self>
    where
        Self: Sized,
    {
        Criteria::new(self)
    }
}
