//! The fluent criteria facade.
//!
//! `Criteria` buffers predicates and orderings against one entity and hands
//! them to the underlying [`CriteriaQuery`] only when a terminal method runs.
//! Value-taking methods skip absent values, so optional search parameters
//! can be chained without branching:
//!
//! ```rust,ignore
//! let customers = engine
//!     .criteria::<Customer>()
//!     .eq("active", true)
//!     .like("name", form.name_pattern)   // Option<String>; None adds nothing
//!     .ge("age", form.min_age)
//!     .eq("address.city", "Berlin")
//!     .add_order("name", true)
//!     .first_result(20)
//!     .max_results(20)
//!     .list()
//!     .await?;
//! ```
//!
//! Every chaining method and every terminal method takes the builder by
//! value. A builder therefore runs exactly one terminal operation.

use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::builder::CriteriaBuilder;
use crate::engine::{QueryEngine, Row};
use crate::error::{QueryError, QueryResult};
use crate::expr::{ComparisonOp, Expression, Predicate};
use crate::model::Model;
use crate::pagination::Pagination;
use crate::path::{Join, JoinType, Path, Root};
use crate::query::{CriteriaQuery, Subquery, TypedQuery};
use crate::types::Order;
use crate::value::Value;

/// Fluent query builder for entity `M`, executed by engine `E`.
pub struct Criteria<'e, M: Model, E: QueryEngine + ?Sized> {
    engine: &'e E,
    builder: CriteriaBuilder,
    query: CriteriaQuery,
    predicates: Vec<Predicate>,
    orders: Vec<Order>,
    joins: IndexMap<SmolStr, Join>,
    first_result: Option<u64>,
    max_results: Option<u64>,
    distinct: bool,
    _model: PhantomData<fn() -> M>,
}

impl<'e, M: Model, E: QueryEngine + ?Sized> Criteria<'e, M, E> {
    /// Start a builder over `M`.
    pub fn new(engine: &'e E) -> Self {
        Self {
            engine,
            builder: CriteriaBuilder,
            query: CriteriaQuery::select(M::meta()),
            predicates: Vec::new(),
            orders: Vec::new(),
            joins: IndexMap::new(),
            first_result: None,
            max_results: None,
            distinct: false,
            _model: PhantomData,
        }
    }

    fn push(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    fn compare(self, path: &str, op: ComparisonOp, value: Value) -> Self {
        if value.is_null() {
            return self;
        }
        let predicate = self
            .builder
            .compare_expr(self.path(path), op, Expression::Literal(value));
        self.push(predicate)
    }

    /// Eliminate duplicate root rows.
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// `path = value`, skipped when `value` is absent.
    pub fn eq(self, path: &str, value: impl Into<Value>) -> Self {
        self.compare(path, ComparisonOp::Eq, value.into())
    }

    /// `path <> value`, skipped when `value` is absent.
    pub fn ne(self, path: &str, value: impl Into<Value>) -> Self {
        self.compare(path, ComparisonOp::Ne, value.into())
    }

    /// `path > value`, skipped when `value` is absent.
    pub fn gt(self, path: &str, value: impl Into<Value>) -> Self {
        self.compare(path, ComparisonOp::Gt, value.into())
    }

    /// `path >= value`, skipped when `value` is absent.
    pub fn ge(self, path: &str, value: impl Into<Value>) -> Self {
        self.compare(path, ComparisonOp::Ge, value.into())
    }

    /// `path < value`, skipped when `value` is absent.
    pub fn lt(self, path: &str, value: impl Into<Value>) -> Self {
        self.compare(path, ComparisonOp::Lt, value.into())
    }

    /// `path <= value`, skipped when `value` is absent.
    pub fn le(self, path: &str, value: impl Into<Value>) -> Self {
        self.compare(path, ComparisonOp::Le, value.into())
    }

    /// `path BETWEEN low AND high`, skipped when either bound is absent.
    pub fn between(self, path: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        let (low, high) = (low.into(), high.into());
        if low.is_null() || high.is_null() {
            return self;
        }
        let predicate = self.builder.between(self.path(path), low, high);
        self.push(predicate)
    }

    /// Case-sensitive `path LIKE pattern`, skipped when `pattern` is absent.
    pub fn like(self, path: &str, pattern: impl Into<Value>) -> Self {
        let pattern = pattern.into();
        if pattern.is_null() {
            return self;
        }
        let predicate = self.builder.like(self.path(path), pattern);
        self.push(predicate)
    }

    /// Case-insensitive like: both the attribute and the pattern are
    /// lower-cased. Skipped when `pattern` is absent.
    pub fn ilike(self, path: &str, pattern: impl Into<Value>) -> Self {
        let pattern = pattern.into();
        if pattern.is_null() {
            return self;
        }
        let predicate = self
            .builder
            .like(self.builder.lower(self.path(path)), pattern.to_lowercase());
        self.push(predicate)
    }

    /// `path IN (values...)`, skipped when `values` is absent or empty.
    ///
    /// Each item binds one parameter; list-valued items are rejected when
    /// the query is rendered.
    pub fn r#in<I>(self, path: &str, values: impl Into<Option<I>>) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let Some(values) = values.into() else {
            return self;
        };
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return self;
        }
        let predicate = self.builder.in_list(self.path(path), values);
        self.push(predicate)
    }

    /// `path IS NULL`.
    pub fn is_null(self, path: &str) -> Self {
        let predicate = self.builder.is_null(self.path(path));
        self.push(predicate)
    }

    /// `path IS NOT NULL`.
    pub fn is_not_null(self, path: &str) -> Self {
        let predicate = self.builder.is_not_null(self.path(path));
        self.push(predicate)
    }

    /// Append the conjunction of `predicates`, skipped when there are none.
    pub fn and(self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let predicates: Vec<Predicate> = predicates.into_iter().collect();
        if predicates.is_empty() {
            return self;
        }
        let predicate = self.builder.and(predicates);
        self.push(predicate)
    }

    /// Append the disjunction of `predicates`, skipped when there are none.
    pub fn or(self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let predicates: Vec<Predicate> = predicates.into_iter().collect();
        if predicates.is_empty() {
            return self;
        }
        let predicate = self.builder.or(predicates);
        self.push(predicate)
    }

    /// Append a prebuilt predicate, skipped for `None`.
    pub fn add(self, predicate: impl Into<Option<Predicate>>) -> Self {
        match predicate.into() {
            Some(predicate) => self.push(predicate),
            None => self,
        }
    }

    /// Register a join on `relation`.
    ///
    /// Only the first registration per relation counts; later calls are
    /// ignored even when they ask for a different join type.
    pub fn join(mut self, relation: &str, join_type: JoinType) -> Self {
        if let Some(existing) = self.joins.get(relation) {
            trace!(
                relation,
                alias = existing.alias(),
                requested = %join_type,
                "join already registered"
            );
            return self;
        }

        let join = self.query.join(relation, join_type);
        trace!(relation, alias = join.alias(), join_type = %join_type, "registered join");
        self.joins.insert(SmolStr::new(relation), join);
        self
    }

    /// The join registered for `relation`.
    pub fn get_join(&self, relation: &str) -> Option<&Join> {
        self.joins.get(relation)
    }

    /// Append an ordering on `path`.
    pub fn add_order(mut self, path: &str, ascending: bool) -> Self {
        let path = self.path(path);
        let order = if ascending {
            self.builder.asc(path)
        } else {
            self.builder.desc(path)
        };
        self.orders.push(order);
        self
    }

    /// Append a prebuilt ordering.
    pub fn order(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    /// Skip the first `first_result` rows of `list`.
    pub fn first_result(mut self, first_result: u64) -> Self {
        self.first_result = Some(first_result);
        self
    }

    /// Return at most `max_results` rows from `list`.
    pub fn max_results(mut self, max_results: u64) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Resolve a dotted attribute path.
    ///
    /// Each segment before the last either names a registered join, which
    /// becomes the new base, or navigates from the current base. The last
    /// segment is the attribute.
    pub fn path(&self, path: &str) -> Path {
        let (navigation, attribute) = match path.rsplit_once('.') {
            Some((navigation, attribute)) => (Some(navigation), attribute),
            None => (None, path),
        };

        let mut base: Option<&Join> = None;
        let mut current: Option<Path> = None;
        for segment in navigation.into_iter().flat_map(|n| n.split('.')) {
            if let Some(join) = self.joins.get(segment) {
                base = Some(join);
                current = None;
                continue;
            }
            current = Some(match current.take() {
                Some(path) => path.get(segment),
                None => self.base_get(base, segment),
            });
        }

        match current {
            Some(path) => path.get(attribute),
            None => self.base_get(base, attribute),
        }
    }

    fn base_get(&self, base: Option<&Join>, attribute: &str) -> Path {
        match base {
            Some(join) => join.get(attribute),
            None => self.query.root().get(attribute),
        }
    }

    /// The predicate factory.
    pub fn builder(&self) -> CriteriaBuilder {
        self.builder
    }

    /// The underlying query object.
    pub fn query(&self) -> &CriteriaQuery {
        &self.query
    }

    /// Mutable access to the underlying query object.
    pub fn query_mut(&mut self) -> &mut CriteriaQuery {
        &mut self.query
    }

    /// The query root.
    pub fn root(&self) -> &Root {
        self.query.root()
    }

    /// Create a subquery over `U` for use with the builder's subquery predicates.
    pub fn subquery<U: Model>(&mut self) -> Subquery {
        self.query.subquery(U::meta())
    }

    /// Number of accumulated predicates.
    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    /// Accumulated predicates, in insertion order.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Accumulated orderings, primary first.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    fn pagination(&self) -> Pagination {
        Pagination {
            first_result: self.first_result,
            max_results: self.max_results,
        }
    }

    fn log_terminal(&self, operation: &'static str) {
        debug!(
            operation,
            entity = M::meta().name,
            predicates = self.predicates.len(),
            orders = self.orders.len(),
            joins = self.joins.len(),
            first_result = ?self.first_result,
            max_results = ?self.max_results,
            distinct = self.distinct,
            "executing criteria"
        );
    }

    fn into_query(self) -> CriteriaQuery {
        let Self {
            mut query,
            predicates,
            orders,
            distinct,
            ..
        } = self;

        if let Some(restriction) = Predicate::conjunction(predicates) {
            query.r#where(restriction);
        }
        if !orders.is_empty() {
            query.order_by(orders);
        }
        if distinct {
            query.distinct(true);
        }
        query
    }

    /// The request [`list`](Self::list) would execute.
    pub fn into_typed_query(self) -> TypedQuery {
        let pagination = self.pagination();
        TypedQuery::new(self.into_query()).with_pagination(pagination)
    }

    /// The request [`unique_result`](Self::unique_result) would execute.
    pub fn into_unique_query(self) -> TypedQuery {
        TypedQuery::new(self.into_query())
    }

    /// The query [`count`](Self::count) would execute.
    ///
    /// A fresh counting query over the same entity, with the joins
    /// re-attached under their original aliases. Ordering and pagination
    /// are left out.
    pub fn into_count_query(self) -> CriteriaQuery {
        let mut count = CriteriaQuery::count(M::meta());
        for join in self.query.joins() {
            count.adopt_join(join.clone());
        }

        let restriction =
            Predicate::conjunction(self.predicates).or_else(|| self.query.restriction().cloned());
        if let Some(restriction) = restriction {
            count.r#where(restriction);
        }
        count.distinct(self.distinct);
        count
    }

    /// Execute and decode every matching row.
    pub async fn list(self) -> QueryResult<Vec<M>>
    where
        M: DeserializeOwned,
    {
        self.log_terminal("list");
        let engine = self.engine;
        let request = self.into_typed_query();

        let rows = engine.query_rows(&request).await?;
        debug!(entity = M::meta().name, rows = rows.len(), "criteria list complete");
        rows.into_iter().map(decode::<M>).collect()
    }

    /// Execute without pagination and decode the first row, if any.
    ///
    /// Additional matching rows are ignored.
    pub async fn unique_result(self) -> QueryResult<Option<M>>
    where
        M: DeserializeOwned,
    {
        self.log_terminal("unique_result");
        let engine = self.engine;
        let request = self.into_unique_query();

        let rows = engine.query_rows(&request).await?;
        rows.into_iter().next().map(decode::<M>).transpose()
    }

    /// Count matching rows.
    pub async fn count(self) -> QueryResult<u64> {
        self.log_terminal("count");
        let engine = self.engine;
        let query = self.into_count_query();

        let count = engine.query_count(&query).await?;
        debug!(entity = M::meta().name, count, "criteria count complete");
        Ok(count)
    }
}

impl<M: Model, E: QueryEngine + ?Sized> std::fmt::Debug for Criteria<'_, M, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Criteria")
            .field("entity", &M::meta().name)
            .field("predicates", &self.predicates)
            .field("orders", &self.orders)
            .field("joins", &self.joins.keys().collect::<Vec<_>>())
            .field("first_result", &self.first_result)
            .field("max_results", &self.max_results)
            .field("distinct", &self.distinct)
            .finish()
    }
}

fn decode<M: Model + DeserializeOwned>(row: Row) -> QueryResult<M> {
    serde_json::from_value(serde_json::Value::Object(row))
        .map_err(|e| QueryError::from(e).with_model(M::meta().name))
}
