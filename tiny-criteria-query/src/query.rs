//! The mutable query object and the execution request built from it.
//!
//! `CriteriaQuery` mirrors the framework-side query a facade hands clauses
//! to: it owns the root, the registered joins, and whatever restriction,
//! ordering and distinct flag were last applied. Applying a restriction or
//! an ordering replaces the previous one.
//!
//! ```rust
//! use tiny_criteria_query::{CriteriaBuilder, CriteriaQuery, JoinType, Selection};
//! # use tiny_criteria_query::model::{EntityMeta, Relation};
//! # static ORDER: EntityMeta = EntityMeta {
//! #     name: "Order", table: "orders", primary_key: &["id"],
//! #     columns: &["id", "customer_id", "total"], relations: &[],
//! # };
//! # static CUSTOMER: EntityMeta = EntityMeta {
//! #     name: "Customer", table: "customers", primary_key: &["id"],
//! #     columns: &["id", "name"],
//! #     relations: &[Relation::new("orders", order, "id", "customer_id")],
//! # };
//! # fn order() -> &'static EntityMeta { &ORDER }
//!
//! let cb = CriteriaBuilder;
//! let mut query = CriteriaQuery::select(&CUSTOMER);
//! let orders = query.join("orders", JoinType::Left);
//! query
//!     .r#where(cb.greater_than(orders.get("total"), 100))
//!     .distinct(true);
//!
//! assert_eq!(query.selection(), Selection::Entity);
//! assert_eq!(query.joins().len(), 1);
//! assert!(query.is_distinct());
//! ```

use crate::expr::{Expression, Predicate};
use crate::model::EntityMeta;
use crate::pagination::Pagination;
use crate::path::{Join, JoinType, Root};
use crate::types::Order;

/// What a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    /// Whole root entity rows.
    Entity,
    /// A single row count.
    Count,
}

/// The mutable criteria query object.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaQuery {
    selection: Selection,
    root: Root,
    joins: Vec<Join>,
    restriction: Option<Predicate>,
    order_by: Vec<Order>,
    distinct: bool,
    next_id: usize,
}

impl CriteriaQuery {
    fn new(entity: &'static EntityMeta, selection: Selection) -> Self {
        Self {
            selection,
            root: Root::new(0, entity),
            joins: Vec::new(),
            restriction: None,
            order_by: Vec::new(),
            distinct: false,
            next_id: 1,
        }
    }

    /// A query returning rows of `entity`.
    pub fn select(entity: &'static EntityMeta) -> Self {
        Self::new(entity, Selection::Entity)
    }

    /// A query counting rows of `entity`.
    pub fn count(entity: &'static EntityMeta) -> Self {
        Self::new(entity, Selection::Count)
    }

    fn allocate_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// What the query returns.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// The query root.
    pub fn root(&self) -> &Root {
        &self.root
    }

    /// The root entity.
    pub fn entity(&self) -> &'static EntityMeta {
        self.root.entity()
    }

    /// Registered joins, in registration order.
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// Join a relation of the root entity.
    pub fn join(&mut self, relation: &str, join_type: JoinType) -> Join {
        let parent = self.root.alias().to_owned();
        self.join_from(&parent, relation, join_type)
    }

    /// Join a relation of an already joined entity (or the root), by alias.
    pub fn join_from(&mut self, parent_alias: &str, relation: &str, join_type: JoinType) -> Join {
        let join = Join::new(self.allocate_id(), parent_alias, relation, join_type);
        self.joins.push(join.clone());
        join
    }

    /// Attach an existing join handle, keeping its alias.
    pub(crate) fn adopt_join(&mut self, join: Join) {
        self.next_id = self.next_id.max(join.id() + 1);
        self.joins.push(join);
    }

    /// Set the restriction, replacing any previous one.
    pub fn r#where(&mut self, predicate: Predicate) -> &mut Self {
        self.restriction = Some(predicate);
        self
    }

    /// The current restriction.
    pub fn restriction(&self) -> Option<&Predicate> {
        self.restriction.as_ref()
    }

    /// Set the ordering, replacing any previous one.
    pub fn order_by(&mut self, orders: impl IntoIterator<Item = Order>) -> &mut Self {
        self.order_by = orders.into_iter().collect();
        self
    }

    /// The current ordering.
    pub fn orders(&self) -> &[Order] {
        &self.order_by
    }

    /// Set the distinct flag.
    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct = distinct;
        self
    }

    /// Whether duplicate rows are eliminated.
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Create a subquery over `entity`, with an alias unique within this query.
    pub fn subquery(&mut self, entity: &'static EntityMeta) -> Subquery {
        Subquery::new(Root::new(self.allocate_id(), entity))
    }
}

/// A nested query usable in `IN` and `EXISTS` predicates.
///
/// Paths from the enclosing query may be used inside the subquery's
/// restriction, which makes it correlated.
#[derive(Debug, Clone, PartialEq)]
pub struct Subquery {
    root: Root,
    selection: Option<Expression>,
    restriction: Option<Predicate>,
    distinct: bool,
}

impl Subquery {
    fn new(root: Root) -> Self {
        Self {
            root,
            selection: None,
            restriction: None,
            distinct: false,
        }
    }

    /// The subquery root.
    pub fn root(&self) -> &Root {
        &self.root
    }

    /// Select a single expression.
    pub fn select(mut self, expr: impl Into<Expression>) -> Self {
        self.selection = Some(expr.into());
        self
    }

    /// Set the restriction, replacing any previous one.
    pub fn r#where(mut self, predicate: Predicate) -> Self {
        self.restriction = Some(predicate);
        self
    }

    /// Set the distinct flag.
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// The selected expression.
    pub fn selection(&self) -> Option<&Expression> {
        self.selection.as_ref()
    }

    /// The current restriction.
    pub fn restriction(&self) -> Option<&Predicate> {
        self.restriction.as_ref()
    }

    /// Whether duplicate rows are eliminated.
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }
}

/// The execution request handed to a [`QueryEngine`](crate::QueryEngine).
#[derive(Debug, Clone, PartialEq)]
pub struct TypedQuery {
    query: CriteriaQuery,
    pagination: Pagination,
}

impl TypedQuery {
    /// Wrap a query without pagination.
    pub fn new(query: CriteriaQuery) -> Self {
        Self {
            query,
            pagination: Pagination::new(),
        }
    }

    /// Apply pagination bounds.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// The query object.
    pub fn query(&self) -> &CriteriaQuery {
        &self.query
    }

    /// The pagination bounds.
    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Split into the query and its pagination.
    pub fn into_parts(self) -> (CriteriaQuery, Pagination) {
        (self.query, self.pagination)
    }
}
