//! Factory for predicates, expressions and orderings.
//!
//! `CriteriaBuilder` is the raw criteria API the facade delegates to. It is
//! stateless; the facade hands out copies through `Criteria::builder()` so
//! callers can build predicates the fluent surface does not cover.
//!
//! ```rust
//! use tiny_criteria_query::{CriteriaBuilder, CriteriaQuery};
//! # use tiny_criteria_query::model::EntityMeta;
//! # static USER: EntityMeta = EntityMeta {
//! #     name: "User", table: "users", primary_key: &["id"],
//! #     columns: &["id", "role"], relations: &[],
//! # };
//!
//! let cb = CriteriaBuilder;
//! let query = CriteriaQuery::select(&USER);
//! let root = query.root();
//!
//! let staff = cb.or([
//!     cb.equal(root.get("role"), "admin"),
//!     cb.equal(root.get("role"), "moderator"),
//! ]);
//! assert_eq!(cb.not(staff.clone()), tiny_criteria_query::Predicate::Not(Box::new(staff)));
//! ```

use crate::expr::{ComparisonOp, Expression, Predicate};
use crate::query::Subquery;
use crate::types::Order;
use crate::value::Value;

/// Stateless criteria factory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CriteriaBuilder;

impl CriteriaBuilder {
    fn compare(
        &self,
        expr: impl Into<Expression>,
        op: ComparisonOp,
        value: impl Into<Value>,
    ) -> Predicate {
        Predicate::Compare {
            left: expr.into(),
            op,
            right: Expression::Literal(value.into()),
        }
    }

    /// `expr = value`.
    pub fn equal(&self, expr: impl Into<Expression>, value: impl Into<Value>) -> Predicate {
        self.compare(expr, ComparisonOp::Eq, value)
    }

    /// `expr <> value`.
    pub fn not_equal(&self, expr: impl Into<Expression>, value: impl Into<Value>) -> Predicate {
        self.compare(expr, ComparisonOp::Ne, value)
    }

    /// `expr > value`.
    pub fn greater_than(&self, expr: impl Into<Expression>, value: impl Into<Value>) -> Predicate {
        self.compare(expr, ComparisonOp::Gt, value)
    }

    /// `expr >= value`.
    pub fn greater_than_or_equal_to(
        &self,
        expr: impl Into<Expression>,
        value: impl Into<Value>,
    ) -> Predicate {
        self.compare(expr, ComparisonOp::Ge, value)
    }

    /// `expr < value`.
    pub fn less_than(&self, expr: impl Into<Expression>, value: impl Into<Value>) -> Predicate {
        self.compare(expr, ComparisonOp::Lt, value)
    }

    /// `expr <= value`.
    pub fn less_than_or_equal_to(
        &self,
        expr: impl Into<Expression>,
        value: impl Into<Value>,
    ) -> Predicate {
        self.compare(expr, ComparisonOp::Le, value)
    }

    /// Compare two expressions, e.g. two attribute paths.
    pub fn compare_expr(
        &self,
        left: impl Into<Expression>,
        op: ComparisonOp,
        right: impl Into<Expression>,
    ) -> Predicate {
        Predicate::Compare {
            left: left.into(),
            op,
            right: right.into(),
        }
    }

    /// `expr BETWEEN low AND high`.
    pub fn between(
        &self,
        expr: impl Into<Expression>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Predicate {
        Predicate::Between {
            expr: expr.into(),
            low: Expression::Literal(low.into()),
            high: Expression::Literal(high.into()),
        }
    }

    /// `expr LIKE pattern` (case-sensitive).
    pub fn like(&self, expr: impl Into<Expression>, pattern: impl Into<Value>) -> Predicate {
        Predicate::Like {
            expr: expr.into(),
            pattern: Expression::Literal(pattern.into()),
            negated: false,
        }
    }

    /// `expr NOT LIKE pattern`.
    pub fn not_like(&self, expr: impl Into<Expression>, pattern: impl Into<Value>) -> Predicate {
        Predicate::Like {
            expr: expr.into(),
            pattern: Expression::Literal(pattern.into()),
            negated: true,
        }
    }

    /// `LOWER(expr)`.
    pub fn lower(&self, expr: impl Into<Expression>) -> Expression {
        Expression::Lower(Box::new(expr.into()))
    }

    /// `UPPER(expr)`.
    pub fn upper(&self, expr: impl Into<Expression>) -> Expression {
        Expression::Upper(Box::new(expr.into()))
    }

    /// `expr IN (values...)`.
    pub fn in_list<V: Into<Value>>(
        &self,
        expr: impl Into<Expression>,
        values: impl IntoIterator<Item = V>,
    ) -> Predicate {
        Predicate::In {
            expr: expr.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    /// `expr NOT IN (values...)`.
    pub fn not_in_list<V: Into<Value>>(
        &self,
        expr: impl Into<Expression>,
        values: impl IntoIterator<Item = V>,
    ) -> Predicate {
        Predicate::In {
            expr: expr.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    /// `expr IN (subquery)`.
    pub fn in_subquery(&self, expr: impl Into<Expression>, subquery: Subquery) -> Predicate {
        Predicate::InSubquery {
            expr: expr.into(),
            subquery: Box::new(subquery),
            negated: false,
        }
    }

    /// `expr NOT IN (subquery)`.
    pub fn not_in_subquery(&self, expr: impl Into<Expression>, subquery: Subquery) -> Predicate {
        Predicate::InSubquery {
            expr: expr.into(),
            subquery: Box::new(subquery),
            negated: true,
        }
    }

    /// `EXISTS (subquery)`.
    pub fn exists(&self, subquery: Subquery) -> Predicate {
        Predicate::Exists {
            subquery: Box::new(subquery),
            negated: false,
        }
    }

    /// `NOT EXISTS (subquery)`.
    pub fn not_exists(&self, subquery: Subquery) -> Predicate {
        Predicate::Exists {
            subquery: Box::new(subquery),
            negated: true,
        }
    }

    /// `expr IS NULL`.
    pub fn is_null(&self, expr: impl Into<Expression>) -> Predicate {
        Predicate::IsNull {
            expr: expr.into(),
            negated: false,
        }
    }

    /// `expr IS NOT NULL`.
    pub fn is_not_null(&self, expr: impl Into<Expression>) -> Predicate {
        Predicate::IsNull {
            expr: expr.into(),
            negated: true,
        }
    }

    /// Conjunction of the given predicates.
    pub fn and(&self, predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        Predicate::And(predicates.into_iter().collect())
    }

    /// Disjunction of the given predicates.
    pub fn or(&self, predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        Predicate::Or(predicates.into_iter().collect())
    }

    /// Negation.
    pub fn not(&self, predicate: Predicate) -> Predicate {
        Predicate::Not(Box::new(predicate))
    }

    /// Ascending order on `expr`.
    pub fn asc(&self, expr: impl Into<Expression>) -> Order {
        Order::asc(expr)
    }

    /// Descending order on `expr`.
    pub fn desc(&self, expr: impl Into<Expression>) -> Order {
        Order::desc(expr)
    }
}
