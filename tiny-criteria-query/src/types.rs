//! Ordering types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::expr::Expression;

/// Sort order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9, oldest first).
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0, newest first).
    Desc,
}

impl SortOrder {
    /// Get the SQL keyword for this sort order.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// Null handling in sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullsOrder {
    /// Nulls appear first in the results.
    First,
    /// Nulls appear last in the results.
    Last,
}

impl NullsOrder {
    /// Get the SQL clause for this null order.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::First => "NULLS FIRST",
            Self::Last => "NULLS LAST",
        }
    }
}

/// A single ordering directive.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// The expression to order by.
    pub expression: Expression,
    /// The sort order.
    pub direction: SortOrder,
    /// Null handling (optional).
    pub nulls: Option<NullsOrder>,
}

impl Order {
    /// Create a new ordering directive.
    pub fn new(expression: impl Into<Expression>, direction: SortOrder) -> Self {
        Self {
            expression: expression.into(),
            direction,
            nulls: None,
        }
    }

    /// Create an ascending order.
    pub fn asc(expression: impl Into<Expression>) -> Self {
        Self::new(expression, SortOrder::Asc)
    }

    /// Create a descending order.
    pub fn desc(expression: impl Into<Expression>) -> Self {
        Self::new(expression, SortOrder::Desc)
    }

    /// Set null handling.
    pub fn nulls(mut self, nulls: NullsOrder) -> Self {
        self.nulls = Some(nulls);
        self
    }

    /// Whether this directive sorts ascending.
    pub fn is_ascending(&self) -> bool {
        self.direction == SortOrder::Asc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::CUSTOMER;
    use crate::path::Root;

    #[test]
    fn test_sort_order_sql() {
        assert_eq!(SortOrder::Asc.as_sql(), "ASC");
        assert_eq!(SortOrder::Desc.to_string(), "DESC");
        assert_eq!(SortOrder::default(), SortOrder::Asc);
    }

    #[test]
    fn test_order_builders() {
        let root = Root::new(0, &CUSTOMER);
        let order = Order::desc(root.get("age")).nulls(NullsOrder::Last);
        assert!(!order.is_ascending());
        assert_eq!(order.nulls, Some(NullsOrder::Last));
        assert_eq!(order.expression, Expression::Path(root.get("age")));
    }
}
