//! Expressions and predicates.

use std::fmt;

use crate::path::Path;
use crate::query::Subquery;
use crate::value::Value;

/// A scalar expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// An attribute reference.
    Path(Path),
    /// A bound literal.
    Literal(Value),
    /// `LOWER(expr)`.
    Lower(Box<Expression>),
    /// `UPPER(expr)`.
    Upper(Box<Expression>),
}

impl Expression {
    /// The path this expression ultimately reads, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Literal(_) => None,
            Self::Lower(inner) | Self::Upper(inner) => inner.path(),
        }
    }
}

impl From<Path> for Expression {
    fn from(path: Path) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for Expression {
    fn from(path: &Path) -> Self {
        Self::Path(path.clone())
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

impl ComparisonOp {
    /// Get the SQL operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A boolean restriction usable in a WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `left op right`.
    Compare {
        /// Left operand.
        left: Expression,
        /// Operator.
        op: ComparisonOp,
        /// Right operand.
        right: Expression,
    },
    /// `expr BETWEEN low AND high`.
    Between {
        /// Tested expression.
        expr: Expression,
        /// Lower bound (inclusive).
        low: Expression,
        /// Upper bound (inclusive).
        high: Expression,
    },
    /// `expr [NOT] LIKE pattern`.
    Like {
        /// Tested expression.
        expr: Expression,
        /// Pattern, `%` and `_` wildcards.
        pattern: Expression,
        /// Whether the match is negated.
        negated: bool,
    },
    /// `expr [NOT] IN (values...)`.
    In {
        /// Tested expression.
        expr: Expression,
        /// Candidate values.
        values: Vec<Value>,
        /// Whether membership is negated.
        negated: bool,
    },
    /// `expr [NOT] IN (subquery)`.
    InSubquery {
        /// Tested expression.
        expr: Expression,
        /// Subquery producing the candidate values.
        subquery: Box<Subquery>,
        /// Whether membership is negated.
        negated: bool,
    },
    /// `[NOT] EXISTS (subquery)`.
    Exists {
        /// The subquery.
        subquery: Box<Subquery>,
        /// Whether existence is negated.
        negated: bool,
    },
    /// `expr IS [NOT] NULL`.
    IsNull {
        /// Tested expression.
        expr: Expression,
        /// `true` for IS NOT NULL.
        negated: bool,
    },
    /// Conjunction.
    And(Vec<Predicate>),
    /// Disjunction.
    Or(Vec<Predicate>),
    /// Negation.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Number of top-level terms: the length of a conjunction, 1 otherwise.
    pub fn term_count(&self) -> usize {
        match self {
            Self::And(terms) => terms.len(),
            _ => 1,
        }
    }

    /// Fold predicates into a single conjunction, or `None` if there are none.
    pub fn conjunction(predicates: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        let predicates: Vec<_> = predicates.into_iter().collect();
        if predicates.is_empty() {
            None
        } else {
            Some(Self::And(predicates))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::CUSTOMER;
    use crate::path::Root;

    #[test]
    fn test_expression_path() {
        let root = Root::new(0, &CUSTOMER);
        let lowered = Expression::Lower(Box::new(root.get("name").into()));
        assert_eq!(lowered.path(), Some(&root.get("name")));
        assert_eq!(Expression::Literal(Value::Int(1)).path(), None);
    }

    #[test]
    fn test_conjunction() {
        assert!(Predicate::conjunction(Vec::new()).is_none());

        let root = Root::new(0, &CUSTOMER);
        let conj = Predicate::conjunction([
            Predicate::IsNull { expr: root.get("email").into(), negated: false },
            Predicate::IsNull { expr: root.get("name").into(), negated: true },
        ])
        .unwrap();
        assert_eq!(conj.term_count(), 2);
    }

    #[test]
    fn test_comparison_sql() {
        assert_eq!(ComparisonOp::Ne.as_sql(), "<>");
        assert_eq!(ComparisonOp::Ge.to_string(), ">=");
    }
}
