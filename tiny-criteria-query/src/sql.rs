//! SQL generation for criteria queries.
//!
//! [`SqlRenderer`] turns a [`TypedQuery`] or a counting [`CriteriaQuery`]
//! into a statement and its bind values. This is where attribute paths are
//! checked: the base alias of each path is looked up among the root, the
//! registered joins and any enclosing query, every navigation segment must
//! name a relation (rendered as an implicit inner join), and the terminal
//! segment must name a column.
//!
//! ```rust
//! use tiny_criteria_query::{CriteriaBuilder, CriteriaQuery, SqlRenderer, TypedQuery, Value};
//! # use tiny_criteria_query::model::EntityMeta;
//! # static USER: EntityMeta = EntityMeta {
//! #     name: "User", table: "users", primary_key: &["id"],
//! #     columns: &["id", "email", "active"], relations: &[],
//! # };
//!
//! let cb = CriteriaBuilder;
//! let mut query = CriteriaQuery::select(&USER);
//! let root = query.root().clone();
//! query.r#where(cb.equal(root.get("active"), true));
//!
//! let (sql, params) = SqlRenderer::postgres()
//!     .render_select(&TypedQuery::new(query))
//!     .unwrap();
//! assert_eq!(sql, "SELECT t0.* FROM users t0 WHERE t0.active = $1");
//! assert_eq!(params, vec![Value::Bool(true)]);
//! ```

use std::collections::HashMap;
use std::fmt::Write;

use indexmap::IndexMap;
use smol_str::{SmolStr, format_smolstr};
use tracing::trace;

use crate::error::{QueryError, QueryResult};
use crate::expr::{Expression, Predicate};
use crate::model::{EntityMeta, Relation};
use crate::path::{Join, JoinType, Path, Root};
use crate::query::{CriteriaQuery, Selection, Subquery, TypedQuery};
use crate::types::{NullsOrder, Order};
use crate::value::Value;

/// Escape an identifier for the given dialect.
pub fn escape_identifier(name: &str, db_type: DatabaseType) -> String {
    let quote = db_type.quote_char();
    let doubled: String = [quote, quote].iter().collect();
    let escaped = name.replace(quote, &doubled);
    format!("{}{}{}", quote, escaped, quote)
}

/// Check if an identifier needs quoting.
pub fn needs_quoting(name: &str) -> bool {
    let reserved = [
        "user", "order", "group", "select", "from", "where", "table", "index",
        "key", "primary", "foreign", "check", "default", "null", "not", "and",
        "or", "in", "is", "like", "between", "case", "when", "then", "else",
        "end", "as", "on", "join", "left", "right", "inner", "outer", "cross",
        "natural", "using", "limit", "offset", "union", "intersect", "except",
        "all", "distinct", "having", "create", "alter", "drop", "insert",
        "update", "delete", "into", "values", "set", "returning", "exists",
    ];

    if reserved.contains(&name.to_lowercase().as_str()) {
        return true;
    }

    name.is_empty()
        || name.starts_with(|c: char| c.is_ascii_digit())
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote an identifier if needed.
pub fn quote_identifier(name: &str, db_type: DatabaseType) -> String {
    if needs_quoting(name) {
        escape_identifier(name, db_type)
    } else {
        name.to_string()
    }
}

/// SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DatabaseType {
    /// PostgreSQL uses $1, $2, etc.
    #[default]
    PostgreSQL,
    /// MySQL uses ?, ?, etc.
    MySQL,
    /// SQLite uses ?, ?, etc.
    SQLite,
}

impl DatabaseType {
    /// Get the parameter placeholder for this database type.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${}", index),
            Self::MySQL | Self::SQLite => "?".to_string(),
        }
    }

    /// Character used to quote identifiers.
    pub fn quote_char(&self) -> char {
        match self {
            Self::MySQL => '`',
            Self::PostgreSQL | Self::SQLite => '"',
        }
    }
}

/// Renders criteria queries to SQL for one dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlRenderer {
    db_type: DatabaseType,
}

impl SqlRenderer {
    /// Create a renderer for a dialect.
    pub fn new(db_type: DatabaseType) -> Self {
        Self { db_type }
    }

    /// Create a PostgreSQL renderer.
    pub fn postgres() -> Self {
        Self::new(DatabaseType::PostgreSQL)
    }

    /// Create a MySQL renderer.
    pub fn mysql() -> Self {
        Self::new(DatabaseType::MySQL)
    }

    /// Create a SQLite renderer.
    pub fn sqlite() -> Self {
        Self::new(DatabaseType::SQLite)
    }

    /// The target dialect.
    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    /// Render the row-returning statement for an execution request.
    ///
    /// A counting query is rendered as by [`render_count`](Self::render_count).
    pub fn render_select(&self, request: &TypedQuery) -> QueryResult<(String, Vec<Value>)> {
        let query = request.query();
        if query.selection() == Selection::Count {
            return self.render_count(query);
        }

        let mut cx = Context::new(self.db_type);
        let mut sql = cx.statement(Statement::query(query, Head::Entity), None)?;

        let pagination = request.pagination();
        if !pagination.is_empty() {
            sql.push(' ');
            pagination.write_sql(self.db_type, &mut sql);
        }

        trace!(sql = %sql, params = cx.params.len(), "rendered select");
        Ok((sql, cx.params))
    }

    /// Render a `COUNT(*)` over the query's rows.
    ///
    /// Ordering is never rendered. With the distinct flag set, the distinct
    /// root rows are counted through a derived table.
    pub fn render_count(&self, query: &CriteriaQuery) -> QueryResult<(String, Vec<Value>)> {
        let mut cx = Context::new(self.db_type);
        let sql = if query.is_distinct() {
            let mut statement = Statement::query(query, Head::Entity);
            statement.orders = &[];
            let inner = cx.statement(statement, None)?;
            format!("SELECT COUNT(*) FROM ({}) AS q", inner)
        } else {
            let mut statement = Statement::query(query, Head::CountAll);
            statement.orders = &[];
            cx.statement(statement, None)?
        };

        trace!(sql = %sql, params = cx.params.len(), "rendered count");
        Ok((sql, cx.params))
    }
}

/// The select list of a statement.
#[derive(Clone, Copy)]
enum Head<'q> {
    Entity,
    CountAll,
    Expr(&'q Expression),
    One,
}

/// One SELECT level: a query or a subquery.
struct Statement<'q> {
    root: &'q Root,
    joins: &'q [Join],
    head: Head<'q>,
    restriction: Option<&'q Predicate>,
    orders: &'q [Order],
    distinct: bool,
}

impl<'q> Statement<'q> {
    fn query(query: &'q CriteriaQuery, head: Head<'q>) -> Self {
        Self {
            root: query.root(),
            joins: query.joins(),
            head,
            restriction: query.restriction(),
            orders: query.orders(),
            distinct: query.is_distinct(),
        }
    }

    fn subquery(subquery: &'q Subquery) -> Self {
        Self {
            root: subquery.root(),
            joins: &[],
            head: subquery.selection().map_or(Head::One, Head::Expr),
            restriction: subquery.restriction(),
            orders: &[],
            distinct: subquery.is_distinct(),
        }
    }
}

struct JoinClause {
    join_type: JoinType,
    table: &'static str,
    alias: SmolStr,
    parent: SmolStr,
    relation: &'static Relation,
}

/// Aliases visible at one SELECT level, plus the joins it must render.
struct Scope<'p> {
    root: &'static EntityMeta,
    entities: IndexMap<SmolStr, &'static EntityMeta>,
    joins: Vec<JoinClause>,
    implicit: HashMap<(SmolStr, &'static str), SmolStr>,
    parent: Option<&'p Scope<'p>>,
}

impl<'p> Scope<'p> {
    fn new(root: &Root, parent: Option<&'p Scope<'p>>) -> Self {
        let mut entities = IndexMap::new();
        entities.insert(SmolStr::new(root.alias()), root.entity());
        Self {
            root: root.entity(),
            entities,
            joins: Vec::new(),
            implicit: HashMap::new(),
            parent,
        }
    }

    fn lookup(&self, alias: &str) -> Option<&'static EntityMeta> {
        self.entities
            .get(alias)
            .copied()
            .or_else(|| self.parent.and_then(|parent| parent.lookup(alias)))
    }

    fn is_taken(&self, alias: &str) -> bool {
        self.entities.contains_key(alias)
            || self.implicit.values().any(|taken| taken == alias)
            || self.parent.is_some_and(|parent| parent.is_taken(alias))
    }

    fn register(&mut self, join: &Join) -> QueryResult<()> {
        let parent = self.entities.get(join.parent()).copied().ok_or_else(|| {
            QueryError::invalid_path(self.root.name, join.parent())
                .with_suggestion("Joins must start from the query root or another join")
        })?;
        let relation = parent
            .relation(join.relation())
            .ok_or_else(|| QueryError::invalid_path(parent.name, join.relation()))?;
        let target = relation.target();

        self.entities.insert(SmolStr::new(join.alias()), target);
        self.joins.push(JoinClause {
            join_type: join.join_type(),
            table: target.table,
            alias: SmolStr::new(join.alias()),
            parent: SmolStr::new(join.parent()),
            relation,
        });
        Ok(())
    }

    fn navigate(&mut self, base: &SmolStr, relation: &'static Relation) -> SmolStr {
        let key = (base.clone(), relation.name);
        if let Some(alias) = self.implicit.get(&key) {
            return alias.clone();
        }

        let mut alias = format_smolstr!("{}_{}", base, relation.name);
        let mut suffix = 2;
        while self.is_taken(&alias) {
            alias = format_smolstr!("{}_{}_{}", base, relation.name, suffix);
            suffix += 1;
        }
        trace!(alias = %alias, relation = relation.name, "implicit join");
        self.joins.push(JoinClause {
            join_type: JoinType::Inner,
            table: relation.target().table,
            alias: alias.clone(),
            parent: base.clone(),
            relation,
        });
        self.implicit.insert(key, alias.clone());
        alias
    }

    /// Resolve a path to its alias and column.
    fn resolve(&mut self, path: &Path) -> QueryResult<(SmolStr, &'static str)> {
        let mut entity = self.lookup(path.base()).ok_or_else(|| {
            QueryError::invalid_path(self.root.name, path.to_string())
                .with_suggestion("Build paths from this query's root, its joins, or an enclosing query")
        })?;
        let mut alias = SmolStr::new(path.base());

        let (attribute, relations) = match path.segments().split_last() {
            Some(split) => split,
            None => return Err(QueryError::invalid_path(entity.name, path.to_string())),
        };

        for segment in relations {
            let relation = entity
                .relation(segment)
                .ok_or_else(|| QueryError::invalid_path(entity.name, segment.as_str()))?;
            alias = self.navigate(&alias, relation);
            entity = relation.target();
        }

        let column = entity
            .columns
            .iter()
            .copied()
            .find(|column| *column == attribute.as_str())
            .ok_or_else(|| QueryError::invalid_path(entity.name, attribute.as_str()))?;
        Ok((alias, column))
    }
}

/// Bind values collected while rendering one top-level statement.
struct Context {
    db_type: DatabaseType,
    params: Vec<Value>,
}

impl Context {
    fn new(db_type: DatabaseType) -> Self {
        Self {
            db_type,
            params: Vec::new(),
        }
    }

    fn bind(&mut self, value: &Value, out: &mut String) {
        self.params.push(value.clone());
        out.push_str(&self.db_type.placeholder(self.params.len()));
    }

    fn ident(&self, name: &str) -> String {
        quote_identifier(name, self.db_type)
    }

    /// Render one SELECT level.
    ///
    /// The select list, WHERE and ORDER BY are rendered before FROM because
    /// they may add implicit joins; FROM itself binds nothing, so the bind
    /// order still follows the text.
    fn statement(&mut self, statement: Statement<'_>, parent: Option<&Scope<'_>>) -> QueryResult<String> {
        let mut scope = Scope::new(statement.root, parent);
        for join in statement.joins {
            scope.register(join)?;
        }

        let mut head = String::new();
        match statement.head {
            Head::Entity => {
                let _ = write!(head, "{}.*", statement.root.alias());
            }
            Head::CountAll => head.push_str("COUNT(*)"),
            Head::Expr(expr) => self.expression(&mut scope, expr, &mut head)?,
            Head::One => head.push('1'),
        }

        let mut filter = String::new();
        if let Some(predicate) = statement.restriction {
            self.predicate(&mut scope, predicate, &mut filter)?;
        }

        let mut order = String::new();
        for (i, directive) in statement.orders.iter().enumerate() {
            if i > 0 {
                order.push_str(", ");
            }
            self.order(&mut scope, directive, &mut order)?;
        }

        let mut sql = String::with_capacity(64 + head.len() + filter.len() + order.len());
        sql.push_str("SELECT ");
        if statement.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&head);
        let _ = write!(
            sql,
            " FROM {} {}",
            self.ident(statement.root.entity().table),
            statement.root.alias()
        );
        for join in &scope.joins {
            let _ = write!(
                sql,
                " {} {} {} ON {}.{} = {}.{}",
                join.join_type.as_sql(),
                self.ident(join.table),
                join.alias,
                join.alias,
                self.ident(join.relation.foreign_column),
                join.parent,
                self.ident(join.relation.local_column),
            );
        }
        if !filter.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&filter);
        }
        if !order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }
        Ok(sql)
    }

    fn subquery(&mut self, scope: &Scope<'_>, subquery: &Subquery, out: &mut String) -> QueryResult<()> {
        let sql = self.statement(Statement::subquery(subquery), Some(scope))?;
        out.push('(');
        out.push_str(&sql);
        out.push(')');
        Ok(())
    }

    fn expression(&mut self, scope: &mut Scope<'_>, expr: &Expression, out: &mut String) -> QueryResult<()> {
        match expr {
            Expression::Path(path) => {
                let (alias, column) = scope.resolve(path)?;
                let _ = write!(out, "{}.{}", alias, self.ident(column));
            }
            Expression::Literal(value) => self.bind(value, out),
            Expression::Lower(inner) => {
                out.push_str("LOWER(");
                self.expression(scope, inner, out)?;
                out.push(')');
            }
            Expression::Upper(inner) => {
                out.push_str("UPPER(");
                self.expression(scope, inner, out)?;
                out.push(')');
            }
        }
        Ok(())
    }

    fn predicate(&mut self, scope: &mut Scope<'_>, predicate: &Predicate, out: &mut String) -> QueryResult<()> {
        match predicate {
            Predicate::Compare { left, op, right } => {
                self.expression(scope, left, out)?;
                let _ = write!(out, " {} ", op.as_sql());
                self.expression(scope, right, out)?;
            }
            Predicate::Between { expr, low, high } => {
                self.expression(scope, expr, out)?;
                out.push_str(" BETWEEN ");
                self.expression(scope, low, out)?;
                out.push_str(" AND ");
                self.expression(scope, high, out)?;
            }
            Predicate::Like { expr, pattern, negated } => {
                self.expression(scope, expr, out)?;
                out.push_str(if *negated { " NOT LIKE " } else { " LIKE " });
                self.expression(scope, pattern, out)?;
            }
            Predicate::In { values, negated, .. } if values.is_empty() => {
                out.push_str(if *negated { "1 = 1" } else { "1 = 0" });
            }
            Predicate::In { expr, values, negated } => {
                if values.iter().any(|value| matches!(value, Value::List(_))) {
                    return Err(QueryError::invalid_filter(
                        "IN list items must be scalar values, not lists",
                    ));
                }
                self.expression(scope, expr, out)?;
                out.push_str(if *negated { " NOT IN (" } else { " IN (" });
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.bind(value, out);
                }
                out.push(')');
            }
            Predicate::InSubquery { expr, subquery, negated } => {
                if subquery.selection().is_none() {
                    return Err(QueryError::invalid_filter(
                        "an IN subquery must select exactly one expression",
                    )
                    .with_model(subquery.root().entity().name)
                    .with_suggestion("Call Subquery::select with the compared attribute"));
                }
                self.expression(scope, expr, out)?;
                out.push_str(if *negated { " NOT IN " } else { " IN " });
                self.subquery(scope, subquery, out)?;
            }
            Predicate::Exists { subquery, negated } => {
                out.push_str(if *negated { "NOT EXISTS " } else { "EXISTS " });
                self.subquery(scope, subquery, out)?;
            }
            Predicate::IsNull { expr, negated } => {
                self.expression(scope, expr, out)?;
                out.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Predicate::And(terms) if terms.is_empty() => out.push_str("1 = 1"),
            Predicate::Or(terms) if terms.is_empty() => out.push_str("1 = 0"),
            Predicate::And(terms) => self.junction(scope, terms, " AND ", out)?,
            Predicate::Or(terms) => self.junction(scope, terms, " OR ", out)?,
            Predicate::Not(inner) => {
                out.push_str("NOT (");
                self.predicate(scope, inner, out)?;
                out.push(')');
            }
        }
        Ok(())
    }

    fn junction(
        &mut self,
        scope: &mut Scope<'_>,
        terms: &[Predicate],
        separator: &str,
        out: &mut String,
    ) -> QueryResult<()> {
        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            let nested = matches!(term, Predicate::And(inner) | Predicate::Or(inner) if inner.len() > 1);
            if nested {
                out.push('(');
            }
            self.predicate(scope, term, out)?;
            if nested {
                out.push(')');
            }
        }
        Ok(())
    }

    fn order(&mut self, scope: &mut Scope<'_>, order: &Order, out: &mut String) -> QueryResult<()> {
        if let (Some(nulls), DatabaseType::MySQL) = (order.nulls, self.db_type) {
            // ISNULL(x) is 1 for nulls, so ascending puts them last.
            let null_rank = match nulls {
                NullsOrder::First => "DESC",
                NullsOrder::Last => "ASC",
            };
            out.push_str("ISNULL(");
            self.expression(scope, &order.expression, out)?;
            let _ = write!(out, ") {}, ", null_rank);
        }

        let mut expr = String::new();
        self.expression(scope, &order.expression, &mut expr)?;

        match (order.nulls, self.db_type) {
            (Some(_), DatabaseType::MySQL) | (None, _) => {
                let _ = write!(out, "{} {}", expr, order.direction.as_sql());
            }
            (Some(nulls), _) => {
                let _ = write!(out, "{} {} {}", expr, order.direction.as_sql(), nulls.as_sql());
            }
        }
        Ok(())
    }
}
