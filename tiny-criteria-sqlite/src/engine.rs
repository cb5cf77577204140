//! SQLite query engine implementation.

use std::future::Future;

use futures::future::BoxFuture;
use rusqlite::types::Value as SqlValue;
use tokio_rusqlite::Connection;
use tracing::{debug, instrument, warn};

use tiny_criteria_query::{
    CriteriaQuery, QueryEngine, QueryError, QueryResult, Row, SqlRenderer, TypedQuery, Value,
};

use crate::config::{DatabasePath, SqliteConfig};
use crate::error::{SqliteError, SqliteResult};
use crate::types::{row_to_json, value_to_sqlite};

/// Executes criteria queries against one SQLite connection.
///
/// Statements run on the connection's background thread; clones share the
/// same connection.
#[derive(Clone)]
pub struct SqliteEngine {
    conn: Connection,
    config: SqliteConfig,
    renderer: SqlRenderer,
}

impl SqliteEngine {
    /// Open a database and apply the configuration's PRAGMAs.
    #[instrument(skip(config), fields(path = %config.path))]
    pub async fn open(config: SqliteConfig) -> SqliteResult<Self> {
        let conn = match &config.path {
            DatabasePath::Memory => Connection::open_in_memory().await,
            DatabasePath::File(path) => Connection::open(path.clone()).await,
        }
        .map_err(|e| SqliteError::connection(format!("{}: {}", config.path, e)))?;

        let init_sql = config.init_sql();
        conn.call(move |conn| {
            conn.execute_batch(&init_sql)?;
            Ok(())
        })
        .await?;

        debug!("SQLite database opened");
        Ok(Self {
            conn,
            config,
            renderer: SqlRenderer::sqlite(),
        })
    }

    /// Open a fresh in-memory database.
    pub async fn memory() -> SqliteResult<Self> {
        Self::open(SqliteConfig::memory()).await
    }

    /// Open a database from a URL; see [`SqliteConfig::from_url`].
    pub async fn from_url(url: impl AsRef<str>) -> SqliteResult<Self> {
        Self::open(SqliteConfig::from_url(url)?).await
    }

    /// The configuration this engine was opened with.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// The renderer used for criteria queries.
    pub fn renderer(&self) -> SqlRenderer {
        self.renderer
    }

    /// Await `call` under the configured query timeout.
    ///
    /// On expiry the running statement is interrupted so the connection
    /// thread is free for the next call.
    async fn bounded<T>(&self, call: impl Future<Output = SqliteResult<T>>) -> SqliteResult<T> {
        let Some(limit) = self.config.query_timeout else {
            return call.await;
        };

        let interrupt = self.conn.call(|conn| Ok(conn.get_interrupt_handle())).await?;
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => {
                interrupt.interrupt();
                warn!(timeout_ms = limit.as_millis() as u64, "Query timed out, statement interrupted");
                Err(SqliteError::Timeout(limit.as_millis() as u64))
            }
        }
    }

    /// Run a batch of statements without parameters, e.g. schema setup.
    #[instrument(skip(self, sql))]
    pub async fn execute_batch(&self, sql: &str) -> SqliteResult<()> {
        let sql = sql.to_string();
        debug!(sql = %sql, "Executing batch");

        self.bounded(async {
            self.conn
                .call(move |conn| Ok(conn.execute_batch(&sql)?))
                .await
                .map_err(SqliteError::from)
        })
        .await
    }

    /// Run one statement and return its rows.
    #[instrument(skip(self, sql, params), fields(params = params.len()))]
    pub async fn query_sql(&self, sql: &str, params: Vec<Value>) -> SqliteResult<Vec<Row>> {
        let params = params
            .iter()
            .map(value_to_sqlite)
            .collect::<SqliteResult<Vec<SqlValue>>>()?;
        let sql = sql.to_string();
        debug!(sql = %sql, "Executing query");

        let rows = self
            .bounded(async {
                self.conn
                    .call(move |conn| {
                        let mut stmt = conn.prepare(&sql)?;
                        let columns: Vec<String> =
                            stmt.column_names().iter().map(|s| s.to_string()).collect();

                        let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
                            row_to_json(row, &columns)
                        })?;
                        Ok(rows.collect::<Result<Vec<_>, _>>()?)
                    })
                    .await
                    .map_err(SqliteError::from)
            })
            .await?;

        debug!(rows = rows.len(), "Query complete");
        Ok(rows)
    }

    async fn count_sql(&self, sql: &str, params: Vec<Value>) -> SqliteResult<u64> {
        let rows = self.query_sql(sql, params).await?;
        let count = rows
            .first()
            .and_then(|row| row.values().next())
            .and_then(|value| value.as_u64())
            .ok_or_else(|| SqliteError::type_conversion("COUNT(*) returned no integer"))?;
        Ok(count)
    }

    async fn fetch_rows(&self, query: &TypedQuery) -> QueryResult<Vec<Row>> {
        let (sql, params) = self.renderer.render_select(query)?;
        self.query_sql(&sql, params)
            .await
            .map_err(|e| QueryError::from(e).with_sql(&sql))
    }

    async fn fetch_count(&self, query: &CriteriaQuery) -> QueryResult<u64> {
        let (sql, params) = self.renderer.render_count(query)?;
        self.count_sql(&sql, params)
            .await
            .map_err(|e| QueryError::from(e).with_sql(&sql))
    }
}

impl QueryEngine for SqliteEngine {
    fn query_rows<'a>(&'a self, query: &'a TypedQuery) -> BoxFuture<'a, QueryResult<Vec<Row>>> {
        Box::pin(self.fetch_rows(query))
    }

    fn query_count<'a>(&'a self, query: &'a CriteriaQuery) -> BoxFuture<'a, QueryResult<u64>> {
        Box::pin(self.fetch_count(query))
    }
}

impl std::fmt::Debug for SqliteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEngine")
            .field("path", &self.config.path)
            .field("renderer", &self.renderer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use std::time::Duration;
    use tiny_criteria_query::{EntityMeta, ErrorCode, JoinType, Model, Relation};

    static AUTHOR: EntityMeta = EntityMeta {
        name: "Author",
        table: "authors",
        primary_key: &["id"],
        columns: &["id", "name", "active"],
        relations: &[Relation::new("books", book, "id", "author_id")],
    };

    static BOOK: EntityMeta = EntityMeta {
        name: "Book",
        table: "books",
        primary_key: &["id"],
        columns: &["id", "author_id", "title", "pages"],
        relations: &[Relation::new("author", author, "author_id", "id")],
    };

    fn author() -> &'static EntityMeta {
        &AUTHOR
    }

    fn book() -> &'static EntityMeta {
        &BOOK
    }

    #[derive(Debug, Deserialize)]
    struct Author {
        id: i64,
        name: String,
        #[serde(deserialize_with = "crate::types::bool_from_int")]
        active: bool,
    }

    impl Model for Author {
        fn meta() -> &'static EntityMeta {
            &AUTHOR
        }
    }

    async fn seeded() -> SqliteEngine {
        let engine = SqliteEngine::memory().await.unwrap();
        engine
            .execute_batch(
                "CREATE TABLE authors (id INTEGER PRIMARY KEY, name TEXT NOT NULL, active INTEGER NOT NULL);
                 CREATE TABLE books (id INTEGER PRIMARY KEY, author_id INTEGER NOT NULL REFERENCES authors(id),
                                     title TEXT NOT NULL, pages INTEGER);
                 INSERT INTO authors VALUES (1, 'Ursula', 1), (2, 'Italo', 1), (3, 'Anon', 0);
                 INSERT INTO books VALUES (1, 1, 'Earthsea', 200), (2, 1, 'Lathe', 180),
                                          (3, 2, 'Cities', 160), (4, 3, 'Untitled', NULL);",
            )
            .await
            .unwrap();
        engine
    }

    #[tokio::test]
    async fn test_query_sql_with_params() {
        let engine = seeded().await;
        let rows = engine
            .query_sql(
                "SELECT name FROM authors WHERE active = ? AND id > ? ORDER BY id",
                vec![Value::Bool(true), Value::Int(1)],
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Italo");
    }

    #[tokio::test]
    async fn test_list_through_facade() {
        let engine = seeded().await;
        let authors: Vec<Author> = engine
            .criteria::<Author>()
            .eq("active", true)
            .add_order("name", false)
            .list()
            .await
            .unwrap();

        let names: Vec<_> = authors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Ursula", "Italo"]);
        assert!(authors.iter().all(|a| a.active));
    }

    #[tokio::test]
    async fn test_distinct_count_over_one_to_many_join() {
        let engine = seeded().await;

        let plain = engine
            .criteria::<Author>()
            .join("books", JoinType::Inner)
            .gt("books.pages", 150)
            .count()
            .await
            .unwrap();
        assert_eq!(plain, 3);

        let distinct = engine
            .criteria::<Author>()
            .join("books", JoinType::Inner)
            .gt("books.pages", 150)
            .distinct(true)
            .count()
            .await
            .unwrap();
        assert_eq!(distinct, 2);
    }

    #[tokio::test]
    async fn test_unique_result() {
        let engine = seeded().await;
        let author = engine
            .criteria::<Author>()
            .eq("id", 3)
            .unique_result()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(author.id, 3);
        assert!(!author.active);

        let missing = engine
            .criteria::<Author>()
            .eq("id", 99)
            .unique_result()
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_driver_errors_carry_sql() {
        let engine = SqliteEngine::memory().await.unwrap();
        let err = engine.criteria::<Author>().list().await.unwrap_err();

        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(
            err.context.sql.as_deref(),
            Some("SELECT t0.* FROM authors t0")
        );
    }

    #[tokio::test]
    async fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.db");

        let engine = SqliteEngine::open(SqliteConfig::file(&path)).await.unwrap();
        engine
            .execute_batch("CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (1), (2);")
            .await
            .unwrap();
        drop(engine);

        let reopened = SqliteEngine::from_url(format!("sqlite://{}", path.display()))
            .await
            .unwrap();
        let rows = reopened
            .query_sql("SELECT COUNT(*) AS n FROM t", Vec::new())
            .await
            .unwrap();
        assert_eq!(rows[0]["n"], 2);
    }

    #[tokio::test]
    async fn test_missing_directory_is_connection_error() {
        let err = SqliteEngine::open(SqliteConfig::file("/nonexistent/dir/x.db"))
            .await
            .unwrap_err();
        assert!(matches!(err, SqliteError::Connection(_)));
    }

    #[tokio::test]
    async fn test_query_timeout_frees_connection() {
        let engine = SqliteEngine::open(
            SqliteConfig::memory().query_timeout(Duration::from_millis(50)),
        )
        .await
        .unwrap();

        let err = engine
            .query_sql(
                "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 50000000)
                 SELECT COUNT(*) FROM c",
                Vec::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SqliteError::Timeout(50)));
        assert!(QueryError::from(err).is_timeout());

        let rows = engine.query_sql("SELECT 1 AS one", Vec::new()).await.unwrap();
        assert_eq!(rows[0]["one"], 1);
    }
}
