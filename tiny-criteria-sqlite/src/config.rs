//! SQLite configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{SqliteError, SqliteResult};

/// SQLite database configuration.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database location.
    pub path: DatabasePath,
    /// Enforce foreign keys.
    pub foreign_keys: bool,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: Option<u32>,
    /// Cache size (in pages, negative for KiB).
    pub cache_size: Option<i32>,
    /// Synchronous mode.
    pub synchronous: SynchronousMode,
    /// Journal mode.
    pub journal_mode: JournalMode,
    /// Upper bound on a single statement, surfaced as a timeout error.
    pub query_timeout: Option<Duration>,
}

/// Where the database lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabasePath {
    /// In-memory database, private to one engine.
    #[default]
    Memory,
    /// File-based database.
    File(PathBuf),
}

impl DatabasePath {
    /// Check if this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl fmt::Display for DatabasePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str(":memory:"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// SQLite synchronous mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SynchronousMode {
    /// No syncing. Fastest, unsafe on power loss.
    Off,
    /// Sync at critical moments.
    #[default]
    Normal,
    /// Sync on every commit.
    Full,
    /// Full plus directory syncs.
    Extra,
}

impl SynchronousMode {
    /// Get the SQLite pragma value.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
            Self::Extra => "EXTRA",
        }
    }
}

impl FromStr for SynchronousMode {
    type Err = SqliteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Ok(Self::Off),
            "normal" | "1" => Ok(Self::Normal),
            "full" | "2" => Ok(Self::Full),
            "extra" | "3" => Ok(Self::Extra),
            other => Err(SqliteError::config(format!("unknown synchronous mode '{}'", other))),
        }
    }
}

/// SQLite journal mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JournalMode {
    /// Delete the journal after each transaction.
    Delete,
    /// Truncate the journal instead of deleting it.
    Truncate,
    /// Keep the journal file, zero its header on commit.
    Persist,
    /// Keep the journal in memory.
    Memory,
    /// Write-ahead logging.
    #[default]
    Wal,
    /// No journal.
    Off,
}

impl JournalMode {
    /// Get the SQLite pragma value.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Persist => "PERSIST",
            Self::Memory => "MEMORY",
            Self::Wal => "WAL",
            Self::Off => "OFF",
        }
    }
}

impl FromStr for JournalMode {
    type Err = SqliteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "delete" => Ok(Self::Delete),
            "truncate" => Ok(Self::Truncate),
            "persist" => Ok(Self::Persist),
            "memory" => Ok(Self::Memory),
            "wal" => Ok(Self::Wal),
            "off" => Ok(Self::Off),
            other => Err(SqliteError::config(format!("unknown journal mode '{}'", other))),
        }
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: DatabasePath::Memory,
            foreign_keys: true,
            busy_timeout_ms: Some(5000),
            cache_size: Some(-2000),
            synchronous: SynchronousMode::Normal,
            journal_mode: JournalMode::Memory,
            query_timeout: None,
        }
    }
}

fn parse_flag(key: &str, value: &str) -> SqliteResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        _ => Err(SqliteError::config(format!("'{}' expects a boolean, got '{}'", key, value))),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> SqliteResult<T> {
    value
        .parse()
        .map_err(|_| SqliteError::config(format!("'{}' expects a number, got '{}'", key, value)))
}

impl SqliteConfig {
    /// Configuration for an in-memory database.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Configuration for a file-based database, in WAL mode.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            path: DatabasePath::File(path.as_ref().to_path_buf()),
            journal_mode: JournalMode::Wal,
            ..Default::default()
        }
    }

    /// Parse a SQLite URL into configuration.
    ///
    /// Supported formats:
    /// - `sqlite::memory:` or `:memory:` - in-memory database
    /// - `sqlite://path/to/db.sqlite` - file database, relative path
    /// - `sqlite:///absolute/path/db.sqlite` - file database, absolute path
    /// - `sqlite:path` and `file:path` - file database
    ///
    /// Options follow `?`: `mode=memory`, `foreign_keys`, `busy_timeout`,
    /// `cache_size`, `synchronous`, `journal_mode`, `query_timeout` (ms).
    /// Unknown options are ignored; malformed values are errors.
    pub fn from_url(url: impl AsRef<str>) -> SqliteResult<Self> {
        let url = url.as_ref();
        let (location, options) = match url.split_once('?') {
            Some((location, options)) => (location, Some(options)),
            None => (url, None),
        };

        let path = if let Some(path) = location.strip_prefix("sqlite://") {
            if path.is_empty() {
                return Err(SqliteError::config("database path is required"));
            }
            (path != ":memory:").then_some(path)
        } else if let Some(path) = location.strip_prefix("sqlite:") {
            (path != ":memory:").then_some(path)
        } else if let Some(path) = location.strip_prefix("file:") {
            Some(path)
        } else {
            (location != ":memory:").then_some(location)
        };

        let mut config = match path {
            Some("") => return Err(SqliteError::config("database path is required")),
            Some(path) => Self::file(path),
            None => Self::memory(),
        };

        for pair in options.into_iter().flat_map(|o| o.split('&')) {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "mode" if value == "memory" => {
                    config.path = DatabasePath::Memory;
                    config.journal_mode = JournalMode::Memory;
                }
                "foreign_keys" => config.foreign_keys = parse_flag(key, value)?,
                "busy_timeout" => config.busy_timeout_ms = Some(parse_number(key, value)?),
                "cache_size" => config.cache_size = Some(parse_number(key, value)?),
                "synchronous" => config.synchronous = value.parse()?,
                "journal_mode" => config.journal_mode = value.parse()?,
                "query_timeout" => {
                    config.query_timeout = Some(Duration::from_millis(parse_number(key, value)?))
                }
                _ => {}
            }
        }

        Ok(config)
    }

    /// The PRAGMA batch applied when a connection opens.
    pub fn init_sql(&self) -> String {
        let mut sql = String::new();

        sql.push_str(&format!(
            "PRAGMA foreign_keys = {};\n",
            if self.foreign_keys { "ON" } else { "OFF" }
        ));
        sql.push_str(&format!(
            "PRAGMA journal_mode = {};\n",
            self.journal_mode.as_pragma()
        ));
        sql.push_str(&format!(
            "PRAGMA synchronous = {};\n",
            self.synchronous.as_pragma()
        ));
        if let Some(timeout) = self.busy_timeout_ms {
            sql.push_str(&format!("PRAGMA busy_timeout = {};\n", timeout));
        }
        if let Some(cache) = self.cache_size {
            sql.push_str(&format!("PRAGMA cache_size = {};\n", cache));
        }

        sql
    }

    /// Set the database location.
    pub fn path(mut self, path: DatabasePath) -> Self {
        self.path = path;
        self
    }

    /// Enable or disable foreign keys.
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Set the busy timeout in milliseconds.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = Some(ms);
        self
    }

    /// Set the cache size.
    pub fn cache_size(mut self, size: i32) -> Self {
        self.cache_size = Some(size);
        self
    }

    /// Set the synchronous mode.
    pub fn synchronous(mut self, mode: SynchronousMode) -> Self {
        self.synchronous = mode;
        self
    }

    /// Set the journal mode.
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    /// Bound the running time of each statement.
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_memory() {
        let config = SqliteConfig::memory();
        assert!(config.path.is_memory());
        assert_eq!(config.path.to_string(), ":memory:");
        assert_eq!(config.journal_mode, JournalMode::Memory);
    }

    #[test]
    fn test_config_file() {
        let config = SqliteConfig::file("test.db");
        assert!(!config.path.is_memory());
        assert_eq!(config.path.to_string(), "test.db");
        assert_eq!(config.journal_mode, JournalMode::Wal);
    }

    #[test]
    fn test_config_from_url_memory() {
        for url in ["sqlite::memory:", ":memory:", "sqlite://db.sqlite?mode=memory"] {
            let config = SqliteConfig::from_url(url).unwrap();
            assert!(config.path.is_memory(), "{} should be in memory", url);
        }
    }

    #[test]
    fn test_config_from_url_file() {
        let config = SqliteConfig::from_url("sqlite://./test.db").unwrap();
        assert_eq!(config.path, DatabasePath::File(PathBuf::from("./test.db")));

        let config = SqliteConfig::from_url("sqlite:///var/data/app.db").unwrap();
        assert_eq!(config.path.to_string(), "/var/data/app.db");

        let config = SqliteConfig::from_url("file:data.db").unwrap();
        assert_eq!(config.path.to_string(), "data.db");
    }

    #[test]
    fn test_config_from_url_with_options() {
        let config = SqliteConfig::from_url(
            "sqlite://./test.db?foreign_keys=false&busy_timeout=10000&synchronous=full&query_timeout=250",
        )
        .unwrap();

        assert!(!config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, Some(10000));
        assert_eq!(config.synchronous, SynchronousMode::Full);
        assert_eq!(config.query_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_config_from_url_rejects_bad_values() {
        assert!(SqliteConfig::from_url("sqlite://").is_err());
        assert!(SqliteConfig::from_url("sqlite://x.db?busy_timeout=soon").is_err());
        assert!(SqliteConfig::from_url("sqlite://x.db?journal_mode=sideways").is_err());
        assert!(SqliteConfig::from_url("sqlite://x.db?foreign_keys=maybe").is_err());
    }

    #[test]
    fn test_init_sql() {
        let sql = SqliteConfig::file("app.db").init_sql();
        assert!(sql.contains("PRAGMA foreign_keys = ON;"));
        assert!(sql.contains("PRAGMA journal_mode = WAL;"));
        assert!(sql.contains("PRAGMA synchronous = NORMAL;"));
        assert!(sql.contains("PRAGMA busy_timeout = 5000;"));

        let sql = SqliteConfig::memory().foreign_keys(false).init_sql();
        assert!(sql.contains("PRAGMA foreign_keys = OFF;"));
    }

    #[test]
    fn test_builder_pattern() {
        let config = SqliteConfig::memory()
            .foreign_keys(false)
            .busy_timeout(3000)
            .cache_size(-4000)
            .synchronous(SynchronousMode::Full)
            .journal_mode(JournalMode::Truncate)
            .query_timeout(Duration::from_secs(2));

        assert!(!config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, Some(3000));
        assert_eq!(config.cache_size, Some(-4000));
        assert_eq!(config.synchronous, SynchronousMode::Full);
        assert_eq!(config.journal_mode, JournalMode::Truncate);
        assert_eq!(config.query_timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("EXTRA".parse::<SynchronousMode>().unwrap(), SynchronousMode::Extra);
        assert_eq!("wal".parse::<JournalMode>().unwrap(), JournalMode::Wal);
        assert_eq!(JournalMode::Persist.as_pragma(), "PERSIST");
        assert_eq!(SynchronousMode::Off.as_pragma(), "OFF");
    }
}
