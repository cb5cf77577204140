//! Offset pagination for the execution request.
//!
//! ```rust
//! use tiny_criteria_query::{DatabaseType, Pagination};
//!
//! let page = Pagination::new().first_result(20).max_results(20);
//! assert_eq!(page.to_sql(DatabaseType::PostgreSQL), "LIMIT 20 OFFSET 20");
//! assert_eq!(page.row_range(), Some(20..40));
//!
//! // SQLite cannot express OFFSET without LIMIT.
//! let skip = Pagination::new().first_result(5);
//! assert_eq!(skip.to_sql(DatabaseType::SQLite), "LIMIT -1 OFFSET 5");
//! ```

use std::fmt::Write;
use std::ops::Range;

use crate::sql::DatabaseType;

/// Pagination bounds: rows `[first_result, first_result + max_results)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Zero-based position of the first row.
    pub first_result: Option<u64>,
    /// Maximum number of rows.
    pub max_results: Option<u64>,
}

impl Pagination {
    /// Create a new pagination with no limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the position of the first row.
    pub fn first_result(mut self, first_result: u64) -> Self {
        self.first_result = Some(first_result);
        self
    }

    /// Set the maximum number of rows.
    pub fn max_results(mut self, max_results: u64) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Check if pagination is specified.
    pub fn is_empty(&self) -> bool {
        self.first_result.is_none() && self.max_results.is_none()
    }

    /// Zero-based row range selected, when bounded.
    pub fn row_range(&self) -> Option<Range<u64>> {
        let start = self.first_result.unwrap_or(0);
        self.max_results
            .map(|max| start..start.saturating_add(max))
    }

    /// Generate the LIMIT/OFFSET clause for a dialect.
    pub fn to_sql(&self, db_type: DatabaseType) -> String {
        let mut sql = String::with_capacity(48);
        self.write_sql(db_type, &mut sql);
        sql
    }

    /// Write the LIMIT/OFFSET clause directly to a buffer.
    pub fn write_sql(&self, db_type: DatabaseType, buffer: &mut String) {
        match (self.max_results, self.first_result) {
            (Some(max), Some(first)) => {
                let _ = write!(buffer, "LIMIT {} OFFSET {}", max, first);
            }
            (Some(max), None) => {
                let _ = write!(buffer, "LIMIT {}", max);
            }
            (None, Some(first)) => match db_type {
                DatabaseType::PostgreSQL => {
                    let _ = write!(buffer, "OFFSET {}", first);
                }
                DatabaseType::SQLite => {
                    let _ = write!(buffer, "LIMIT -1 OFFSET {}", first);
                }
                DatabaseType::MySQL => {
                    let _ = write!(buffer, "LIMIT {} OFFSET {}", u64::MAX, first);
                }
            },
            (None, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let page = Pagination::new();
        assert!(page.is_empty());
        assert_eq!(page.to_sql(DatabaseType::PostgreSQL), "");
        assert_eq!(page.row_range(), None);
    }

    #[test]
    fn test_limit_only() {
        let page = Pagination::new().max_results(10);
        assert_eq!(page.to_sql(DatabaseType::SQLite), "LIMIT 10");
        assert_eq!(page.row_range(), Some(0..10));
    }

    #[test]
    fn test_offset_only_per_dialect() {
        let page = Pagination::new().first_result(7);
        assert_eq!(page.to_sql(DatabaseType::PostgreSQL), "OFFSET 7");
        assert_eq!(page.to_sql(DatabaseType::SQLite), "LIMIT -1 OFFSET 7");
        assert_eq!(
            page.to_sql(DatabaseType::MySQL),
            "LIMIT 18446744073709551615 OFFSET 7"
        );
    }

    #[test]
    fn test_rows_twenty_to_thirty_nine() {
        let page = Pagination::new().first_result(20).max_results(20);
        assert_eq!(page.to_sql(DatabaseType::PostgreSQL), "LIMIT 20 OFFSET 20");
        let range = page.row_range().unwrap();
        assert_eq!(range.start, 20);
        assert_eq!(range.end - 1, 39);
    }
}
