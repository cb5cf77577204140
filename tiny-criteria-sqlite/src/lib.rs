//! SQLite engine for tiny-criteria.
//!
//! This crate executes criteria queries against SQLite, using `tokio-rusqlite`
//! for asynchronous database access.
//!
//! # Features
//!
//! - [`QueryEngine`](tiny_criteria_query::QueryEngine) implementation for the fluent facade
//! - In-memory and file-based databases
//! - PRAGMA configuration from a URL
//! - Optional per-query timeout
//!
//! # Example
//!
//! ```rust,ignore
//! use tiny_criteria_query::prelude::*;
//! use tiny_criteria_sqlite::SqliteEngine;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = SqliteEngine::from_url("sqlite://./shop.db?mode=rwc&busy_timeout=2000").await?;
//!
//!     let adults: Vec<Customer> = engine.criteria::<Customer>().ge("age", 18).list().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

pub use config::{DatabasePath, JournalMode, SqliteConfig, SynchronousMode};
pub use engine::SqliteEngine;
pub use error::{SqliteError, SqliteResult};
