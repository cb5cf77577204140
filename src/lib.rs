//! # tiny-criteria
//!
//! A fluent, null-tolerant criteria query builder for Rust.
//!
//! tiny-criteria provides:
//! - A chainable facade over a criteria expression model
//! - Skipping of absent filter values, so optional filters need no branching
//! - Dotted attribute paths that navigate relations with implicit joins
//! - Paged listing, unique lookup and counting through one engine seam
//! - A SQLite engine (default `sqlite` feature)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tiny_criteria::prelude::*;
//! use tiny_criteria::sqlite::SqliteEngine;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     tiny_criteria::logging::init();
//!
//!     let engine = SqliteEngine::from_url("sqlite://./shop.db").await?;
//!     let city: Option<&str> = None;
//!
//!     let customers: Vec<Customer> = engine
//!         .criteria::<Customer>()
//!         .ilike("name", "jo%")
//!         .eq("address.city", city)
//!         .add_order("name", true)
//!         .first_result(20)
//!         .max_results(10)
//!         .list()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use tiny_criteria_query::*;

/// SQLite engine.
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite {
    pub use tiny_criteria_sqlite::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tiny_criteria_query::prelude::*;

    #[cfg(feature = "sqlite")]
    pub use tiny_criteria_sqlite::SqliteEngine;
}
