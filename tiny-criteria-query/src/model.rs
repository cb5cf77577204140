//! Entity metadata used to resolve attribute paths.
//!
//! Criteria are built from attribute names; the metadata here is what the
//! renderer consults to turn `"customer.address.city"` into joins and a
//! column reference.
//!
//! ```rust
//! use tiny_criteria_query::model::{EntityMeta, Model, Relation};
//!
//! static CUSTOMER: EntityMeta = EntityMeta {
//!     name: "Customer",
//!     table: "customers",
//!     primary_key: &["id"],
//!     columns: &["id", "name"],
//!     relations: &[],
//! };
//!
//! static ORDER: EntityMeta = EntityMeta {
//!     name: "Order",
//!     table: "orders",
//!     primary_key: &["id"],
//!     columns: &["id", "customer_id", "total"],
//!     relations: &[Relation::new("customer", customer_meta, "customer_id", "id")],
//! };
//!
//! fn customer_meta() -> &'static EntityMeta {
//!     &CUSTOMER
//! }
//!
//! assert!(ORDER.has_column("total"));
//! assert_eq!(ORDER.relation("customer").map(|r| r.target().table), Some("customers"));
//! ```

use std::fmt;

/// Static description of an entity.
#[derive(Debug)]
pub struct EntityMeta {
    /// Entity name, used in diagnostics.
    pub name: &'static str,
    /// Backing table.
    pub table: &'static str,
    /// Primary key columns.
    pub primary_key: &'static [&'static str],
    /// Attribute names; each is also its column name.
    pub columns: &'static [&'static str],
    /// Navigable relations.
    pub relations: &'static [Relation],
}

impl EntityMeta {
    /// Check whether `attribute` is a column of this entity.
    pub fn has_column(&self, attribute: &str) -> bool {
        self.columns.contains(&attribute)
    }

    /// Look up a relation by name.
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name == name)
    }
}

impl PartialEq for EntityMeta {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

/// A navigable relation from one entity to another.
///
/// The join condition is `target.foreign_column = source.local_column`,
/// which covers both directions: many-to-one (`customer_id` -> `id`) and
/// one-to-many (`id` -> `order_id`).
#[derive(Clone, Copy)]
pub struct Relation {
    /// Relation (attribute) name.
    pub name: &'static str,
    target: fn() -> &'static EntityMeta,
    /// Column on the owning entity.
    pub local_column: &'static str,
    /// Column on the target entity.
    pub foreign_column: &'static str,
}

impl Relation {
    /// Declare a relation.
    pub const fn new(
        name: &'static str,
        target: fn() -> &'static EntityMeta,
        local_column: &'static str,
        foreign_column: &'static str,
    ) -> Self {
        Self {
            name,
            target,
            local_column,
            foreign_column,
        }
    }

    /// The related entity.
    pub fn target(&self) -> &'static EntityMeta {
        (self.target)()
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("name", &self.name)
            .field("target", &self.target().name)
            .field("local_column", &self.local_column)
            .field("foreign_column", &self.foreign_column)
            .finish()
    }
}

/// An entity that criteria can be built for.
pub trait Model {
    /// Metadata describing the entity.
    fn meta() -> &'static EntityMeta;
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Customer / Address / Order entities shared by the unit tests.

    use serde::Deserialize;

    use super::{EntityMeta, Model, Relation};

    pub static CUSTOMER: EntityMeta = EntityMeta {
        name: "Customer",
        table: "customers",
        primary_key: &["id"],
        columns: &["id", "name", "email", "age", "active", "address_id"],
        relations: &[
            Relation::new("address", address, "address_id", "id"),
            Relation::new("orders", order, "id", "customer_id"),
        ],
    };

    pub static ADDRESS: EntityMeta = EntityMeta {
        name: "Address",
        table: "addresses",
        primary_key: &["id"],
        columns: &["id", "street", "city"],
        relations: &[],
    };

    pub static ORDER: EntityMeta = EntityMeta {
        name: "Order",
        table: "order",
        primary_key: &["id"],
        columns: &["id", "customer_id", "total", "status"],
        relations: &[Relation::new("customer", customer, "customer_id", "id")],
    };

    fn customer() -> &'static EntityMeta {
        &CUSTOMER
    }

    fn address() -> &'static EntityMeta {
        &ADDRESS
    }

    fn order() -> &'static EntityMeta {
        &ORDER
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    pub struct Customer {
        pub id: i64,
        pub name: String,
        pub age: i64,
    }

    impl Model for Customer {
        fn meta() -> &'static EntityMeta {
            &CUSTOMER
        }
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    pub struct Order {
        pub id: i64,
        pub total: f64,
    }

    impl Model for Order {
        fn meta() -> &'static EntityMeta {
            &ORDER
        }
    }
}
