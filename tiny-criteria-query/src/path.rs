//! Query roots, joins and attribute paths.
//!
//! These are handles, not resolved references: a `Path` records the alias it
//! starts from and the attribute names it navigates. Whether those names
//! exist is checked by the renderer when the query runs.

use smallvec::SmallVec;
use smol_str::SmolStr;
use std::fmt;

use crate::model::EntityMeta;

/// Join type for an explicit join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinType {
    /// Inner join.
    #[default]
    Inner,
    /// Left outer join.
    Left,
    /// Right outer join.
    Right,
}

impl JoinType {
    /// Get the SQL keyword for this join type.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

pub(crate) fn alias_for(id: usize) -> SmolStr {
    smol_str::format_smolstr!("t{}", id)
}

/// The root entity of a query or subquery.
#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    alias: SmolStr,
    entity: &'static EntityMeta,
}

impl Root {
    pub(crate) fn new(id: usize, entity: &'static EntityMeta) -> Self {
        Self {
            alias: alias_for(id),
            entity,
        }
    }

    /// The SQL alias of this root.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The entity this root ranges over.
    pub fn entity(&self) -> &'static EntityMeta {
        self.entity
    }

    /// Navigate to an attribute of the root.
    pub fn get(&self, attribute: &str) -> Path {
        Path::new(self.alias.clone(), attribute)
    }
}

/// An explicit join registered on a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    id: usize,
    alias: SmolStr,
    parent: SmolStr,
    relation: SmolStr,
    join_type: JoinType,
}

impl Join {
    pub(crate) fn new(id: usize, parent: &str, relation: &str, join_type: JoinType) -> Self {
        Self {
            id,
            alias: alias_for(id),
            parent: SmolStr::new(parent),
            relation: SmolStr::new(relation),
            join_type,
        }
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    /// The SQL alias of the joined entity.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Alias of the source this join navigates from.
    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// The relation name the join follows.
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// The join type.
    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    /// Navigate to an attribute of the joined entity.
    pub fn get(&self, attribute: &str) -> Path {
        Path::new(self.alias.clone(), attribute)
    }
}

/// A reference to an attribute, reached from a root or join alias.
///
/// All segments but the last are relation navigations; the last one is the
/// attribute itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    base: SmolStr,
    segments: SmallVec<[SmolStr; 2]>,
}

impl Path {
    fn new(base: SmolStr, attribute: &str) -> Self {
        let mut segments = SmallVec::new();
        segments.push(SmolStr::new(attribute));
        Self { base, segments }
    }

    /// Navigate further from this path.
    pub fn get(mut self, attribute: &str) -> Path {
        self.segments.push(SmolStr::new(attribute));
        self
    }

    /// The alias this path starts from.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Navigated relation names followed by the attribute name.
    pub fn segments(&self) -> &[SmolStr] {
        &self.segments
    }

    /// The terminal attribute name.
    pub fn attribute(&self) -> &str {
        self.segments.last().map(SmolStr::as_str).unwrap_or_default()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)?;
        for segment in &self.segments {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}
