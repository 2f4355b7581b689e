// relaudit-core/src/domain/catalog/edge.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use super::table::TableRef;

/// Where a foreign-key edge came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeOrigin {
    /// Declared as a constraint in the database catalog.
    Declared,
    /// Supplied by the caller (audit configuration).
    #[default]
    Manual,
    /// Guessed from column naming conventions.
    Inferred,
}

/// Directed child → parent reference. Composite keys list their columns
/// pairwise: `child_columns[i]` references `parent_columns[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyEdge {
    pub child: TableRef,
    pub child_columns: Vec<String>,
    pub parent: TableRef,
    pub parent_columns: Vec<String>,
    #[serde(default)]
    pub origin: EdgeOrigin,
}

impl ForeignKeyEdge {
    pub fn new(
        child: TableRef,
        child_columns: Vec<String>,
        parent: TableRef,
        parent_columns: Vec<String>,
        origin: EdgeOrigin,
    ) -> Self {
        Self {
            child,
            child_columns,
            parent,
            parent_columns,
            origin,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.child_columns.len() > 1
    }

    /// Two edges are the same relationship regardless of how they were found.
    pub fn same_relationship(&self, other: &ForeignKeyEdge) -> bool {
        self.child == other.child
            && self.child_columns == other.child_columns
            && self.parent == other.parent
            && self.parent_columns == other.parent_columns
    }
}

impl fmt::Display for ForeignKeyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}) -> {}({})",
            self.child,
            self.child_columns.join(", "),
            self.parent,
            self.parent_columns.join(", ")
        )
    }
}
