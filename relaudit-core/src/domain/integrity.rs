// relaudit-core/src/domain/integrity.rs

use serde::{Deserialize, Serialize};

use crate::domain::catalog::ForeignKeyEdge;
use crate::domain::error::QueryError;

/// Outcome of checking one foreign-key edge.
///
/// `matched_rows <= non_null_child_rows` and
/// `violation_count == non_null_child_rows - matched_rows` always hold; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityResult {
    #[serde(flatten)]
    pub edge: ForeignKeyEdge,
    #[serde(rename = "total_rows")]
    pub total_child_rows: u64,
    pub non_null_child_rows: u64,
    pub matched_rows: u64,
    pub violation_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sql: Vec<String>,
}

impl IntegrityResult {
    /// Builds a measured result. A matched count above the non-null count can
    /// only come from a broken count query and is reported as a failure.
    pub fn measured(
        edge: ForeignKeyEdge,
        total_child_rows: u64,
        non_null_child_rows: u64,
        matched_rows: u64,
        sql: Vec<String>,
    ) -> Self {
        if matched_rows > non_null_child_rows || non_null_child_rows > total_child_rows {
            let reason = format!(
                "inconsistent counts (total={}, non_null={}, matched={})",
                total_child_rows, non_null_child_rows, matched_rows
            );
            return Self::failed(edge, QueryError::new(reason), sql);
        }

        Self {
            edge,
            total_child_rows,
            non_null_child_rows,
            matched_rows,
            violation_count: non_null_child_rows - matched_rows,
            error: None,
            sql,
        }
    }

    pub fn failed(edge: ForeignKeyEdge, error: QueryError, sql: Vec<String>) -> Self {
        Self {
            edge,
            total_child_rows: 0,
            non_null_child_rows: 0,
            matched_rows: 0,
            violation_count: 0,
            error: Some(error),
            sql,
        }
    }

    pub fn passed(&self) -> bool {
        self.error.is_none() && self.violation_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{EdgeOrigin, TableRef};

    fn edge() -> ForeignKeyEdge {
        ForeignKeyEdge::new(
            TableRef::new("main", "enrollments"),
            vec!["sid".into()],
            TableRef::new("main", "students"),
            vec!["sid".into()],
            EdgeOrigin::Manual,
        )
    }

    #[test]
    fn test_violation_is_difference() {
        let r = IntegrityResult::measured(edge(), 10, 8, 7, vec![]);
        assert_eq!(r.violation_count, 1);
        assert!(!r.passed());
    }

    #[test]
    fn test_empty_child_has_no_violations() {
        let r = IntegrityResult::measured(edge(), 0, 0, 0, vec![]);
        assert_eq!(r.violation_count, 0);
        assert!(r.passed());
    }

    #[test]
    fn test_empty_parent_violates_every_non_null_row() {
        let r = IntegrityResult::measured(edge(), 5, 4, 0, vec![]);
        assert_eq!(r.violation_count, r.non_null_child_rows);
    }

    #[test]
    fn test_inconsistent_counts_become_failure() {
        let r = IntegrityResult::measured(edge(), 5, 4, 6, vec![]);
        assert!(r.error.is_some());
        assert_eq!(r.violation_count, 0);
        assert!(!r.passed());
    }
}
