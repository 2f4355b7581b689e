// relaudit-core/src/domain/dependency.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::catalog::TableRef;
use crate::domain::error::{DomainError, QueryError};

/// How rows with a NULL in any determinant column are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NullPolicy {
    /// Rows with a NULL determinant component are ignored.
    #[default]
    Exclude,
    /// NULL is treated as one more determinant value.
    Include,
}

/// Candidate functional dependency `determinant -> dependent` on one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyCandidate {
    pub table: TableRef,
    #[serde(rename = "determinant_columns")]
    pub determinant: Vec<String>,
    #[serde(rename = "dependent_columns")]
    pub dependent: Vec<String>,
    #[serde(default)]
    pub null_policy: NullPolicy,
}

impl DependencyCandidate {
    pub fn new(table: TableRef, determinant: Vec<String>, dependent: Vec<String>) -> Self {
        Self {
            table,
            determinant,
            dependent,
            null_policy: NullPolicy::default(),
        }
    }

    pub fn with_null_policy(mut self, policy: NullPolicy) -> Self {
        self.null_policy = policy;
        self
    }

    /// Shape checks that need no catalog: both sides non-empty, no column
    /// repeated, and no column on both sides.
    pub fn validate_shape(&self) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidCandidate {
            subject: self.to_string(),
            reason: reason.to_string(),
        };

        if self.determinant.is_empty() {
            return Err(invalid("determinant column set is empty"));
        }
        if self.dependent.is_empty() {
            return Err(invalid("dependent column set is empty"));
        }
        let all: Vec<&String> = self.determinant.iter().chain(&self.dependent).collect();
        for (i, col) in all.iter().enumerate() {
            if all[..i].contains(col) {
                return Err(invalid(&format!("column '{}' listed more than once", col)));
            }
        }
        Ok(())
    }

    /// Determinant followed by dependent columns, the projection of the pair count.
    pub fn pair_columns(&self) -> Vec<String> {
        self.determinant
            .iter()
            .chain(&self.dependent)
            .cloned()
            .collect()
    }
}

impl fmt::Display for DependencyCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {{{}}} -> {{{}}}",
            self.table,
            self.determinant.join(", "),
            self.dependent.join(", ")
        )
    }
}

/// Outcome of checking one dependency candidate.
///
/// `holds` is `distinct_determinant_count == distinct_pair_count`; `trivial`
/// marks a pass that only comes from an empty table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyResult {
    #[serde(flatten)]
    pub candidate: DependencyCandidate,
    pub total_rows: u64,
    /// Rows that survive the null policy.
    pub determinant_rows: u64,
    pub distinct_determinant_count: u64,
    pub distinct_pair_count: u64,
    pub holds: bool,
    pub trivial: bool,
    /// The determinant alone identifies every row of the table.
    pub candidate_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sql: Vec<String>,
}

impl DependencyResult {
    pub fn measured(
        candidate: DependencyCandidate,
        total_rows: u64,
        determinant_rows: u64,
        distinct_determinant_count: u64,
        distinct_pair_count: u64,
        sql: Vec<String>,
    ) -> Self {
        let consistent = determinant_rows <= total_rows
            && distinct_determinant_count <= determinant_rows
            && distinct_determinant_count <= distinct_pair_count
            && distinct_pair_count <= determinant_rows;
        if !consistent {
            let reason = format!(
                "inconsistent counts (rows={}, determinant_rows={}, determinants={}, pairs={})",
                total_rows, determinant_rows, distinct_determinant_count, distinct_pair_count
            );
            return Self::failed(candidate, QueryError::new(reason), sql);
        }

        Self {
            candidate,
            total_rows,
            determinant_rows,
            distinct_determinant_count,
            distinct_pair_count,
            holds: distinct_determinant_count == distinct_pair_count,
            trivial: total_rows == 0,
            candidate_key: distinct_determinant_count == total_rows,
            error: None,
            sql,
        }
    }

    pub fn failed(candidate: DependencyCandidate, error: QueryError, sql: Vec<String>) -> Self {
        Self {
            candidate,
            total_rows: 0,
            determinant_rows: 0,
            distinct_determinant_count: 0,
            distinct_pair_count: 0,
            holds: false,
            trivial: false,
            candidate_key: false,
            error: Some(error),
            sql,
        }
    }

    pub fn passed(&self) -> bool {
        self.error.is_none() && self.holds
    }

    /// Some determinant value occurs on more than one row.
    pub fn determinant_repeats(&self) -> bool {
        self.distinct_determinant_count < self.determinant_rows
    }

    /// A dependency from a repeating non-key determinant: the shape the
    /// normalization sweep reports as a violation.
    pub fn is_transitive_violation(&self) -> bool {
        self.passed() && !self.trivial && self.determinant_repeats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payments() -> DependencyCandidate {
        DependencyCandidate::new(
            TableRef::new("main", "payments"),
            vec!["sid".into()],
            vec!["amount".into()],
        )
    }

    #[test]
    fn test_holds_when_counts_match() {
        let r = DependencyResult::measured(payments(), 3, 3, 3, 3, vec![]);
        assert!(r.holds);
        assert!(!r.trivial);
        assert!(r.candidate_key);
        assert!(r.passed());
    }

    #[test]
    fn test_broken_when_one_determinant_maps_to_two_values() {
        let r = DependencyResult::measured(payments(), 4, 4, 3, 4, vec![]);
        assert!(!r.holds);
        assert!(r.distinct_pair_count > r.distinct_determinant_count);
    }

    #[test]
    fn test_empty_table_is_trivial_pass() {
        let r = DependencyResult::measured(payments(), 0, 0, 0, 0, vec![]);
        assert!(r.holds);
        assert!(r.trivial);
        assert!(r.passed());
        assert!(!r.is_transitive_violation());
    }

    #[test]
    fn test_transitive_violation_needs_repeats() {
        // name -> level holds, and a name repeats: the classic transitive dependency.
        let r = DependencyResult::measured(payments(), 4, 4, 2, 2, vec![]);
        assert!(r.is_transitive_violation());

        // Every determinant value unique: holds, but only because it is a key.
        let r = DependencyResult::measured(payments(), 4, 4, 4, 4, vec![]);
        assert!(!r.is_transitive_violation());
    }

    #[test]
    fn test_inconsistent_counts_become_failure() {
        let r = DependencyResult::measured(payments(), 2, 2, 3, 3, vec![]);
        assert!(r.error.is_some());
        assert!(!r.passed());
    }

    #[test]
    fn test_shape_validation() {
        assert!(payments().validate_shape().is_ok());

        let mut c = payments();
        c.dependent.clear();
        assert!(c.validate_shape().is_err());

        let mut c = payments();
        c.dependent.push("sid".into());
        assert!(matches!(
            c.validate_shape(),
            Err(DomainError::InvalidCandidate { .. })
        ));
    }
}
