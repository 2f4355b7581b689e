// relaudit-core/src/domain/sql/queries.rs
//
// Count queries behind every check. They stick to plain ANSI SQL
// (COUNT(*), SELECT DISTINCT, INNER JOIN) so DuckDB and DataFusion run the
// same text.

use super::quoter::{ident, ident_list, qualified, table};
use crate::domain::catalog::{ForeignKeyEdge, TableRef};
use crate::domain::dependency::{DependencyCandidate, NullPolicy};

const CHILD: &str = "c";
const PARENT: &str = "p";

fn not_null_predicate(alias: Option<&str>, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| match alias {
            Some(a) => format!("{} IS NOT NULL", qualified(a, c)),
            None => format!("{} IS NOT NULL", ident(c)),
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

pub fn count_rows(t: &TableRef) -> String {
    format!("SELECT COUNT(*) FROM {}", table(t))
}

/// Rows where every listed column is non-null. A NULL in any component
/// excludes the row.
pub fn count_non_null(t: &TableRef, columns: &[String]) -> String {
    format!(
        "SELECT COUNT(*) FROM {} WHERE {}",
        table(t),
        not_null_predicate(None, columns)
    )
}

/// Child rows with a matching parent tuple. The parent side is de-duplicated
/// first so a non-unique parent key cannot inflate the count; NULL never
/// equals anything, so partially-null child tuples never match.
pub fn count_matched(edge: &ForeignKeyEdge) -> String {
    let on = edge
        .child_columns
        .iter()
        .zip(&edge.parent_columns)
        .map(|(c, p)| format!("{} = {}", qualified(CHILD, c), qualified(PARENT, p)))
        .collect::<Vec<_>>()
        .join(" AND ");

    format!(
        "SELECT COUNT(*) FROM {} AS {} INNER JOIN (SELECT DISTINCT {} FROM {}) AS {} ON {}",
        table(&edge.child),
        CHILD,
        ident_list(&edge.parent_columns),
        table(&edge.parent),
        PARENT,
        on
    )
}

/// Distinct tuples over `columns`, optionally restricted to rows whose
/// `not_null` columns are all present.
pub fn count_distinct(t: &TableRef, columns: &[String], not_null: Option<&[String]>) -> String {
    let filter = match not_null {
        Some(cols) if !cols.is_empty() => format!(" WHERE {}", not_null_predicate(None, cols)),
        _ => String::new(),
    };
    format!(
        "SELECT COUNT(*) FROM (SELECT DISTINCT {} FROM {}{}) AS d",
        ident_list(columns),
        table(t),
        filter
    )
}

/// Query texts of one dependency check, in execution order.
pub struct DependencyQueries {
    pub total_rows: String,
    /// `None` when every row counts (nulls included).
    pub determinant_rows: Option<String>,
    pub distinct_determinants: String,
    pub distinct_pairs: String,
}

pub fn dependency_queries(candidate: &DependencyCandidate) -> DependencyQueries {
    let filter = match candidate.null_policy {
        NullPolicy::Exclude => Some(candidate.determinant.as_slice()),
        NullPolicy::Include => None,
    };
    DependencyQueries {
        total_rows: count_rows(&candidate.table),
        determinant_rows: filter.map(|cols| count_non_null(&candidate.table, cols)),
        distinct_determinants: count_distinct(&candidate.table, &candidate.determinant, filter),
        distinct_pairs: count_distinct(&candidate.table, &candidate.pair_columns(), filter),
    }
}
