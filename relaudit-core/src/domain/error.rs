// relaudit-core/src/domain/error.rs

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Invalid table name '{0}'")]
    #[diagnostic(
        code(relaudit::domain::table_name),
        help("Use `table` or `schema.table`.")
    )]
    InvalidTableName(String),

    #[error("Table '{0}' appears twice in the catalog")]
    #[diagnostic(code(relaudit::domain::duplicate_table))]
    DuplicateTable(String),

    #[error("Table '{0}' not found in catalog")]
    #[diagnostic(
        code(relaudit::domain::unknown_table),
        help("Check the schema name and the spelling of the table.")
    )]
    UnknownTable(String),

    #[error("Column '{column}' not found in table '{table}'")]
    #[diagnostic(code(relaudit::domain::unknown_column))]
    UnknownColumn { table: String, column: String },

    #[error("Invalid candidate {subject}: {reason}")]
    #[diagnostic(code(relaudit::domain::candidate))]
    InvalidCandidate { subject: String, reason: String },
}

/// A single check that could not be measured. Recorded inside the check's
/// result so the rest of the run is unaffected.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("query failed: {reason}")]
pub struct QueryError {
    pub reason: String,
}

impl QueryError {
    pub const TIMEOUT: &'static str = "timeout";

    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn timeout() -> Self {
        Self::new(Self::TIMEOUT)
    }

    pub fn is_timeout(&self) -> bool {
        self.reason == Self::TIMEOUT
    }
}
