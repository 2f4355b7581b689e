// relaudit-core/src/ports/connector.rs

// What the audit needs from a database, without knowing which engine answers.
// Every check talks to the engine through this trait and nothing else.

use async_trait::async_trait;

use crate::domain::catalog::{ColumnRef, ForeignKeyEdge, TableRef};
use crate::error::RelauditError;

#[async_trait]
pub trait Connector: Send + Sync {
    fn engine_name(&self) -> &str;

    /// Schema used for unqualified table names.
    fn default_schema(&self) -> &str;

    /// A fresh connection to the same database. Each worker owns the session
    /// it opens; sessions are never shared between concurrent queries.
    async fn open_session(&self) -> Result<Box<dyn Connector>, RelauditError>;

    async fn execute(&self, query: &str) -> Result<(), RelauditError>;

    /// First column of the first row, as a non-negative count.
    async fn query_scalar(&self, query: &str) -> Result<u64, RelauditError>;

    // --- Introspection ---

    async fn list_tables(&self, schema: &str) -> Result<Vec<TableRef>, RelauditError>;

    async fn fetch_columns(&self, table: &TableRef) -> Result<Vec<ColumnRef>, RelauditError>;

    /// Declared primary-key columns in key order; empty when none is declared.
    async fn fetch_primary_key(&self, table: &TableRef) -> Result<Vec<String>, RelauditError>;

    /// Declared foreign keys whose child lives in `schema`.
    async fn fetch_foreign_keys(&self, schema: &str) -> Result<Vec<ForeignKeyEdge>, RelauditError>;
}
