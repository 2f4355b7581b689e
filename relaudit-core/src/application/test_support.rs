// relaudit-core/src/application/test_support.rs

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::catalog::{ColumnRef, EdgeOrigin, ForeignKeyEdge, TableRef};
use crate::domain::dependency::DependencyCandidate;
use crate::error::RelauditError;
use crate::infrastructure::adapters::DuckDBConnector;
use crate::ports::connector::Connector;

/// Small campus database with seeded problems:
/// - `enrollments.sid = 4` has no student; one enrollment has a NULL `sid`
/// - `enrollments (12, 'F24')` has no course; one row has a NULL `term`
/// - `students.advisor -> office` is a dependency through a non-key column
pub async fn campus() -> anyhow::Result<DuckDBConnector> {
    let db = DuckDBConnector::new(":memory:")?;
    db.execute(
        "CREATE TABLE students (sid INTEGER PRIMARY KEY, name VARCHAR, advisor VARCHAR, office VARCHAR);
         INSERT INTO students VALUES (1, 'Ada', 'Turing', 'B12'), (2, 'Alan', 'Turing', 'B12'), (3, 'Grace', 'Hopper', 'C7');
         CREATE TABLE courses (cid INTEGER, term VARCHAR, title VARCHAR, PRIMARY KEY (cid, term));
         INSERT INTO courses VALUES (10, 'F24', 'Databases'), (11, 'F24', 'Compilers');
         CREATE TABLE enrollments (sid INTEGER, cid INTEGER, term VARCHAR);
         INSERT INTO enrollments VALUES
             (1, 10, 'F24'), (2, 11, 'F24'), (4, 10, 'F24'),
             (NULL, 11, 'F24'), (3, 10, NULL), (3, 12, 'F24');
         CREATE TABLE payments (pid INTEGER PRIMARY KEY, customer_id INTEGER, customer_name VARCHAR, coupon VARCHAR, discount INTEGER);
         INSERT INTO payments VALUES (1, 100, 'Ann', NULL, 0), (2, 100, 'Ann', 'X', 5), (3, 200, 'Bob', 'X', 5), (4, 300, 'Cid', NULL, 10);
         CREATE TABLE empty_log (id INTEGER, msg VARCHAR);",
    )
    .await?;
    Ok(db)
}

pub fn edge(child: &str, child_cols: &[&str], parent: &str, parent_cols: &[&str]) -> ForeignKeyEdge {
    ForeignKeyEdge::new(
        TableRef::new("main", child),
        child_cols.iter().map(|c| c.to_string()).collect(),
        TableRef::new("main", parent),
        parent_cols.iter().map(|c| c.to_string()).collect(),
        EdgeOrigin::Manual,
    )
}

pub fn fd(table: &str, determinant: &[&str], dependent: &[&str]) -> DependencyCandidate {
    DependencyCandidate::new(
        TableRef::new("main", table),
        determinant.iter().map(|c| c.to_string()).collect(),
        dependent.iter().map(|c| c.to_string()).collect(),
    )
}

/// Ten billion joined rows: runs far past any test deadline unless interrupted.
pub const HEAVY_QUERY: &str = "SELECT COUNT(*) FROM range(100000) a, range(100000) b \
                               WHERE (a.range * b.range) % 7 = 3";

/// Wraps a real connector and injects failures: queries containing
/// `fail_on` error out, queries containing `stall_on` sleep first, queries
/// containing `heavy_on` are swapped for a long-running join on the engine.
pub struct FlakyConnector {
    inner: Box<dyn Connector>,
    fail_on: Option<String>,
    stall_on: Option<(String, Duration)>,
    heavy_on: Option<String>,
    broken_catalog: bool,
    pub queries: Arc<Mutex<Vec<String>>>,
}

impl FlakyConnector {
    pub fn new(inner: impl Connector + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            fail_on: None,
            stall_on: None,
            heavy_on: None,
            broken_catalog: false,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn fail_on(mut self, marker: &str) -> Self {
        self.fail_on = Some(marker.to_string());
        self
    }

    pub fn stall_on(mut self, marker: &str, delay: Duration) -> Self {
        self.stall_on = Some((marker.to_string(), delay));
        self
    }

    pub fn heavy_on(mut self, marker: &str) -> Self {
        self.heavy_on = Some(marker.to_string());
        self
    }

    pub fn broken_catalog(mut self) -> Self {
        self.broken_catalog = true;
        self
    }

    fn catalog_guard(&self) -> Result<(), RelauditError> {
        if self.broken_catalog {
            return Err(RelauditError::InternalError("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Connector for FlakyConnector {
    fn engine_name(&self) -> &str {
        "flaky"
    }

    fn default_schema(&self) -> &str {
        self.inner.default_schema()
    }

    async fn open_session(&self) -> Result<Box<dyn Connector>, RelauditError> {
        Ok(Box::new(FlakyConnector {
            inner: self.inner.open_session().await?,
            fail_on: self.fail_on.clone(),
            stall_on: self.stall_on.clone(),
            heavy_on: self.heavy_on.clone(),
            broken_catalog: self.broken_catalog,
            queries: Arc::clone(&self.queries),
        }))
    }

    async fn execute(&self, query: &str) -> Result<(), RelauditError> {
        self.inner.execute(query).await
    }

    async fn query_scalar(&self, query: &str) -> Result<u64, RelauditError> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some((marker, delay)) = &self.stall_on
            && query.contains(marker.as_str())
        {
            tokio::time::sleep(*delay).await;
        }
        if let Some(marker) = &self.fail_on
            && query.contains(marker.as_str())
        {
            return Err(RelauditError::InternalError(format!("injected failure on {}", marker)));
        }
        if let Some(marker) = &self.heavy_on
            && query.contains(marker.as_str())
        {
            return self.inner.query_scalar(HEAVY_QUERY).await;
        }
        self.inner.query_scalar(query).await
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<TableRef>, RelauditError> {
        self.catalog_guard()?;
        self.inner.list_tables(schema).await
    }

    async fn fetch_columns(&self, table: &TableRef) -> Result<Vec<ColumnRef>, RelauditError> {
        self.catalog_guard()?;
        self.inner.fetch_columns(table).await
    }

    async fn fetch_primary_key(&self, table: &TableRef) -> Result<Vec<String>, RelauditError> {
        self.catalog_guard()?;
        self.inner.fetch_primary_key(table).await
    }

    async fn fetch_foreign_keys(&self, schema: &str) -> Result<Vec<ForeignKeyEdge>, RelauditError> {
        self.catalog_guard()?;
        self.inner.fetch_foreign_keys(schema).await
    }
}
