// relaudit-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::{AccessMode, Config, Connection, InterruptHandle, params};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::catalog::{ColumnRef, EdgeOrigin, ForeignKeyEdge, TableRef};
use crate::error::RelauditError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::connector::Connector;

const DEFAULT_SCHEMA: &str = "main";

// Unit separator: joins constraint column lists without clashing with real names.
const LIST_SEPARATOR: char = '\u{1f}';

pub struct DuckDBConnector {
    conn: Arc<Mutex<Connection>>,
    interrupt: Arc<InterruptHandle>,
}

/// Armed while a blocking call is in flight. Dropping it armed (the caller
/// stopped waiting, e.g. a run deadline expired) interrupts the call's own
/// statement, or keeps it from starting if it is still queued on the lock.
struct InterruptGuard {
    handle: Arc<InterruptHandle>,
    cancelled: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    armed: bool,
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Pairs with the worker: it marks `running` before reading `cancelled`.
        self.cancelled.store(true, Ordering::SeqCst);
        if self.running.load(Ordering::SeqCst) {
            self.handle.interrupt();
        }
    }
}

impl DuckDBConnector {
    /// Read-write connection (`:memory:` or a file path).
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        Self::open(db_path, Config::default())
    }

    /// Read-only connection to an existing database file. Audits never write.
    pub fn open_read_only(db_path: &str, threads: Option<usize>) -> Result<Self, InfrastructureError> {
        let config = with_threads(Config::default().access_mode(AccessMode::ReadOnly)?, threads)?;
        Self::open(db_path, config)
    }

    pub fn open_in_memory(threads: Option<usize>) -> Result<Self, InfrastructureError> {
        Self::open(":memory:", with_threads(Config::default(), threads)?)
    }

    fn open(db_path: &str, config: Config) -> Result<Self, InfrastructureError> {
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        let interrupt = conn.interrupt_handle();
        Self {
            conn: Arc::new(Mutex::new(conn)),
            interrupt,
        }
    }

    /// Runs a blocking driver call off the async executor. Dropping the
    /// returned future interrupts the call.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, RelauditError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, InfrastructureError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let cancelled = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(false));
        let mut interrupt = InterruptGuard {
            handle: Arc::clone(&self.interrupt),
            cancelled: Arc::clone(&cancelled),
            running: Arc::clone(&running),
            armed: true,
        };

        let joined = tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| {
                InfrastructureError::Io(std::io::Error::other("DuckDB Mutex Poisoned"))
            })?;
            running.store(true, Ordering::SeqCst);
            if cancelled.load(Ordering::SeqCst) {
                running.store(false, Ordering::SeqCst);
                return Err(DatabaseError::Interrupted.into());
            }
            let result = f(&guard);
            running.store(false, Ordering::SeqCst);
            result
        })
        .await;
        interrupt.armed = false;

        let joined =
            joined.map_err(|e| RelauditError::InternalError(format!("DuckDB worker failed: {}", e)))?;
        joined.map_err(RelauditError::from)
    }
}

/// Caps DuckDB's worker threads; `None` keeps the engine default (all cores).
fn with_threads(config: Config, threads: Option<usize>) -> Result<Config, InfrastructureError> {
    match threads {
        None => Ok(config),
        Some(n) => {
            let n = i64::try_from(n)
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| {
                    InfrastructureError::ConfigError(format!("threads must be at least 1, got {}", n))
                })?;
            Ok(config.threads(n)?)
        }
    }
}

fn split_list(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined.split(LIST_SEPARATOR).map(str::to_string).collect()
}

#[async_trait]
impl Connector for DuckDBConnector {
    fn engine_name(&self) -> &str {
        "duckdb"
    }

    fn default_schema(&self) -> &str {
        DEFAULT_SCHEMA
    }

    async fn open_session(&self) -> Result<Box<dyn Connector>, RelauditError> {
        let conn = self.with_conn(|c| Ok(c.try_clone()?)).await?;
        Ok(Box::new(DuckDBConnector::from_connection(conn)))
    }

    async fn execute(&self, query: &str) -> Result<(), RelauditError> {
        let query = query.to_string();
        self.with_conn(move |c| {
            c.execute_batch(&query)?;
            Ok(())
        })
        .await
    }

    async fn query_scalar(&self, query: &str) -> Result<u64, RelauditError> {
        let query = query.to_string();
        self.with_conn(move |c| {
            let value: i64 = c.query_row(&query, [], |row| row.get(0))?;
            u64::try_from(value).map_err(|_| {
                DatabaseError::ResultShape(format!("expected a count, got {}", value)).into()
            })
        })
        .await
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<TableRef>, RelauditError> {
        let schema = schema.to_string();
        self.with_conn(move |c| {
            let mut stmt = c.prepare(
                "SELECT table_name FROM duckdb_tables() \
                 WHERE database_name = current_database() AND schema_name = ? \
                   AND NOT internal AND NOT temporary \
                 ORDER BY table_name",
            )?;
            let names = stmt
                .query_map(params![schema], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(names
                .into_iter()
                .map(|name| TableRef::new(schema.clone(), name))
                .collect())
        })
        .await
    }

    async fn fetch_columns(&self, table: &TableRef) -> Result<Vec<ColumnRef>, RelauditError> {
        let table = table.clone();
        self.with_conn(move |c| {
            let mut stmt = c.prepare(
                "SELECT column_name, data_type, is_nullable FROM information_schema.columns \
                 WHERE table_catalog = current_database() AND table_schema = ? AND table_name = ? \
                 ORDER BY ordinal_position",
            )?;
            let rows = stmt
                .query_map(params![table.schema, table.name], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows
                .into_iter()
                .map(|(name, data_type, nullable)| ColumnRef {
                    table: table.clone(),
                    name,
                    data_type,
                    is_nullable: nullable.eq_ignore_ascii_case("YES"),
                })
                .collect())
        })
        .await
    }

    async fn fetch_primary_key(&self, table: &TableRef) -> Result<Vec<String>, RelauditError> {
        let table = table.clone();
        self.with_conn(move |c| {
            let mut stmt = c.prepare(
                "SELECT array_to_string(constraint_column_names, chr(31)) FROM duckdb_constraints() \
                 WHERE database_name = current_database() AND schema_name = ? AND table_name = ? \
                   AND constraint_type = 'PRIMARY KEY'",
            )?;
            let keys = stmt
                .query_map(params![table.schema, table.name], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(keys.first().map(|k| split_list(k)).unwrap_or_default())
        })
        .await
    }

    async fn fetch_foreign_keys(&self, schema: &str) -> Result<Vec<ForeignKeyEdge>, RelauditError> {
        let schema = schema.to_string();
        self.with_conn(move |c| {
            let mut stmt = c.prepare(
                "SELECT table_name, \
                        array_to_string(constraint_column_names, chr(31)), \
                        referenced_table, \
                        array_to_string(referenced_column_names, chr(31)) \
                 FROM duckdb_constraints() \
                 WHERE database_name = current_database() AND schema_name = ? \
                   AND constraint_type = 'FOREIGN KEY' \
                 ORDER BY table_name, constraint_index",
            )?;
            let rows = stmt
                .query_map(params![schema], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows
                .into_iter()
                .map(|(child, child_cols, parent, parent_cols)| {
                    ForeignKeyEdge::new(
                        TableRef::new(schema.clone(), child),
                        split_list(&child_cols),
                        TableRef::new(schema.clone(), parent),
                        split_list(&parent_cols),
                        EdgeOrigin::Declared,
                    )
                })
                .collect())
        })
        .await
    }
}
