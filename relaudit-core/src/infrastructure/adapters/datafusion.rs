// relaudit-core/src/infrastructure/adapters/datafusion.rs

use async_trait::async_trait;
use datafusion::arrow::array::{Array, Int64Array, StringArray};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::DataType;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::common::TableReference;
use datafusion::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::domain::catalog::{ColumnRef, ForeignKeyEdge, TableRef};
use crate::domain::sql::quoter;
use crate::error::RelauditError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::connector::Connector;

const DEFAULT_SCHEMA: &str = "public";

/// File-backed engine: every CSV or Parquet file becomes a table named after
/// its file stem. Files carry no constraints, so keys and foreign keys are
/// always empty: primary keys come from the project's `keys:` section and
/// edges from configuration or inference over those keys.
pub struct DataFusionConnector {
    ctx: Arc<SessionContext>,
}

impl Default for DataFusionConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFusionConnector {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::new())
    }

    /// Caps how many partitions (and so cores) one query fans out to.
    pub fn with_target_partitions(partitions: usize) -> Result<Self, InfrastructureError> {
        if partitions == 0 {
            return Err(InfrastructureError::ConfigError(
                "threads must be at least 1, got 0".to_string(),
            ));
        }
        Ok(Self::with_config(
            SessionConfig::new().with_target_partitions(partitions),
        ))
    }

    fn with_config(config: SessionConfig) -> Self {
        let config = config.with_information_schema(true);
        Self {
            ctx: Arc::new(SessionContext::new_with_config(config)),
        }
    }

    /// Connector over every `.csv` / `.parquet` file found under `data_dir`.
    pub async fn from_data_dir(data_dir: &Path) -> Result<Self, InfrastructureError> {
        Self::new().with_data_dir(data_dir).await
    }

    pub async fn with_data_dir(self, data_dir: &Path) -> Result<Self, InfrastructureError> {
        let count = self.register_directory(data_dir).await?;
        info!(path = ?data_dir, tables = count, "📂 DataFusion sources registered");
        Ok(self)
    }

    pub async fn register_source(&self, name: &str, path: &Path) -> Result<(), InfrastructureError> {
        let path_str = path.to_str().ok_or_else(|| {
            InfrastructureError::ConfigError(format!("Invalid path for source {}: {:?}", name, path))
        })?;

        // Taken verbatim: no schema splitting on dots, no case folding.
        let table = TableReference::bare(name);
        match path.extension().and_then(|e| e.to_str()) {
            Some("parquet") => {
                self.ctx
                    .register_parquet(table, path_str, ParquetReadOptions::default())
                    .await?
            }
            _ => {
                self.ctx
                    .register_csv(table, path_str, CsvReadOptions::new())
                    .await?
            }
        }
        debug!(table = name, path = ?path, "Registered source");
        Ok(())
    }

    pub async fn register_directory(&self, data_dir: &Path) -> Result<usize, InfrastructureError> {
        if !data_dir.is_dir() {
            return Err(InfrastructureError::ConfigNotFound(format!(
                "Data directory {:?} does not exist",
                data_dir
            )));
        }

        let mut registered: Vec<String> = Vec::new();
        for entry in WalkDir::new(data_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| InfrastructureError::Io(std::io::Error::other(e)))?;
            let path = entry.path();
            let supported = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("csv") | Some("parquet")
            );
            if !entry.file_type().is_file() || !supported {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if registered.iter().any(|r| r == stem) {
                return Err(InfrastructureError::ConfigError(format!(
                    "Two data files map to the same table '{}'",
                    stem
                )));
            }
            self.register_source(stem, path).await?;
            registered.push(stem.to_string());
        }
        Ok(registered.len())
    }

    async fn collect(&self, query: &str) -> Result<Vec<RecordBatch>, RelauditError> {
        let df = self.ctx.sql(query).await?;
        Ok(df.collect().await?)
    }

    async fn strings(&self, query: &str, width: usize) -> Result<Vec<Vec<String>>, RelauditError> {
        let batches = self.collect(query).await?;
        let mut rows = Vec::new();
        for batch in &batches {
            let mut columns = Vec::with_capacity(width);
            for idx in 0..width {
                columns.push(string_column(batch, idx)?);
            }
            for row in 0..batch.num_rows() {
                rows.push(
                    columns
                        .iter()
                        .map(|col| {
                            if col.is_null(row) {
                                String::new()
                            } else {
                                col.value(row).to_string()
                            }
                        })
                        .collect(),
                );
            }
        }
        Ok(rows)
    }
}

fn shape_error(msg: impl Into<String>) -> RelauditError {
    InfrastructureError::Database(DatabaseError::ResultShape(msg.into())).into()
}

fn string_column(batch: &RecordBatch, idx: usize) -> Result<StringArray, RelauditError> {
    if idx >= batch.num_columns() {
        return Err(shape_error(format!("missing column {}", idx)));
    }
    let casted = cast(batch.column(idx), &DataType::Utf8).map_err(|e| shape_error(e.to_string()))?;
    casted
        .as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| shape_error("expected a string column"))
}

#[async_trait]
impl Connector for DataFusionConnector {
    fn engine_name(&self) -> &str {
        "datafusion"
    }

    fn default_schema(&self) -> &str {
        DEFAULT_SCHEMA
    }

    async fn open_session(&self) -> Result<Box<dyn Connector>, RelauditError> {
        // Same catalog (registered tables are shared), independent execution state.
        let ctx = SessionContext::new_with_state(self.ctx.state());
        Ok(Box::new(DataFusionConnector { ctx: Arc::new(ctx) }))
    }

    async fn execute(&self, query: &str) -> Result<(), RelauditError> {
        self.collect(query).await?;
        Ok(())
    }

    async fn query_scalar(&self, query: &str) -> Result<u64, RelauditError> {
        let batches = self.collect(query).await?;
        let batch = batches
            .iter()
            .find(|b| b.num_rows() > 0)
            .ok_or_else(|| shape_error("No scalar value returned"))?;

        let casted =
            cast(batch.column(0), &DataType::Int64).map_err(|e| shape_error(e.to_string()))?;
        let values = casted
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| shape_error("expected an integer column"))?;
        if values.is_null(0) {
            return Err(shape_error("scalar value is NULL"));
        }
        let value = values.value(0);
        u64::try_from(value).map_err(|_| shape_error(format!("expected a count, got {}", value)))
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<TableRef>, RelauditError> {
        let query = format!(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = {} AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
            quoter::literal(schema)
        );
        let rows = self.strings(&query, 1).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .map(|name| TableRef::new(schema, name))
            .collect())
    }

    async fn fetch_columns(&self, table: &TableRef) -> Result<Vec<ColumnRef>, RelauditError> {
        let query = format!(
            "SELECT column_name, data_type, is_nullable FROM information_schema.columns \
             WHERE table_schema = {} AND table_name = {} \
             ORDER BY ordinal_position",
            quoter::literal(&table.schema),
            quoter::literal(&table.name)
        );
        let rows = self.strings(&query, 3).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match row.as_slice() {
                [name, data_type, nullable] => Some(ColumnRef {
                    table: table.clone(),
                    name: name.clone(),
                    data_type: data_type.clone(),
                    is_nullable: nullable.eq_ignore_ascii_case("YES"),
                }),
                _ => None,
            })
            .collect())
    }

    async fn fetch_primary_key(&self, _table: &TableRef) -> Result<Vec<String>, RelauditError> {
        Ok(Vec::new())
    }

    async fn fetch_foreign_keys(&self, _schema: &str) -> Result<Vec<ForeignKeyEdge>, RelauditError> {
        Ok(Vec::new())
    }
}
