// relaudit-core/src/infrastructure/adapters/mod.rs

pub mod datafusion;
pub mod duckdb;

use std::path::Path;
use tracing::info;

use crate::infrastructure::config::{ConnectionOutput, Engine};
use crate::infrastructure::error::InfrastructureError;
use crate::ports::connector::Connector;

pub use self::datafusion::DataFusionConnector;
pub use self::duckdb::DuckDBConnector;

/// Opens the engine a connection output describes. DuckDB files are opened
/// read-only and must already exist. `threads` caps DuckDB's worker threads
/// and DataFusion's target partitions.
pub async fn connect(
    project_dir: &Path,
    output: &ConnectionOutput,
) -> Result<Box<dyn Connector>, InfrastructureError> {
    match output.engine {
        Engine::DuckDB => {
            let Some(path) = output.database_path(project_dir) else {
                info!("🦆 Opening in-memory DuckDB");
                return Ok(Box::new(DuckDBConnector::open_in_memory(output.threads)?));
            };
            if !path.exists() {
                return Err(InfrastructureError::ConfigNotFound(format!(
                    "DuckDB database {:?} does not exist",
                    path
                )));
            }
            let path_str = path.to_str().ok_or_else(|| {
                InfrastructureError::ConfigError(format!("Invalid database path {:?}", path))
            })?;
            info!(path = ?path, "🦆 Opening DuckDB (read-only)");
            Ok(Box::new(DuckDBConnector::open_read_only(path_str, output.threads)?))
        }
        Engine::DataFusion => {
            let data_dir = output.data_path(project_dir);
            let connector = match output.threads {
                Some(n) => DataFusionConnector::with_target_partitions(n)?,
                None => DataFusionConnector::new(),
            };
            Ok(Box::new(connector.with_data_dir(&data_dir).await?))
        }
    }
}
