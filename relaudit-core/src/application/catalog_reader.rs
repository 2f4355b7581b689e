// relaudit-core/src/application/catalog_reader.rs

use tracing::{info, instrument};

use crate::domain::catalog::{CatalogSnapshot, TableSchema};
use crate::domain::plan::CatalogOptions;
use crate::error::RelauditError;
use crate::ports::connector::Connector;

pub struct CatalogReader;

impl CatalogReader {
    /// Enumerates tables, columns, primary keys and (optionally) declared
    /// foreign keys of one schema. Any failure means there is nothing to audit.
    #[instrument(skip(connector, options), fields(engine = connector.engine_name()))]
    pub async fn read(
        connector: &dyn Connector,
        schema: &str,
        options: &CatalogOptions,
    ) -> Result<CatalogSnapshot, RelauditError> {
        let unavailable = |e: RelauditError| RelauditError::CatalogUnavailable(e.to_string());

        let tables = connector.list_tables(schema).await.map_err(unavailable)?;
        let mut schemas = Vec::with_capacity(tables.len());
        for table in tables {
            let columns = connector.fetch_columns(&table).await.map_err(unavailable)?;
            let primary_key = connector
                .fetch_primary_key(&table)
                .await
                .map_err(unavailable)?;
            schemas.push(TableSchema {
                table,
                columns,
                primary_key,
            });
        }

        let declared = if options.include_declared {
            connector
                .fetch_foreign_keys(schema)
                .await
                .map_err(unavailable)?
        } else {
            Vec::new()
        };

        let snapshot = CatalogSnapshot::new(schemas, declared)
            .map_err(|e| RelauditError::CatalogUnavailable(e.to_string()))?;
        info!(
            tables = snapshot.tables.len(),
            declared_edges = snapshot.edges.len(),
            "📚 Catalog loaded"
        );
        Ok(snapshot)
    }
}
