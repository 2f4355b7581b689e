// relaudit-core/src/error.rs

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;

#[derive(Error, Debug, Diagnostic)]
pub enum RelauditError {
    // --- FATAL: the schema cannot be enumerated, no report is produced ---
    #[error("Catalog unavailable: {0}")]
    #[diagnostic(
        code(relaudit::catalog_unavailable),
        help("Check the connection profile and that the database is reachable.")
    )]
    CatalogUnavailable(String),

    // --- FATAL: malformed candidate specification, nothing is queried ---
    #[error("Configuration error: {0}")]
    #[diagnostic(code(relaudit::config))]
    Config(#[source] DomainError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for RelauditError {
    fn from(err: std::io::Error) -> Self {
        RelauditError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<duckdb::Error> for RelauditError {
    fn from(err: duckdb::Error) -> Self {
        RelauditError::Infrastructure(err.into())
    }
}

impl From<datafusion::error::DataFusionError> for RelauditError {
    fn from(err: datafusion::error::DataFusionError) -> Self {
        RelauditError::Infrastructure(err.into())
    }
}
