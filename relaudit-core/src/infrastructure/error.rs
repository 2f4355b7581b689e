// relaudit-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(relaudit::infra::database::duckdb),
        help("An error occurred inside the SQL engine.")
    )]
    DuckDB(#[from] duckdb::Error),

    #[error("DataFusion Engine Error: {0}")]
    #[diagnostic(code(relaudit::infra::database::datafusion))]
    DataFusion(#[from] datafusion::error::DataFusionError),

    #[error("Unexpected result shape: {0}")]
    #[diagnostic(code(relaudit::infra::database::shape))]
    ResultShape(String),

    #[error("Statement interrupted")]
    #[diagnostic(code(relaudit::infra::database::interrupted))]
    Interrupted,
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE (Abstracted) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(relaudit::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(relaudit::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(relaudit::infra::validation))]
    Validation(#[from] validator::ValidationErrors),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(relaudit::infra::config))]
    ConfigError(String),

    #[error("Not found: {0}")]
    #[diagnostic(code(relaudit::infra::config_missing))]
    ConfigNotFound(String),
}

// Shortcuts so `?` works directly on driver calls.
impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}

impl From<datafusion::error::DataFusionError> for InfrastructureError {
    fn from(err: datafusion::error::DataFusionError) -> Self {
        InfrastructureError::Database(DatabaseError::DataFusion(err))
    }
}
