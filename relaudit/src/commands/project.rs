// relaudit/src/commands/project.rs
//
// Shared setup: configuration, connection profile, connector.

use anyhow::Context;
use std::path::Path;
use tracing::info;

use relaudit_core::RelauditError;
use relaudit_core::infrastructure::adapters::connect;
use relaudit_core::infrastructure::config::{
    AuditConfig, load_audit_config, load_connections, resolve_output,
};
use relaudit_core::ports::connector::Connector;

pub struct OpenedProject {
    pub config: AuditConfig,
    pub connector: Box<dyn Connector>,
    /// Schema under audit: the profile's `schema`, else the engine default.
    pub schema: String,
}

pub async fn open(project_dir: &Path) -> anyhow::Result<OpenedProject> {
    let config = load_audit_config(project_dir).with_context(|| {
        format!(
            "Failed to load audit configuration from {:?}",
            project_dir
        )
    })?;

    let connections = load_connections(project_dir, &config)?;
    let output = resolve_output(&connections, &config.profile)?;

    // No connection means no catalog: nothing can be audited.
    let connector = connect(project_dir, output)
        .await
        .map_err(|e| RelauditError::CatalogUnavailable(e.to_string()))?;

    let schema = output
        .schema
        .clone()
        .unwrap_or_else(|| connector.default_schema().to_string());

    info!(profile = %config.profile, engine = connector.engine_name(), schema = %schema, "Connected");

    Ok(OpenedProject {
        config,
        connector,
        schema,
    })
}
