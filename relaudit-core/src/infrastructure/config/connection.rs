// relaudit-core/src/infrastructure/config/connection.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::audit::AuditConfig;
use crate::infrastructure::error::InfrastructureError;

/// SQL engine behind a connection output.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    DuckDB,
    DataFusion,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConnectionProfile {
    pub target: String,
    pub outputs: HashMap<String, ConnectionOutput>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConnectionOutput {
    #[serde(rename = "type")]
    pub engine: Engine,
    /// DuckDB file, relative to the project directory, or `:memory:`.
    pub database: Option<String>,
    /// DataFusion source directory, relative to the project directory.
    pub data_dir: Option<String>,
    /// Schema to audit; the engine default when absent.
    pub schema: Option<String>,
    pub threads: Option<usize>,
}

impl ConnectionOutput {
    pub fn database_path(&self, project_dir: &Path) -> Option<PathBuf> {
        self.database
            .as_deref()
            .filter(|d| *d != ":memory:")
            .map(|d| project_dir.join(d))
    }

    pub fn data_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(self.data_dir.as_deref().unwrap_or("data"))
    }
}

pub fn load_connections(
    project_dir: &Path,
    config: &AuditConfig,
) -> Result<HashMap<String, ConnectionProfile>, InfrastructureError> {
    let config_subpath = config
        .config_paths
        .first()
        .map(|s: &String| s.as_str())
        .unwrap_or("config");
    let config_dir = project_dir.join(config_subpath);

    let paths = [
        config_dir.join("connections.yml"),
        config_dir.join("connections.yaml"),
    ];
    let connections_path = paths.iter().find(|p| p.exists()).ok_or_else(|| {
        InfrastructureError::ConfigNotFound(format!(
            "connections.yml or connections.yaml in {:?}",
            config_dir
        ))
    })?;

    let content = fs::read_to_string(connections_path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Picks the profile's target output.
pub fn resolve_output<'a>(
    connections: &'a HashMap<String, ConnectionProfile>,
    profile: &str,
) -> Result<&'a ConnectionOutput, InfrastructureError> {
    let profile_cfg = connections.get(profile).ok_or_else(|| {
        InfrastructureError::ConfigError(format!(
            "Profile '{}' not found in connections file",
            profile
        ))
    })?;
    profile_cfg.outputs.get(&profile_cfg.target).ok_or_else(|| {
        InfrastructureError::ConfigError(format!(
            "Target '{}' not found in profile '{}'",
            profile_cfg.target, profile
        ))
    })
}
