// relaudit-core/src/infrastructure/config/project.rs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use validator::Validate;

use super::audit::AuditConfig;
use crate::infrastructure::error::InfrastructureError;

#[instrument(skip(project_dir))]
pub fn load_audit_config(project_dir: &Path) -> Result<AuditConfig, InfrastructureError> {
    // 1. Locate the main file
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading audit configuration");

    // 2. Parse
    let content = fs::read_to_string(&config_path)?;
    let mut config: AuditConfig = serde_yaml::from_str(&content)?;

    // 3. Environment layering
    apply_env_overrides(&mut config);

    // 4. Validate the final shape (after overrides, so they are checked too)
    config.validate()?;

    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    let candidates = ["relaudit.yaml", "relaudit.yml"];
    for filename in candidates {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, candidates
    )))
}

fn apply_env_overrides(config: &mut AuditConfig) {
    if let Ok(val) = std::env::var("RELAUDIT_PROFILE") {
        info!(old = ?config.profile, new = ?val, "Overriding profile via ENV");
        config.profile = val;
    }
    if let Ok(val) = std::env::var("RELAUDIT_CONCURRENCY") {
        match val.parse::<usize>() {
            Ok(n) => {
                info!(old = config.execution.concurrency, new = n, "Overriding concurrency via ENV");
                config.execution.concurrency = n;
            }
            Err(_) => warn!(value = ?val, "Ignoring non-numeric RELAUDIT_CONCURRENCY"),
        }
    }
    if let Ok(val) = std::env::var("RELAUDIT_TIMEOUT_SECS") {
        match val.parse::<u64>() {
            Ok(n) => {
                info!(old = ?config.execution.timeout_secs, new = n, "Overriding timeout via ENV");
                config.execution.timeout_secs = Some(n);
            }
            Err(_) => warn!(value = ?val, "Ignoring non-numeric RELAUDIT_TIMEOUT_SECS"),
        }
    }
}
