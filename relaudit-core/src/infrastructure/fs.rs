// relaudit-core/src/infrastructure/fs.rs

use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::infrastructure::error::InfrastructureError;

/// Writes `content` to `path` through a sibling temp file and a rename, so
/// readers see either the old file or the complete new one.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_ref())?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;
    Ok(())
}

/// Pretty-printed JSON artifact, written atomically.
pub fn write_json_artifact<T: Serialize>(path: &Path, value: &T) -> Result<(), InfrastructureError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| InfrastructureError::ConfigError(format!("Cannot serialize artifact: {}", e)))?;
    atomic_write(path, json)
}
