//! Credentials file persistence
//!
//! The SDK hands every new credential set to the refresh callback; the CLI
//! writes it here and reads it back on the next run.

use anyhow::{Context, Result};
use keeper_client::Credentials;
use std::path::Path;

/// Load persisted credentials. A missing file means no session yet.
pub fn load(path: &Path) -> Result<Option<Credentials>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    let credentials = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse credentials in {}", path.display()))?;
    Ok(Some(credentials))
}

/// Write credentials, replacing the file atomically.
pub fn save(path: &Path, credentials: &Credentials) -> Result<()> {
    let json = serde_json::to_vec_pretty(credentials).context("failed to serialize credentials")?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to move credentials into {}", path.display()))?;
    Ok(())
}
