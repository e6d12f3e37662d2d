use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

/// Platform data directory for hooklog, created on first use.
///
/// Linux: `~/.local/share/hooklog`, macOS: `~/Library/Application Support/dev.hooklog.hooklog`.
pub fn data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("dev", "hooklog", "hooklog")
        .context("could not determine a home directory for the data dir")?;
    let dir = dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
