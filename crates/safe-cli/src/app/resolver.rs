//! Path resolution for config, store and journal files.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{default_config_path, default_store_path, SafeConfig};

/// File name of the rotation journal, kept next to the store.
const JOURNAL_FILE_NAME: &str = "rotation.journal";

/// Resolve the config file path from `--config`/`SAFE_CONFIG` or the XDG default.
pub fn resolve_config_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => default_config_path(),
    }
}

/// Resolve the store path from `--store`/`SAFE_STORE`, the config, or the XDG default.
pub fn resolve_store_path(cli: &Cli, config: &SafeConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = &cli.store {
        return Ok(path.clone());
    }
    if let Some(path) = config.store.path.as_deref().filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }
    default_store_path()
}

/// Journal location for the store at `store_path`.
pub fn journal_path_for(store_path: &Path) -> PathBuf {
    store_path.with_file_name(JOURNAL_FILE_NAME)
}
