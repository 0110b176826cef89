//! Application context for the safe CLI.
//!
//! Provides a unified context that combines CLI arguments with
//! lazily-loaded configuration.

use std::io::IsTerminal;
use std::path::PathBuf;

use once_cell::unsync::OnceCell;

use safe_core::{ShellBridge, SqliteStore};

use crate::cli::Cli;
use crate::config::{read_config, SafeConfig};

use super::resolver::{journal_path_for, resolve_config_path, resolve_store_path};

/// Application context that bundles CLI args with configuration.
///
/// This avoids repeatedly loading config and threading multiple parameters
/// through handler functions.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<SafeConfig>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Whether password prompts may be shown.
    pub fn interactive(&self) -> bool {
        std::io::stdin().is_terminal() && !self.cli.no_input
    }

    /// Get the configuration, loading it lazily if needed.
    pub fn config(&self) -> anyhow::Result<&SafeConfig> {
        self.config
            .get_or_try_init(|| read_config(&resolve_config_path(self.cli)?))
    }

    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        resolve_store_path(self.cli, self.config()?)
    }

    pub fn journal_path(&self) -> anyhow::Result<PathBuf> {
        Ok(journal_path_for(&self.store_path()?))
    }

    /// Open (creating if needed) the password/tracking store.
    pub fn open_store(&self) -> anyhow::Result<SqliteStore> {
        let path = self.store_path()?;
        tracing::debug!(path = %path.display(), "opening store");
        Ok(SqliteStore::open(&path)?)
    }

    /// Shell bridge rooted at the configured transient directory.
    pub fn shell_bridge(&self) -> anyhow::Result<ShellBridge> {
        let configured = self
            .config()?
            .shell
            .transient_dir
            .as_deref()
            .filter(|dir| !dir.trim().is_empty());
        Ok(match configured {
            Some(dir) => ShellBridge::with_transient_root(dir),
            None => ShellBridge::new(),
        })
    }
}
