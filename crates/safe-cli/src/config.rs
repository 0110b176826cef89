use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SafeConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub shell: ShellSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ShellSection {
    pub transient_dir: Option<String>,
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_store_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("safe.db"))
}

/// Read the config at `path`; a missing file yields the defaults.
pub fn read_config(path: &Path) -> anyhow::Result<SafeConfig> {
    if !path.exists() {
        return Ok(SafeConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("safe"));
        }
    }
    Ok(home_dir()?.join(".config").join("safe"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("safe"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("safe"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: SafeConfig = toml::from_str("").unwrap();
        assert!(config.store.path.is_none());
        assert!(config.shell.transient_dir.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config: SafeConfig = toml::from_str(
            "[store]\npath = \"/tmp/safe.db\"\n\n[shell]\ntransient_dir = \"/dev/shm\"\n",
        )
        .unwrap();
        assert_eq!(config.store.path.as_deref(), Some("/tmp/safe.db"));
        assert_eq!(config.shell.transient_dir.as_deref(), Some("/dev/shm"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = read_config(&dir.path().join("absent.toml")).unwrap();
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_unknown_section_type_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store]\npath = 42\n").unwrap();
        assert!(read_config(&path).is_err());
    }
}
