//! Locating and loading the worker configuration.

use clap::ValueEnum;
use ironbot_agent::CiConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

/// Default configuration file path.
pub fn default_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let dirs = directories::ProjectDirs::from("org", "ironbot", "ironbot")
        .ok_or("Could not determine config directory")?;
    Ok(dirs.config_dir().join("config.yaml"))
}

/// The file named on the command line, or the default one.
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_path(),
    }
}

/// Load and validate the configuration.
///
/// A missing default file yields the default configuration; a missing
/// explicit file is an error.
pub fn load(explicit: Option<&Path>) -> Result<CiConfig, Box<dyn std::error::Error>> {
    let path = resolve_path(explicit)?;
    if explicit.is_none() && !path.exists() {
        tracing::debug!(path = %path.display(), "No configuration file, using defaults");
        return Ok(CiConfig::default());
    }

    let config = CiConfig::from_file(&path)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let path = resolve_path(Some(Path::new("/etc/ironbot.yaml"))).unwrap();
        assert_eq!(path, PathBuf::from("/etc/ironbot.yaml"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("absent.yaml"))).is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ironbot.yaml");
        std::fs::write(
            &path,
            "worker_dir: /srv/worker\nbuilders:\n  - {name: iso, kind: arch_iso}\n",
        )
        .unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.builders.len(), 1);
        assert_eq!(config.worker_dir, PathBuf::from("/srv/worker"));
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ironbot.yaml");
        std::fs::write(&path, "registry_url: ftp://example.org\n").unwrap();
        assert!(load(Some(&path)).is_err());
    }
}
