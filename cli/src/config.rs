// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Persisted client credentials
//!
//! `{api_key, server_url}` stored as pretty JSON at
//! `~/.launchpad/config.json`. `LAUNCHPAD_CONFIG_PATH` points somewhere else.
//! The file holds a secret, so it is written owner-only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "LAUNCHPAD_CONFIG_PATH";
const CONFIG_DIR: &str = ".launchpad";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ClientConfigError {
    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("No configuration at {}. Run `launchpad config <api-key> <server-url>` first", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("API key is missing from {}", .0.display())]
    MissingApiKey(PathBuf),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_key: String,
    pub server_url: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"[REDACTED]")
            .field("server_url", &self.server_url)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, server_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            server_url: server_url.into(),
        }
    }

    /// `$LAUNCHPAD_CONFIG_PATH`, else `~/.launchpad/config.json`
    pub fn default_path() -> Result<PathBuf, ClientConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        dirs_next::home_dir()
            .map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
            .ok_or(ClientConfigError::NoHomeDir)
    }

    pub fn load() -> Result<Self, ClientConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn save(&self) -> Result<PathBuf, ClientConfigError> {
        let path = Self::default_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ClientConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ClientConfigError::NotFound(path.to_path_buf())
            } else {
                ClientConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let config: ClientConfig = serde_json::from_str(&content).map_err(|source| ClientConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.api_key.is_empty() {
            return Err(ClientConfigError::MissingApiKey(path.to_path_buf()));
        }

        Ok(config)
    }

    /// Write the config, creating the parent directory (0755) and leaving
    /// the file readable by its owner only (0600)
    pub fn save_to(&self, path: &Path) -> Result<(), ClientConfigError> {
        let write_err = |source| ClientConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_config_dir(parent).map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        write_private(path, json.as_bytes()).map_err(write_err)?;
        Ok(())
    }
}

#[cfg(unix)]
fn create_config_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new().recursive(true).mode(0o755).create(dir)
}

#[cfg(not(unix))]
fn create_config_dir(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // An existing file keeps its old mode on open
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(bytes)
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> io::Result<()> {
    std::fs::write(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/.launchpad/config.json");

        let config = ClientConfig::new("key-123", "http://agent.local:9999");
        config.save_to(&path).unwrap();

        assert_eq!(ClientConfig::load_from(&path).unwrap(), config);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"api_key\": \"key-123\""));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        ClientConfig::new("k", "http://x").save_to(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_load_rejects_empty_key() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"api_key": "", "server_url": "http://x"}"#).unwrap();

        assert!(matches!(
            ClientConfig::load_from(&path),
            Err(ClientConfigError::MissingApiKey(_))
        ));
    }

    #[test]
    fn test_load_missing_and_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("absent.json");
        assert!(matches!(
            ClientConfig::load_from(&missing),
            Err(ClientConfigError::NotFound(_))
        ));

        let garbage = tmp.path().join("garbage.json");
        std::fs::write(&garbage, "not json").unwrap();
        assert!(matches!(
            ClientConfig::load_from(&garbage),
            Err(ClientConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", ClientConfig::new("super-secret", "http://x"));
        assert!(!rendered.contains("super-secret"));
    }
}
