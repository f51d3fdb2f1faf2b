// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Configuration
//!
//! Immutable settings for the receiving agent. Built once at startup from the
//! command line and injected into the authentication gate and the deployment
//! service. Nothing mutates it afterwards.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Validated process-wide settings

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::domain::credential::ApiKey;
use crate::domain::workspace::WorkspaceNaming;

pub const DEFAULT_PORT: u16 = 9999;
pub const DEFAULT_UPLOAD_DIR: &str = "./uploads";
pub const DEFAULT_ENTRY_SCRIPT: &str = "DEPLOY.sh";
pub const DEFAULT_INTERPRETER: &str = "/bin/bash";
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grace period must be greater than zero")]
    ZeroGracePeriod,

    #[error("upload limit must be greater than zero")]
    ZeroUploadLimit,

    #[error("entry script must be a plain file name, got '{0}'")]
    InvalidEntryScript(String),

    #[error("interpreter must not be empty")]
    EmptyInterpreter,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub api_key: ApiKey,
    pub listen_addr: SocketAddr,
    pub upload_dir: PathBuf,
    pub entry_script: String,
    pub interpreter: PathBuf,
    pub grace_period: Duration,
    pub max_upload_bytes: usize,
    pub workspace_naming: WorkspaceNaming,
}

impl AgentConfig {
    /// Defaults for everything but the key
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            entry_script: DEFAULT_ENTRY_SCRIPT.to_string(),
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            grace_period: DEFAULT_GRACE_PERIOD,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            workspace_naming: WorkspaceNaming::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grace_period.is_zero() {
            return Err(ConfigError::ZeroGracePeriod);
        }

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::ZeroUploadLimit);
        }

        // The script must sit directly under the extraction root
        let mut components = Path::new(&self.entry_script).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return Err(ConfigError::InvalidEntryScript(self.entry_script.clone())),
        }

        if self.interpreter.as_os_str().is_empty() {
            return Err(ConfigError::EmptyInterpreter);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AgentConfig {
        AgentConfig::new(ApiKey::new("k").unwrap())
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = base_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_addr.port(), 9999);
        assert_eq!(config.entry_script, "DEPLOY.sh");
        assert_eq!(config.grace_period, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_nested_entry_script() {
        let mut config = base_config();
        config.entry_script = "scripts/DEPLOY.sh".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidEntryScript(_))
        ));

        config.entry_script = "../DEPLOY.sh".into();
        assert!(config.validate().is_err());

        config.entry_script = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_durations_and_limits() {
        let mut config = base_config();
        config.grace_period = Duration::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::ZeroGracePeriod));

        let mut config = base_config();
        config.max_upload_bytes = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroUploadLimit));
    }
}
