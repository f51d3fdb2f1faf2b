// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `launchpad agent`: run the receiving side

use anyhow::{Context, Result};
use clap::Args;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use launchpad_core::domain::agent_config::{
    AgentConfig, DEFAULT_ENTRY_SCRIPT, DEFAULT_INTERPRETER, DEFAULT_PORT, DEFAULT_UPLOAD_DIR,
};
use launchpad_core::domain::credential::ApiKey;
use launchpad_core::domain::workspace::WorkspaceNaming;

use crate::agent::start_agent;

#[derive(Args, Debug)]
pub struct AgentArgs {
    /// Key clients must present as `Authorization: Bearer <key>`
    #[arg(long, env = "LAUNCHPAD_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// HTTP listen port
    #[arg(long, env = "LAUNCHPAD_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// HTTP listen address
    #[arg(long, env = "LAUNCHPAD_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Parent directory for deployment workspaces
    #[arg(long, value_name = "DIR", default_value = DEFAULT_UPLOAD_DIR)]
    pub upload_dir: PathBuf,

    /// Seconds between script launch and workspace removal
    #[arg(long, default_value_t = 5)]
    pub grace_period_secs: u64,

    /// Script to run from the archive root
    #[arg(long, default_value = DEFAULT_ENTRY_SCRIPT)]
    pub entry_script: String,

    /// Program the entry script is passed to
    #[arg(long, default_value = DEFAULT_INTERPRETER)]
    pub interpreter: PathBuf,

    /// Largest accepted upload, in MiB
    #[arg(long, default_value_t = 512)]
    pub max_upload_mb: usize,

    /// Append a random suffix to workspace names so uploads in the same
    /// second never share a directory
    #[arg(long)]
    pub unique_workspaces: bool,
}

impl AgentArgs {
    pub fn into_config(self) -> Result<AgentConfig> {
        let api_key = ApiKey::new(self.api_key).context("Invalid --api-key")?;

        let mut config = AgentConfig::new(api_key);
        config.listen_addr = SocketAddr::new(self.host, self.port);
        config.upload_dir = self.upload_dir;
        config.entry_script = self.entry_script;
        config.interpreter = self.interpreter;
        config.grace_period = Duration::from_secs(self.grace_period_secs);
        config.max_upload_bytes = self.max_upload_mb.saturating_mul(1024 * 1024);
        if self.unique_workspaces {
            config.workspace_naming = WorkspaceNaming::TimestampWithSuffix;
        }

        config.validate().context("Invalid agent configuration")?;
        Ok(config)
    }
}

pub async fn handle_command(args: AgentArgs) -> Result<()> {
    let config = args.into_config()?;
    start_agent(config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        agent: AgentArgs,
    }

    fn parse(args: &[&str]) -> AgentArgs {
        Harness::try_parse_from(std::iter::once("agent").chain(args.iter().copied()))
            .unwrap()
            .agent
    }

    #[test]
    fn test_defaults_map_onto_config() {
        let config = parse(&["--api-key", "k"]).into_config().unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:9999".parse().unwrap());
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
        assert_eq!(config.entry_script, "DEPLOY.sh");
        assert_eq!(config.grace_period, Duration::from_secs(5));
        assert_eq!(config.max_upload_bytes, 512 * 1024 * 1024);
        assert_eq!(config.workspace_naming, WorkspaceNaming::Timestamp);
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            "--api-key",
            "k",
            "--port",
            "8080",
            "--host",
            "127.0.0.1",
            "--grace-period-secs",
            "30",
            "--unique-workspaces",
        ])
        .into_config()
        .unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.grace_period, Duration::from_secs(30));
        assert_eq!(config.workspace_naming, WorkspaceNaming::TimestampWithSuffix);
    }

    #[test]
    fn test_rejects_blank_key_and_zero_grace() {
        assert!(parse(&["--api-key", "   "]).into_config().is_err());
        assert!(parse(&["--api-key", "k", "--grace-period-secs", "0"])
            .into_config()
            .is_err());
    }
}
