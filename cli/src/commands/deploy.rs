// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deploy the current (or given) directory to an agent

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

use launchpad_core::infrastructure::archive::ArchivePacker;

use crate::agent::DeployClient;
use crate::config::ClientConfig;

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Agent URL (default: the one saved with `launchpad config`)
    #[arg(value_name = "SERVER_URL")]
    pub server_url: Option<String>,

    /// Directory to deploy
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,
}

pub async fn handle_command(args: DeployArgs) -> Result<()> {
    let config = ClientConfig::load().context(
        "Failed to load config. Run 'launchpad config <api-key> <server-url>' to set your configuration",
    )?;
    let server_url = resolve_server_url(args.server_url, &config)?;

    println!("Creating deployment package...");
    let source = args.dir.clone();
    let packed = tokio::task::spawn_blocking(move || ArchivePacker::default().pack(&source))
        .await
        .context("Packing task failed")?
        .with_context(|| format!("Failed to create deployment package from {}", args.dir.display()))?;
    debug!(entries = packed.entries.len(), bytes = packed.bytes.len(), "Packed deployment");

    println!("Sending deployment to {}...", server_url.bold());
    let client = DeployClient::new(&server_url, config.api_key.clone())?;
    let reply = client.deploy(packed.bytes).await.context("Failed to send deployment")?;

    print!("{}", reply);
    println!("{}", "Deployment sent successfully!".green());
    Ok(())
}

/// An explicit URL wins over the saved one; having neither is an error
pub fn resolve_server_url(explicit: Option<String>, config: &ClientConfig) -> Result<String> {
    match explicit.filter(|url| !url.is_empty()) {
        Some(url) => Ok(url),
        None if !config.server_url.is_empty() => Ok(config.server_url.clone()),
        None => anyhow::bail!(
            "No server URL provided. Use 'launchpad <server-url>' or set it in config"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_url_wins() {
        let config = ClientConfig::new("k", "http://saved:9999");
        let url = resolve_server_url(Some("http://given:9999".into()), &config).unwrap();
        assert_eq!(url, "http://given:9999");
    }

    #[test]
    fn test_falls_back_to_saved_url() {
        let config = ClientConfig::new("k", "http://saved:9999");
        assert_eq!(resolve_server_url(None, &config).unwrap(), "http://saved:9999");
    }

    #[test]
    fn test_no_url_anywhere_is_error() {
        let config = ClientConfig::new("k", "");
        assert!(resolve_server_url(None, &config).is_err());
    }
}
