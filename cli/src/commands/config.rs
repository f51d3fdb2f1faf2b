// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `launchpad config <api-key> <server-url>`

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::debug;

use crate::config::ClientConfig;

pub async fn handle_command(api_key: String, server_url: String) -> Result<()> {
    if api_key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    let path = ClientConfig::new(api_key, server_url)
        .save()
        .context("Failed to save config")?;
    debug!(path = %path.display(), "Wrote client configuration");

    println!("{}", "Configuration saved successfully".green());
    Ok(())
}
