// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent HTTP server

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use launchpad_core::application::DeploymentService;
use launchpad_core::domain::agent_config::AgentConfig;
use launchpad_core::infrastructure::EventBus;
use launchpad_core::presentation::{app, BearerGate};

pub async fn start_agent(config: AgentConfig) -> Result<()> {
    config.validate().context("Configuration validation failed")?;

    let event_bus = EventBus::with_default_capacity();
    let deployments = DeploymentService::from_config(&config, event_bus)
        .context("Failed to prepare upload directory")?;

    info!(
        upload_dir = %config.upload_dir.display(),
        entry_script = %config.entry_script,
        grace_secs = config.grace_period.as_secs_f64(),
        "Agent configured"
    );

    let router = app(
        Arc::new(deployments),
        BearerGate::new(config.api_key.clone()),
        config.max_upload_bytes,
    );

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;

    info!("Agent listening on {}", config.listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Agent shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
