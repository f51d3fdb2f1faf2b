// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Workspace Reaper
//!
//! Deletes a workspace after a fixed grace period. The timer starts when
//! the deployment is launched and does not wait for the script: the grace
//! period has to cover however long the script needs its files.

use chrono::Utc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::deployment::{DeploymentState, ReapOutcome};
use crate::domain::events::DeploymentEvent;
use crate::domain::workspace::Workspace;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::workspace_store::LocalWorkspaceStore;

#[derive(Clone)]
pub struct WorkspaceReaper {
    store: LocalWorkspaceStore,
    grace_period: Duration,
    events: EventBus,
}

impl WorkspaceReaper {
    pub fn new(store: LocalWorkspaceStore, grace_period: Duration, events: EventBus) -> Self {
        Self {
            store,
            grace_period,
            events,
        }
    }

    /// Remove `workspace` once the grace period has elapsed
    pub fn schedule(&self, workspace: Workspace) -> JoinHandle<ReapOutcome> {
        let reaper = self.clone();
        debug!(
            workspace = %workspace.name(),
            grace_secs = self.grace_period.as_secs_f64(),
            "Scheduled workspace removal"
        );
        tokio::spawn(async move {
            tokio::time::sleep(reaper.grace_period).await;
            reaper.reap(&workspace).await
        })
    }

    /// Remove `workspace` now. A workspace that is already gone counts as
    /// success, and failures are logged rather than returned.
    pub async fn reap(&self, workspace: &Workspace) -> ReapOutcome {
        let outcome = match self.store.remove(workspace.root()).await {
            Ok(true) => {
                info!(
                    workspace = %workspace.name(),
                    state = ?DeploymentState::Reaped,
                    "Cleaned up deployment directory"
                );
                ReapOutcome::Removed
            }
            Ok(false) => {
                debug!(workspace = %workspace.name(), "Deployment directory already removed");
                ReapOutcome::AlreadyAbsent
            }
            Err(e) => {
                warn!(workspace = %workspace.name(), error = %e, "Failed to clean up deployment directory");
                ReapOutcome::Failed { error: e.to_string() }
            }
        };

        self.events.publish(DeploymentEvent::WorkspaceReaped {
            workspace: workspace.name().clone(),
            outcome: outcome.clone(),
            reaped_at: Utc::now(),
        });
        outcome
    }
}
