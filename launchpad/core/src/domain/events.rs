// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::deployment::{ReapOutcome, ScriptOutcome};
use crate::domain::workspace::WorkspaceName;

/// Deployment lifecycle events
///
/// Published on the event bus at each stage transition. Failures after the
/// script launches are only observable here and in the logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeploymentEvent {
    WorkspaceCreated {
        workspace: WorkspaceName,
        created_at: DateTime<Utc>,
    },
    ArchiveExtracted {
        workspace: WorkspaceName,
        entries: usize,
        extracted_at: DateTime<Utc>,
    },
    PathTraversalBlocked {
        workspace: WorkspaceName,
        attempted_path: String,
        blocked_at: DateTime<Utc>,
    },
    ScriptLaunched {
        workspace: WorkspaceName,
        pid: Option<u32>,
        launched_at: DateTime<Utc>,
    },
    ScriptExited {
        workspace: WorkspaceName,
        outcome: ScriptOutcome,
        exited_at: DateTime<Utc>,
    },
    WorkspaceReaped {
        workspace: WorkspaceName,
        outcome: ReapOutcome,
        reaped_at: DateTime<Utc>,
    },
}

impl DeploymentEvent {
    pub fn workspace(&self) -> &WorkspaceName {
        match self {
            DeploymentEvent::WorkspaceCreated { workspace, .. }
            | DeploymentEvent::ArchiveExtracted { workspace, .. }
            | DeploymentEvent::PathTraversalBlocked { workspace, .. }
            | DeploymentEvent::ScriptLaunched { workspace, .. }
            | DeploymentEvent::ScriptExited { workspace, .. }
            | DeploymentEvent::WorkspaceReaped { workspace, .. } => workspace,
        }
    }
}
