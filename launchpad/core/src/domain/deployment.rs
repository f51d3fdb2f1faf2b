// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deployment lifecycle states and the outcomes of its detached stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `Uploading → Extracting → AwaitingExecution → Executing → Reaped`
///
/// Failures before `Executing` are reported to the client synchronously.
/// From `Executing` on they are only visible in logs and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    Uploading,
    Extracting,
    AwaitingExecution,
    Executing,
    Reaped,
}

/// How the entry-point script ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ScriptOutcome {
    Succeeded,
    Failed { code: i32 },
    /// Killed by a signal, or the wait itself failed
    Terminated { reason: String },
}

impl ScriptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ScriptOutcome::Succeeded)
    }
}

impl fmt::Display for ScriptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptOutcome::Succeeded => write!(f, "exit 0"),
            ScriptOutcome::Failed { code } => write!(f, "exit {}", code),
            ScriptOutcome::Terminated { reason } => write!(f, "terminated: {}", reason),
        }
    }
}

/// Result of a workspace removal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ReapOutcome {
    Removed,
    /// Nothing to remove; counts as success
    AlreadyAbsent,
    Failed { error: String },
}

impl ReapOutcome {
    pub fn is_clean(&self) -> bool {
        !matches!(self, ReapOutcome::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&DeploymentState::AwaitingExecution).unwrap(),
            "\"awaiting_execution\""
        );
    }

    #[test]
    fn test_reap_outcome_absent_is_clean() {
        assert!(ReapOutcome::Removed.is_clean());
        assert!(ReapOutcome::AlreadyAbsent.is_clean());
        assert!(!ReapOutcome::Failed { error: "EBUSY".into() }.is_clean());
    }
}
