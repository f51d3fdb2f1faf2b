// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deployment Service
//!
//! Drives one authenticated upload through the synchronous part of its
//! lifecycle: allocate a workspace, persist the archive, extract it, check
//! for the entry script and launch it. Everything after the launch
//! (script completion, workspace removal) runs detached and is reported
//! through the [`EventBus`] and the returned [`DeploymentHandle`].
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Orchestrates store, extractor, executor and reaper

use axum::http::StatusCode;
use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::application::executor::{DeploymentExecutor, ExecutorError, ProcessScriptRunner, ScriptRunner};
use crate::application::reaper::WorkspaceReaper;
use crate::domain::agent_config::AgentConfig;
use crate::domain::deployment::{DeploymentState, ReapOutcome, ScriptOutcome};
use crate::domain::events::DeploymentEvent;
use crate::domain::workspace::{Workspace, WorkspaceName};
use crate::infrastructure::archive::{ExtractError, SafeExtractor};
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::workspace_store::{LocalWorkspaceStore, StoreError};

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("Failed to create deployment directory: {0}")]
    CreateWorkspace(#[source] StoreError),

    #[error("Failed to save zip file: {0}")]
    SaveArchive(#[source] StoreError),

    #[error("Failed to extract deployment: {0}")]
    Extract(#[from] ExtractError),

    #[error("Extraction task failed: {0}")]
    ExtractionTask(String),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl DeploymentError {
    /// 400 when the upload itself was at fault, 500 when the agent was
    pub fn status_code(&self) -> StatusCode {
        match self {
            DeploymentError::Extract(e) if e.is_unsafe_path() => StatusCode::BAD_REQUEST,
            DeploymentError::Executor(ExecutorError::MissingEntryPoint(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The lifecycle state the deployment was in when it failed
    pub fn state(&self) -> DeploymentState {
        match self {
            DeploymentError::CreateWorkspace(_) | DeploymentError::SaveArchive(_) => DeploymentState::Uploading,
            DeploymentError::Extract(_) | DeploymentError::ExtractionTask(_) => DeploymentState::Extracting,
            DeploymentError::Executor(_) => DeploymentState::AwaitingExecution,
        }
    }
}

/// The detached remainder of a launched deployment
///
/// Dropping the handle does not cancel anything.
pub struct DeploymentHandle {
    pub workspace: Workspace,
    pub execution: JoinHandle<ScriptOutcome>,
    pub reaper: JoinHandle<ReapOutcome>,
}

pub struct DeploymentService {
    store: LocalWorkspaceStore,
    extractor: Arc<SafeExtractor>,
    executor: DeploymentExecutor,
    reaper: WorkspaceReaper,
    events: EventBus,
}

impl DeploymentService {
    pub fn new(
        store: LocalWorkspaceStore,
        executor: DeploymentExecutor,
        reaper: WorkspaceReaper,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            extractor: Arc::new(SafeExtractor::new()),
            executor,
            reaper,
            events,
        }
    }

    /// Wire the service the way the agent runs it: local upload root,
    /// OS process runner, configured grace period
    pub fn from_config(config: &AgentConfig, events: EventBus) -> Result<Self, StoreError> {
        let runner: Arc<dyn ScriptRunner> = Arc::new(ProcessScriptRunner::new(&config.interpreter));
        Self::with_runner(config, runner, events)
    }

    /// Same as [`DeploymentService::from_config`] with a custom script runner
    pub fn with_runner(
        config: &AgentConfig,
        runner: Arc<dyn ScriptRunner>,
        events: EventBus,
    ) -> Result<Self, StoreError> {
        let store = LocalWorkspaceStore::new(&config.upload_dir)?.with_naming(config.workspace_naming);
        let executor = DeploymentExecutor::new(runner, config.entry_script.clone(), events.clone());
        let reaper = WorkspaceReaper::new(store.clone(), config.grace_period, events.clone());
        Ok(Self::new(store, executor, reaper, events))
    }

    /// Run an uploaded archive through extraction and launch its entry
    /// script
    ///
    /// Returns once the script has started. Failures before that point are
    /// returned to the caller and leave the workspace on disk; only a
    /// launched deployment is scheduled for removal.
    pub async fn deploy(&self, archive: Bytes) -> Result<DeploymentHandle, DeploymentError> {
        let workspace = self.store.create().await.map_err(|e| {
            error!(state = ?DeploymentState::Uploading, error = %e, "Failed to create deployment directory");
            DeploymentError::CreateWorkspace(e)
        })?;
        self.events.publish(DeploymentEvent::WorkspaceCreated {
            workspace: workspace.name().clone(),
            created_at: Utc::now(),
        });

        self.store
            .write_archive(&workspace, &archive)
            .await
            .map_err(|e| {
                error!(
                    workspace = %workspace.name(),
                    state = ?DeploymentState::Uploading,
                    error = %e,
                    "Failed to save zip file"
                );
                DeploymentError::SaveArchive(e)
            })?;
        info!(workspace = %workspace.name(), bytes = archive.len(), "Received deployment archive");

        let execution = self.extract_and_launch(&workspace).await?;
        let reaper = self.reaper.schedule(workspace.clone());
        info!(workspace = %workspace.name(), "Deployment started");

        Ok(DeploymentHandle {
            workspace,
            execution,
            reaper,
        })
    }

    async fn extract_and_launch(&self, workspace: &Workspace) -> Result<JoinHandle<ScriptOutcome>, DeploymentError> {
        let archive_path = workspace.archive_path();
        let extracted = workspace.extracted_dir();

        enter(workspace.name(), DeploymentState::Extracting);
        let extractor = Arc::clone(&self.extractor);
        let dest = extracted.clone();
        let result = tokio::task::spawn_blocking(move || extractor.extract(&archive_path, &dest))
            .await
            .map_err(|e| DeploymentError::ExtractionTask(e.to_string()))?;

        let entries = match result {
            Ok(entries) => entries,
            Err(e) => {
                match &e {
                    ExtractError::UnsafePath { entry, .. } => {
                        self.events.publish(DeploymentEvent::PathTraversalBlocked {
                            workspace: workspace.name().clone(),
                            attempted_path: entry.clone(),
                            blocked_at: Utc::now(),
                        });
                    }
                    _ => error!(
                        workspace = %workspace.name(),
                        state = ?DeploymentState::Extracting,
                        error = %e,
                        "Failed to extract deployment"
                    ),
                }
                return Err(e.into());
            }
        };

        self.events.publish(DeploymentEvent::ArchiveExtracted {
            workspace: workspace.name().clone(),
            entries: entries.len(),
            extracted_at: Utc::now(),
        });

        enter(workspace.name(), DeploymentState::AwaitingExecution);
        if let Err(e) = self.executor.prepare(&extracted).await {
            let e = DeploymentError::from(e);
            if e.status_code().is_client_error() {
                warn!(workspace = %workspace.name(), state = ?e.state(), error = %e, "Deployment rejected");
            } else {
                error!(workspace = %workspace.name(), state = ?e.state(), error = %e, "Failed to prepare deploy script");
            }
            return Err(e);
        }

        let execution = self.executor.launch(workspace.name(), &extracted).map_err(|e| {
            error!(
                workspace = %workspace.name(),
                state = ?DeploymentState::AwaitingExecution,
                error = %e,
                "Failed to start deploy script"
            );
            DeploymentError::from(e)
        })?;
        enter(workspace.name(), DeploymentState::Executing);
        Ok(execution)
    }
}

fn enter(workspace: &WorkspaceName, state: DeploymentState) {
    debug!(workspace = %workspace, state = ?state, "Deployment state changed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::path_sanitizer::PathSanitizerError;
    use crate::infrastructure::workspace_store::StoreError;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_error_state_tracks_failing_stage() {
        let create = DeploymentError::CreateWorkspace(StoreError::CreateDir {
            path: PathBuf::from("uploads/deploy-20260101-000000"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        });
        assert_eq!(create.state(), DeploymentState::Uploading);

        let save = DeploymentError::SaveArchive(StoreError::Write {
            path: PathBuf::from("uploads/deploy-20260101-000000/deployment.zip"),
            source: io::Error::new(io::ErrorKind::Other, "disk full"),
        });
        assert_eq!(save.state(), DeploymentState::Uploading);

        let unsafe_path = DeploymentError::Extract(ExtractError::UnsafePath {
            entry: "../x".into(),
            reason: PathSanitizerError::PathTraversal("../x".into()),
        });
        assert_eq!(unsafe_path.state(), DeploymentState::Extracting);

        let missing = DeploymentError::Executor(ExecutorError::MissingEntryPoint("DEPLOY.sh".into()));
        assert_eq!(missing.state(), DeploymentState::AwaitingExecution);
    }
}
