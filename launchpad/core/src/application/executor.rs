// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deployment Executor
//!
//! Locates the entry-point script in an extracted workspace, makes it
//! executable and hands it to a [`ScriptRunner`]. The returned handle
//! resolves when the script exits. Nobody has to await it: the HTTP
//! response goes out as soon as the launch succeeds.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Entry-point validation and fire-and-forget script launch

use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::domain::deployment::{DeploymentState, ScriptOutcome};
use crate::domain::events::DeploymentEvent;
use crate::domain::workspace::WorkspaceName;
use crate::infrastructure::event_bus::EventBus;

/// Log target the script's stdout/stderr lines are emitted under
pub const SCRIPT_LOG_TARGET: &str = "launchpad::script";

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("{0} not found in deployment")]
    MissingEntryPoint(String),

    #[error("Failed to inspect {}: {source}", .path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to make {} executable: {source}", .path.display())]
    Permissions {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to start {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What to run and where
#[derive(Debug, Clone)]
pub struct ScriptLaunch {
    pub workspace: WorkspaceName,
    pub working_dir: PathBuf,
    pub script: String,
}

/// A started script
pub struct LaunchedScript {
    pub pid: Option<u32>,
    pub completion: JoinHandle<ScriptOutcome>,
}

/// Starts an entry-point script as a detached unit of work
///
/// Implementations must return as soon as the script has started. The
/// `completion` handle reports how it ended.
pub trait ScriptRunner: Send + Sync {
    fn launch(&self, launch: ScriptLaunch) -> Result<LaunchedScript, ExecutorError>;
}

/// Runs the script as an OS process: `<interpreter> <script>` in the
/// extraction root, no stdin, output forwarded into the agent's logs
pub struct ProcessScriptRunner {
    interpreter: PathBuf,
}

impl ProcessScriptRunner {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl ScriptRunner for ProcessScriptRunner {
    fn launch(&self, launch: ScriptLaunch) -> Result<LaunchedScript, ExecutorError> {
        let mut child = Command::new(&self.interpreter)
            .arg(&launch.script)
            .current_dir(&launch.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecutorError::Spawn {
                program: self.interpreter.clone(),
                source,
            })?;

        let pid = child.id();

        // Forwarders are not awaited: a script that leaves a background
        // process holding the pipes must not keep the wait open.
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, launch.workspace.clone(), "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, launch.workspace.clone(), "stderr"));
        }

        let completion = tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => ScriptOutcome::Succeeded,
                Ok(status) => match status.code() {
                    Some(code) => ScriptOutcome::Failed { code },
                    None => ScriptOutcome::Terminated {
                        reason: status.to_string(),
                    },
                },
                Err(e) => ScriptOutcome::Terminated {
                    reason: e.to_string(),
                },
            }
        });

        Ok(LaunchedScript { pid, completion })
    }
}

/// Drain `reader` into the script log target
///
/// Lines are read as raw bytes and decoded lossily. The pipe stays open
/// until the script closes it: dropping the reader early would kill the
/// script with SIGPIPE on its next write.
async fn forward_lines<R>(reader: R, workspace: WorkspaceName, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(trim_line_ending(&buf));
                info!(target: SCRIPT_LOG_TARGET, workspace = %workspace, stream, "{}", line)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(workspace = %workspace, stream, error = %e, "Stopped reading script output");
                break;
            }
        }
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

pub struct DeploymentExecutor {
    runner: Arc<dyn ScriptRunner>,
    entry_script: String,
    events: EventBus,
}

impl DeploymentExecutor {
    pub fn new(runner: Arc<dyn ScriptRunner>, entry_script: impl Into<String>, events: EventBus) -> Self {
        Self {
            runner,
            entry_script: entry_script.into(),
            events,
        }
    }

    /// Check the entry script sits directly under `extracted` and add the
    /// execute bits
    pub async fn prepare(&self, extracted: &Path) -> Result<PathBuf, ExecutorError> {
        let script = extracted.join(&self.entry_script);

        let metadata = match tokio::fs::metadata(&script).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Err(ExecutorError::MissingEntryPoint(self.entry_script.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ExecutorError::MissingEntryPoint(self.entry_script.clone()))
            }
            Err(source) => return Err(ExecutorError::Inspect { path: script, source }),
        };

        make_executable(&script, metadata).await?;
        Ok(script)
    }

    /// Launch the entry script and return a handle resolving to its outcome
    ///
    /// The outcome is also logged and published. It is never reported back
    /// to the client.
    pub fn launch(&self, workspace: &WorkspaceName, extracted: &Path) -> Result<JoinHandle<ScriptOutcome>, ExecutorError> {
        let launched = self.runner.launch(ScriptLaunch {
            workspace: workspace.clone(),
            working_dir: extracted.to_path_buf(),
            script: self.entry_script.clone(),
        })?;

        info!(workspace = %workspace, pid = ?launched.pid, "Deploy script started");
        self.events.publish(DeploymentEvent::ScriptLaunched {
            workspace: workspace.clone(),
            pid: launched.pid,
            launched_at: Utc::now(),
        });

        let events = self.events.clone();
        let workspace = workspace.clone();
        let completion = launched.completion;

        Ok(tokio::spawn(async move {
            let outcome = completion.await.unwrap_or_else(|e| ScriptOutcome::Terminated {
                reason: e.to_string(),
            });

            let state = DeploymentState::Executing;
            if outcome.is_success() {
                info!(workspace = %workspace, state = ?state, "Deploy script completed successfully");
            } else {
                error!(workspace = %workspace, state = ?state, outcome = %outcome, "Deploy script failed");
            }

            events.publish(DeploymentEvent::ScriptExited {
                workspace,
                outcome: outcome.clone(),
                exited_at: Utc::now(),
            });
            outcome
        }))
    }
}

#[cfg(unix)]
async fn make_executable(script: &Path, metadata: std::fs::Metadata) -> Result<(), ExecutorError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = metadata.permissions().mode() | 0o755;
    tokio::fs::set_permissions(script, std::fs::Permissions::from_mode(mode))
        .await
        .map_err(|source| ExecutorError::Permissions {
            path: script.to_path_buf(),
            source,
        })
}

#[cfg(not(unix))]
async fn make_executable(_script: &Path, _metadata: std::fs::Metadata) -> Result<(), ExecutorError> {
    Ok(())
}
