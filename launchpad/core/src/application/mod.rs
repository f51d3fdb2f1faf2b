// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application Layer
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Deployment use case and its detached follow-ups

pub mod deployment;
pub mod executor;
pub mod reaper;

pub use deployment::{DeploymentError, DeploymentHandle, DeploymentService};
pub use executor::{DeploymentExecutor, ExecutorError, LaunchedScript, ProcessScriptRunner, ScriptLaunch, ScriptRunner};
pub use reaper::WorkspaceReaper;
