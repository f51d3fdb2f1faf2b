// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the launchpad CLI

pub mod agent;
pub mod config;
pub mod deploy;

pub use self::agent::AgentArgs;
pub use self::deploy::DeployArgs;
