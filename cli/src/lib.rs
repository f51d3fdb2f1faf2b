// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Launchpad CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Client config store, upload client, agent server and the
//!   command handlers wired up by the binary

pub mod agent;
pub mod commands;
pub mod config;
