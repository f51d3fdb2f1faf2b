// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain Layer
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Deployment vocabulary with no I/O beyond path canonicalization

pub mod agent_config;
pub mod archive;
pub mod credential;
pub mod deployment;
pub mod events;
pub mod path_sanitizer;
pub mod workspace;
