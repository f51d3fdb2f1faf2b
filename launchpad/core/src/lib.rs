// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Launchpad Core
//!
//! The receiving agent's upload → extract → execute pipeline, plus the
//! archive contract shared with the sending side.
//!
//! # Architecture
//!
//! - **domain:** workspace, credential, archive contract, path containment
//! - **application:** deployment service, script executor, workspace reaper
//! - **infrastructure:** zip packer/extractor, workspace store, event bus
//! - **presentation:** axum router and bearer authentication gate

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
