// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Presentation Layer
//!
//! # Architecture
//!
//! - **Layer:** Presentation Layer
//! - **Purpose:** HTTP surface of the receiving agent

pub mod api;
pub mod auth;

pub use api::{app, DEPLOYMENT_FIELD};
pub use auth::{require_bearer, AuthError, BearerGate};
