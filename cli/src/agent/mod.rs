// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Both ends of the wire: the receiving agent's server and the uploading
//! client

pub mod client;
pub mod server;

pub use client::{ClientError, DeployClient};
pub use server::start_agent;
