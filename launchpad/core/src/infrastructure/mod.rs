// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod archive;
pub mod event_bus;
pub mod workspace_store;

pub use event_bus::{EventBus, EventBusError, EventReceiver};
pub use workspace_store::{LocalWorkspaceStore, StoreError};
