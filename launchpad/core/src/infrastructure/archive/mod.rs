// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Zip implementation of the deployment archive contract.

pub mod extractor;
pub mod packer;

pub use extractor::{ExtractError, SafeExtractor};
pub use packer::{ArchivePacker, PackError, PackedArchive};
