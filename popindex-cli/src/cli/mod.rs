// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for PopIndex
//!
//! Operator commands for computing indices, generating snapshots and
//! inspecting stored data in a sled-backed store.

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{Cli, Commands};
pub use handlers::run;
