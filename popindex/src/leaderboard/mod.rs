// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Ranked, immutable leaderboard snapshots

pub mod generator;
pub mod ranking;

pub use generator::{LeaderboardGenerator, SnapshotOutcome};
pub use ranking::{rank, RankedGame};
