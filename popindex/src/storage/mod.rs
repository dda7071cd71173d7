// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage gateway for popularity data
//!
//! This module provides:
//! - Record types for games, metric definitions, daily facts, index rows and snapshots
//! - The `StorageGateway` trait every backing store implements
//! - An in-memory gateway for tests and embedding
//! - A sled-backed persistent gateway (feature `sled-backend`)

pub mod gateway;
pub mod memory;
#[cfg(feature = "sled-backend")]
pub mod sled;
pub mod types;

pub use gateway::StorageGateway;
pub use memory::MemoryGateway;
#[cfg(feature = "sled-backend")]
pub use self::sled::SledGateway;
pub use types::{
    AggregationMethod, DataQuality, Game, GameId, GameMetricDaily, LeaderboardSnapshot, Metric,
    MetricId, MetricSource, PopularityIndexDaily, SourceId, StorageError, StorageResult,
};
