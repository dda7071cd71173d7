// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! PopIndex - Popularity index and leaderboard engine
//!
//! Turns per-game daily metrics collected from many external sources into a
//! single comparable popularity score per game per day, and freezes ranked
//! snapshots of those scores into immutable leaderboards.
//!
//! # Features
//!
//! - **Weighted aggregation**: log-scaled, category-weighted composite in `0..=100`
//! - **Idempotent writes**: one index row per (game, date), one snapshot per (period, timestamp)
//! - **Deterministic ranking**: ties broken by ascending game id
//! - **Read-through cache**: TTL expiry plus event-driven invalidation
//! - **Embedded storage**: in-memory gateway, or Sled with the `sled-backend` feature
//!
//! # Usage
//!
//! ```no_run
//! use popindex::{PopularityEngine, EngineConfig};
//!
//! # async fn run() -> Result<(), popindex::EngineError> {
//! let engine = PopularityEngine::from_path("./popdb", EngineConfig::default())?;
//! let today = chrono::Utc::now().date_naive();
//!
//! engine.compute_all_for_date(today).await?;
//! engine.generate_snapshot("daily", chrono::Utc::now()).await?;
//! let leaderboard = engine.get_leaderboard("daily", None).await?;
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod cache;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod leaderboard;
pub mod query;
pub mod storage;

pub use aggregation::{
    BatchSummary, CompositeScore, ComputeOutcome, MetricCategory, WeightingConfig,
};
pub use cache::{CacheConfig, CacheStats, EvictionPolicy};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{EngineConfig, LeaderboardConfig};
pub use coordinator::PopularityEngine;
pub use error::{EngineError, EngineResult};
pub use leaderboard::SnapshotOutcome;
pub use storage::{
    AggregationMethod, DataQuality, Game, GameId, GameMetricDaily, LeaderboardSnapshot,
    MemoryGateway, Metric, MetricId, MetricSource, PopularityIndexDaily, SourceId, StorageError,
    StorageGateway,
};
#[cfg(feature = "sled-backend")]
pub use storage::SledGateway;

/// PopIndex version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// PopIndex crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
