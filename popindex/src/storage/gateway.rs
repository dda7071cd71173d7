// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage gateway trait
//!
//! The gateway is the only way the engine touches persisted records. Every
//! implementation must enforce two uniqueness rules itself, atomically:
//!
//! - at most one popularity index row per (game, date), see
//!   [`StorageGateway::insert_popularity_if_absent`]
//! - at most one leaderboard snapshot per (period, timestamp), written as a
//!   single all-or-nothing batch, see [`StorageGateway::insert_snapshot_batch`]
//!
//! Implementations must not hold a lock across an `.await`.

use super::types::{
    Game, GameId, GameMetricDaily, LeaderboardSnapshot, Metric, MetricId, MetricSource,
    PopularityIndexDaily, SourceId, StorageResult,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

#[async_trait]
pub trait StorageGateway: Send + Sync {
    // ---- reference data ----

    /// All games ordered by id
    async fn list_games(&self) -> StorageResult<Vec<Game>>;

    async fn get_game(&self, game_id: GameId) -> StorageResult<Option<Game>>;

    /// All metric sources ordered by id
    async fn list_metric_sources(&self) -> StorageResult<Vec<MetricSource>>;

    /// Metric definitions ordered by id, restricted to one source when given
    async fn list_metrics(&self, source_id: Option<SourceId>) -> StorageResult<Vec<Metric>>;

    // ---- daily facts ----

    /// Facts for one game within `[start, end]`, ordered by (date, metric id)
    async fn query_game_metrics(
        &self,
        game_id: GameId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<GameMetricDaily>>;

    async fn get_game_metric(
        &self,
        game_id: GameId,
        metric_id: MetricId,
        date: NaiveDate,
    ) -> StorageResult<Option<GameMetricDaily>>;

    // ---- popularity index ----

    async fn get_popularity(
        &self,
        game_id: GameId,
        date: NaiveDate,
    ) -> StorageResult<Option<PopularityIndexDaily>>;

    /// Index rows for one game within `[start, end]`, ordered by date
    async fn query_popularity(
        &self,
        game_id: GameId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<PopularityIndexDaily>>;

    /// Each game's most recent index dated within `[earliest, as_of]`,
    /// at most one row per game, ordered by game id
    async fn latest_popularity_as_of(
        &self,
        as_of: NaiveDate,
        earliest: NaiveDate,
    ) -> StorageResult<Vec<PopularityIndexDaily>>;

    /// Atomically store `row` unless a row for (game, date) already exists.
    /// Returns `true` when the row was written.
    async fn insert_popularity_if_absent(&self, row: PopularityIndexDaily) -> StorageResult<bool>;

    // ---- leaderboard snapshots ----

    /// Rows of one snapshot ordered by rank
    async fn get_snapshot(
        &self,
        period: &str,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<Vec<LeaderboardSnapshot>>;

    async fn latest_snapshot_timestamp(&self, period: &str)
        -> StorageResult<Option<DateTime<Utc>>>;

    /// Atomically write every row of one snapshot, unless the snapshot for
    /// (period, timestamp) already exists. An empty `rows` still marks the
    /// snapshot as generated. Returns `true` when the batch was written.
    async fn insert_snapshot_batch(
        &self,
        period: &str,
        timestamp: DateTime<Utc>,
        rows: Vec<LeaderboardSnapshot>,
    ) -> StorageResult<bool>;

    // ---- catalog and ingestion writes ----

    async fn put_game(&self, game: Game) -> StorageResult<()>;

    /// Returns `true` when a game was removed
    async fn remove_game(&self, game_id: GameId) -> StorageResult<bool>;

    async fn put_metric_source(&self, source: MetricSource) -> StorageResult<()>;

    async fn put_metric(&self, metric: Metric) -> StorageResult<()>;

    /// Upsert per (game, metric, date)
    async fn put_game_metric(&self, fact: GameMetricDaily) -> StorageResult<()>;
}
