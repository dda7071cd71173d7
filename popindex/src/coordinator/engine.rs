// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Popularity Engine - single entry point for API layers and schedulers
//!
//! Bundles one storage gateway, one cache and the compute and query services
//! that share them.

use crate::aggregation::{
    AggregationEngine, BatchSummary, CompositeScore, ComputeOutcome, WeightingPolicy,
};
use crate::cache::{CacheManager, CacheStats};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::leaderboard::{LeaderboardGenerator, SnapshotOutcome};
use crate::query::QueryService;
use crate::storage::{
    Game, GameId, GameMetricDaily, LeaderboardSnapshot, MemoryGateway, Metric, MetricSource,
    PopularityIndexDaily, SourceId, StorageGateway,
};
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
#[cfg(feature = "sled-backend")]
use std::path::Path;
use std::sync::Arc;

/// Popularity Engine - orchestrates index computation, snapshots and reads
///
/// Cheap to share behind an `Arc`; every operation takes `&self`.
pub struct PopularityEngine {
    gateway: Arc<dyn StorageGateway>,
    cache: Arc<CacheManager>,
    clock: Arc<dyn Clock>,
    aggregation: AggregationEngine,
    leaderboard: LeaderboardGenerator,
    query: QueryService,
}

impl PopularityEngine {
    /// Create an engine over `gateway` using the system clock
    pub fn new(gateway: Arc<dyn StorageGateway>, config: EngineConfig) -> EngineResult<Self> {
        Self::with_clock(gateway, config, Arc::new(SystemClock))
    }

    /// Create an engine with an explicit clock (Advanced API)
    pub fn with_clock(
        gateway: Arc<dyn StorageGateway>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> EngineResult<Self> {
        config.validate()?;

        let cache = Arc::new(
            CacheManager::new(config.cache.clone())
                .map_err(|e| EngineError::InvalidConfig(format!("cache: {}", e)))?,
        );

        let aggregation = AggregationEngine::new(
            gateway.clone(),
            cache.clone(),
            WeightingPolicy::new(config.weighting.clone()),
            clock.clone(),
        );
        let leaderboard = LeaderboardGenerator::new(
            gateway.clone(),
            cache.clone(),
            config.leaderboard.clone(),
            clock.clone(),
        );
        let query = QueryService::new(gateway.clone(), cache.clone(), clock.clone());

        debug!(
            "Popularity engine ready (cache {})",
            if cache.is_enabled() { "enabled" } else { "disabled" }
        );

        Ok(Self {
            gateway,
            cache,
            clock,
            aggregation,
            leaderboard,
            query,
        })
    }

    /// Engine over a fresh in-memory store with default configuration
    pub fn in_memory() -> EngineResult<Self> {
        Self::new(Arc::new(MemoryGateway::new()), EngineConfig::default())
    }

    /// Engine over a sled store at `path`, created when missing
    #[cfg(feature = "sled-backend")]
    pub fn from_path(path: impl AsRef<Path>, config: EngineConfig) -> EngineResult<Self> {
        let gateway = crate::storage::SledGateway::open(path)?;
        Self::new(Arc::new(gateway), config)
    }

    pub fn gateway(&self) -> &Arc<dyn StorageGateway> {
        &self.gateway
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ---- compute ----

    pub async fn compute_popularity_index(
        &self,
        game_id: GameId,
        date: NaiveDate,
    ) -> EngineResult<ComputeOutcome> {
        self.aggregation.compute_popularity_index(game_id, date).await
    }

    pub async fn compute_all_for_date(&self, date: NaiveDate) -> EngineResult<BatchSummary> {
        self.aggregation.compute_all_for_date(date).await
    }

    pub async fn preview_index(
        &self,
        game_id: GameId,
        date: NaiveDate,
    ) -> EngineResult<CompositeScore> {
        self.aggregation.preview_index(game_id, date).await
    }

    pub async fn generate_snapshot(
        &self,
        period: &str,
        timestamp: DateTime<Utc>,
    ) -> EngineResult<SnapshotOutcome> {
        self.leaderboard.generate_snapshot(period, timestamp).await
    }

    // ---- queries ----

    pub async fn list_games(&self) -> EngineResult<Vec<Game>> {
        self.query.list_games().await
    }

    pub async fn list_metric_sources(&self) -> EngineResult<Vec<MetricSource>> {
        self.query.list_metric_sources().await
    }

    pub async fn list_metrics(&self, source_id: Option<SourceId>) -> EngineResult<Vec<Metric>> {
        self.query.list_metrics(source_id).await
    }

    pub async fn get_game_popularity(
        &self,
        game_id: GameId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<PopularityIndexDaily>> {
        self.query.get_game_popularity(game_id, start, end).await
    }

    pub async fn get_game_metrics(
        &self,
        game_id: GameId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<GameMetricDaily>> {
        self.query.get_game_metrics(game_id, start, end).await
    }

    pub async fn get_leaderboard(
        &self,
        period: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> EngineResult<Vec<LeaderboardSnapshot>> {
        self.query.get_leaderboard(period, timestamp).await
    }

    // ---- cache administration ----

    pub fn clear_popularity_cache(&self, game_id: GameId) -> usize {
        self.query.clear_popularity_cache(game_id)
    }

    pub fn clear_leaderboard_cache(&self, period: &str) -> usize {
        self.query.clear_leaderboard_cache(period)
    }

    pub fn clear_reference_cache(&self) -> usize {
        self.query.clear_reference_cache()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.query.cache_stats()
    }
}
