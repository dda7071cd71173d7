// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache-first read path
//!
//! Every read checks the cache, falls back to the gateway and stores what it
//! read unless an invalidation ran while the gateway read was in flight.
//! Invalid input (reversed or future-only ranges, blank periods) returns
//! an empty result without touching either. Storage failures propagate.

use crate::cache::{keys, CacheManager, CacheStats, CachedValue, InvalidationEvent};
use crate::clock::Clock;
use crate::error::EngineResult;
use crate::storage::{
    Game, GameId, GameMetricDaily, LeaderboardSnapshot, Metric, MetricSource,
    PopularityIndexDaily, SourceId, StorageGateway,
};
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, trace};
use std::sync::Arc;

pub struct QueryService {
    gateway: Arc<dyn StorageGateway>,
    cache: Arc<CacheManager>,
    clock: Arc<dyn Clock>,
}

impl QueryService {
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        cache: Arc<CacheManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            cache,
            clock,
        }
    }

    /// Ranges that can hold no rows: reversed, or starting after today
    fn is_empty_range(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start > end || start > self.clock.today()
    }

    pub async fn list_games(&self) -> EngineResult<Vec<Game>> {
        let key = keys::games_all();
        if let Some(games) = self.cache.get(&key).and_then(CachedValue::into_games) {
            return Ok(games);
        }

        let generation = self.cache.generation();
        let games = self.gateway.list_games().await?;
        self.cache.set_if_generation(
            key,
            CachedValue::Games(games.clone()),
            self.cache.config().reference_ttl,
            generation,
        );
        Ok(games)
    }

    pub async fn list_metric_sources(&self) -> EngineResult<Vec<MetricSource>> {
        let key = keys::sources_all();
        if let Some(sources) = self
            .cache
            .get(&key)
            .and_then(CachedValue::into_metric_sources)
        {
            return Ok(sources);
        }

        let generation = self.cache.generation();
        let sources = self.gateway.list_metric_sources().await?;
        self.cache.set_if_generation(
            key,
            CachedValue::MetricSources(sources.clone()),
            self.cache.config().reference_ttl,
            generation,
        );
        Ok(sources)
    }

    /// Metric definitions, restricted to one source when given
    pub async fn list_metrics(&self, source_id: Option<SourceId>) -> EngineResult<Vec<Metric>> {
        let key = keys::metrics(source_id);
        if let Some(metrics) = self.cache.get(&key).and_then(CachedValue::into_metrics) {
            return Ok(metrics);
        }

        let generation = self.cache.generation();
        let metrics = self.gateway.list_metrics(source_id).await?;
        self.cache.set_if_generation(
            key,
            CachedValue::Metrics(metrics.clone()),
            self.cache.config().reference_ttl,
            generation,
        );
        Ok(metrics)
    }

    /// Index rows for `[start, end]`, ascending by date
    pub async fn get_game_popularity(
        &self,
        game_id: GameId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<PopularityIndexDaily>> {
        if self.is_empty_range(start, end) {
            debug!(
                "Popularity range {}..={} for game {} is empty",
                start, end, game_id
            );
            return Ok(Vec::new());
        }

        let key = keys::popularity(game_id, start, end);
        if let Some(rows) = self.cache.get(&key).and_then(CachedValue::into_popularity) {
            trace!("Popularity for game {} served from cache", game_id);
            return Ok(rows);
        }

        let generation = self.cache.generation();
        let rows = self.gateway.query_popularity(game_id, start, end).await?;
        self.cache.set_if_generation(
            key,
            CachedValue::Popularity(rows.clone()),
            self.cache.config().series_ttl,
            generation,
        );
        Ok(rows)
    }

    /// Raw facts for `[start, end]`, ordered by (date, metric id)
    pub async fn get_game_metrics(
        &self,
        game_id: GameId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<GameMetricDaily>> {
        if self.is_empty_range(start, end) {
            debug!("Metric range {}..={} for game {} is empty", start, end, game_id);
            return Ok(Vec::new());
        }

        let key = keys::game_metrics(game_id, start, end);
        if let Some(rows) = self.cache.get(&key).and_then(CachedValue::into_game_metrics) {
            return Ok(rows);
        }

        let generation = self.cache.generation();
        let rows = self.gateway.query_game_metrics(game_id, start, end).await?;
        self.cache.set_if_generation(
            key,
            CachedValue::GameMetrics(rows.clone()),
            self.cache.config().series_ttl,
            generation,
        );
        Ok(rows)
    }

    /// One snapshot ordered by rank; the latest for the period when
    /// `timestamp` is `None`
    pub async fn get_leaderboard(
        &self,
        period: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> EngineResult<Vec<LeaderboardSnapshot>> {
        let period = period.trim();
        if period.is_empty() {
            debug!("Leaderboard requested with blank period");
            return Ok(Vec::new());
        }

        let key = keys::leaderboard(period, timestamp);
        if let Some(rows) = self.cache.get(&key).and_then(CachedValue::into_leaderboard) {
            return Ok(rows);
        }

        let generation = self.cache.generation();
        let resolved = match timestamp {
            Some(ts) => Some(ts),
            None => self.gateway.latest_snapshot_timestamp(period).await?,
        };
        let rows = match resolved {
            Some(ts) => self.gateway.get_snapshot(period, ts).await?,
            None => Vec::new(),
        };

        self.cache.set_if_generation(
            key,
            CachedValue::Leaderboard(rows.clone()),
            self.cache.config().leaderboard_ttl,
            generation,
        );
        Ok(rows)
    }

    /// Drop cached popularity and metric series for one game
    pub fn clear_popularity_cache(&self, game_id: GameId) -> usize {
        self.cache
            .handle_event(InvalidationEvent::Manual {
                prefixes: vec![
                    keys::popularity_prefix(game_id),
                    keys::game_metrics_prefix(game_id),
                ],
                reason: format!("clear popularity cache for game {}", game_id),
            })
            .entries_invalidated
    }

    pub fn clear_leaderboard_cache(&self, period: &str) -> usize {
        self.cache
            .handle_event(InvalidationEvent::LeaderboardChanged {
                period: period.trim().to_string(),
            })
            .entries_invalidated
    }

    /// Drop cached game, source and metric listings
    pub fn clear_reference_cache(&self) -> usize {
        self.cache
            .handle_event(InvalidationEvent::ReferenceDataChanged)
            .entries_invalidated
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::clock::FixedClock;
    use crate::storage::MemoryGateway;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
    }

    fn service(gateway: &MemoryGateway) -> QueryService {
        QueryService::new(
            Arc::new(gateway.clone()),
            Arc::new(CacheManager::new(CacheConfig::default()).unwrap()),
            Arc::new(FixedClock::at_date(today())),
        )
    }

    #[tokio::test]
    async fn test_invalid_ranges_skip_the_gateway() {
        let gateway = MemoryGateway::new();
        gateway.set_unavailable(true);
        let service = service(&gateway);

        let reversed = service
            .get_game_popularity(1, today(), today().pred_opt().unwrap())
            .await
            .unwrap();
        assert!(reversed.is_empty());

        let future = today().succ_opt().unwrap();
        let rows = service.get_game_metrics(1, future, future).await.unwrap();
        assert!(rows.is_empty());

        assert!(service.get_leaderboard("  ", None).await.unwrap().is_empty());
        assert_eq!(service.cache_stats().misses, 0);
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let gateway = MemoryGateway::new();
        gateway.set_unavailable(true);
        let err = service(&gateway).list_games().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_leaderboard_is_empty() {
        let gateway = MemoryGateway::new();
        let rows = service(&gateway).get_leaderboard("daily", None).await.unwrap();
        assert!(rows.is_empty());
    }
}
