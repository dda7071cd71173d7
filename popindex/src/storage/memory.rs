// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory storage gateway for testing and embedding

use super::gateway::StorageGateway;
use super::types::{
    Game, GameId, GameMetricDaily, LeaderboardSnapshot, Metric, MetricId, MetricSource,
    PopularityIndexDaily, SourceId, StorageError, StorageResult,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Tables {
    games: BTreeMap<GameId, Game>,
    sources: BTreeMap<SourceId, MetricSource>,
    metrics: BTreeMap<MetricId, Metric>,
    facts: BTreeMap<(GameId, NaiveDate, MetricId), GameMetricDaily>,
    popularity: BTreeMap<(GameId, NaiveDate), PopularityIndexDaily>,
    snapshots: BTreeMap<(String, DateTime<Utc>), Vec<LeaderboardSnapshot>>,
}

/// In-memory storage gateway
///
/// All tables live behind one lock, so every write is atomic with respect to
/// every read. Cloning shares the underlying tables.
#[derive(Clone, Default)]
pub struct MemoryGateway {
    tables: Arc<RwLock<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryGateway {
    /// Create a new, empty memory gateway
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StorageError::Unavailable`]
    /// until switched back. Used to exercise failure propagation.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored popularity rows
    pub fn popularity_row_count(&self) -> usize {
        self.tables.read().popularity.len()
    }

    /// Number of stored snapshots (not rows)
    pub fn snapshot_count(&self) -> usize {
        self.tables.read().snapshots.len()
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "memory gateway switched offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageGateway for MemoryGateway {
    async fn list_games(&self) -> StorageResult<Vec<Game>> {
        self.check_available()?;
        Ok(self.tables.read().games.values().cloned().collect())
    }

    async fn get_game(&self, game_id: GameId) -> StorageResult<Option<Game>> {
        self.check_available()?;
        Ok(self.tables.read().games.get(&game_id).cloned())
    }

    async fn list_metric_sources(&self) -> StorageResult<Vec<MetricSource>> {
        self.check_available()?;
        Ok(self.tables.read().sources.values().cloned().collect())
    }

    async fn list_metrics(&self, source_id: Option<SourceId>) -> StorageResult<Vec<Metric>> {
        self.check_available()?;
        Ok(self
            .tables
            .read()
            .metrics
            .values()
            .filter(|m| source_id.map_or(true, |id| m.source_id == id))
            .cloned()
            .collect())
    }

    async fn query_game_metrics(
        &self,
        game_id: GameId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<GameMetricDaily>> {
        self.check_available()?;
        if start > end {
            return Ok(Vec::new());
        }
        let tables = self.tables.read();
        Ok(tables
            .facts
            .range((game_id, start, MetricId::MIN)..=(game_id, end, MetricId::MAX))
            .map(|(_, fact)| fact.clone())
            .collect())
    }

    async fn get_game_metric(
        &self,
        game_id: GameId,
        metric_id: MetricId,
        date: NaiveDate,
    ) -> StorageResult<Option<GameMetricDaily>> {
        self.check_available()?;
        Ok(self
            .tables
            .read()
            .facts
            .get(&(game_id, date, metric_id))
            .cloned())
    }

    async fn get_popularity(
        &self,
        game_id: GameId,
        date: NaiveDate,
    ) -> StorageResult<Option<PopularityIndexDaily>> {
        self.check_available()?;
        Ok(self.tables.read().popularity.get(&(game_id, date)).cloned())
    }

    async fn query_popularity(
        &self,
        game_id: GameId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<PopularityIndexDaily>> {
        self.check_available()?;
        if start > end {
            return Ok(Vec::new());
        }
        let tables = self.tables.read();
        Ok(tables
            .popularity
            .range((game_id, start)..=(game_id, end))
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn latest_popularity_as_of(
        &self,
        as_of: NaiveDate,
        earliest: NaiveDate,
    ) -> StorageResult<Vec<PopularityIndexDaily>> {
        self.check_available()?;
        let tables = self.tables.read();
        let mut latest: BTreeMap<GameId, PopularityIndexDaily> = BTreeMap::new();
        // Keys iterate in (game, date) order, so the last hit per game wins.
        for ((game_id, date), row) in tables.popularity.iter() {
            if *date >= earliest && *date <= as_of {
                latest.insert(*game_id, row.clone());
            }
        }
        Ok(latest.into_values().collect())
    }

    async fn insert_popularity_if_absent(&self, row: PopularityIndexDaily) -> StorageResult<bool> {
        self.check_available()?;
        let mut tables = self.tables.write();
        let key = (row.game_id, row.date);
        if tables.popularity.contains_key(&key) {
            return Ok(false);
        }
        tables.popularity.insert(key, row);
        Ok(true)
    }

    async fn get_snapshot(
        &self,
        period: &str,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<Vec<LeaderboardSnapshot>> {
        self.check_available()?;
        let tables = self.tables.read();
        let mut rows = tables
            .snapshots
            .get(&(period.to_string(), timestamp))
            .cloned()
            .unwrap_or_default();
        rows.sort_by_key(|row| row.rank);
        Ok(rows)
    }

    async fn latest_snapshot_timestamp(
        &self,
        period: &str,
    ) -> StorageResult<Option<DateTime<Utc>>> {
        self.check_available()?;
        let tables = self.tables.read();
        Ok(tables
            .snapshots
            .keys()
            .filter(|(p, _)| p == period)
            .map(|(_, ts)| *ts)
            .max())
    }

    async fn insert_snapshot_batch(
        &self,
        period: &str,
        timestamp: DateTime<Utc>,
        rows: Vec<LeaderboardSnapshot>,
    ) -> StorageResult<bool> {
        self.check_available()?;
        if let Some(row) = rows
            .iter()
            .find(|row| row.period != period || row.timestamp != timestamp)
        {
            return Err(StorageError::ConstraintViolation(format!(
                "snapshot row for game {} does not belong to ({}, {})",
                row.game_id, period, timestamp
            )));
        }

        let mut tables = self.tables.write();
        let key = (period.to_string(), timestamp);
        if tables.snapshots.contains_key(&key) {
            return Ok(false);
        }
        tables.snapshots.insert(key, rows);
        Ok(true)
    }

    async fn put_game(&self, game: Game) -> StorageResult<()> {
        self.check_available()?;
        self.tables.write().games.insert(game.id, game);
        Ok(())
    }

    async fn remove_game(&self, game_id: GameId) -> StorageResult<bool> {
        self.check_available()?;
        Ok(self.tables.write().games.remove(&game_id).is_some())
    }

    async fn put_metric_source(&self, source: MetricSource) -> StorageResult<()> {
        self.check_available()?;
        self.tables.write().sources.insert(source.id, source);
        Ok(())
    }

    async fn put_metric(&self, metric: Metric) -> StorageResult<()> {
        self.check_available()?;
        self.tables.write().metrics.insert(metric.id, metric);
        Ok(())
    }

    async fn put_game_metric(&self, fact: GameMetricDaily) -> StorageResult<()> {
        self.check_available()?;
        self.tables
            .write()
            .facts
            .insert((fact.game_id, fact.date, fact.metric_id), fact);
        Ok(())
    }
}
