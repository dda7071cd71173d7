//! Gateway wrapper that can hold a read open after it has hit storage
//!
//! Lets a test interleave a write between a read's storage access and its
//! cache fill, so the fill races the write's invalidation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use popindex::storage::StorageResult;
use popindex::{
    Game, GameId, GameMetricDaily, LeaderboardSnapshot, MemoryGateway, Metric, MetricId,
    MetricSource, PopularityIndexDaily, SourceId, StorageGateway,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Reads that can be held open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedRead {
    QueryPopularity,
    LatestSnapshotTimestamp,
}

pub struct GatedGateway {
    inner: MemoryGateway,
    hold_popularity: AtomicBool,
    hold_latest_snapshot: AtomicBool,
    parked: Notify,
    release: Notify,
}

impl GatedGateway {
    pub fn new(inner: MemoryGateway) -> Self {
        Self {
            inner,
            hold_popularity: AtomicBool::new(false),
            hold_latest_snapshot: AtomicBool::new(false),
            parked: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Hold the next call of `read` after it has read storage
    pub fn hold_next(&self, read: GatedRead) {
        self.flag(read).store(true, Ordering::SeqCst);
    }

    /// Wait until a held read has its result and is waiting for release
    pub async fn wait_until_parked(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.parked.notified())
            .await
            .expect("held read never reached the gate");
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    fn flag(&self, read: GatedRead) -> &AtomicBool {
        match read {
            GatedRead::QueryPopularity => &self.hold_popularity,
            GatedRead::LatestSnapshotTimestamp => &self.hold_latest_snapshot,
        }
    }

    async fn gate(&self, read: GatedRead) {
        if self.flag(read).swap(false, Ordering::SeqCst) {
            self.parked.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl StorageGateway for GatedGateway {
    async fn list_games(&self) -> StorageResult<Vec<Game>> {
        self.inner.list_games().await
    }

    async fn get_game(&self, game_id: GameId) -> StorageResult<Option<Game>> {
        self.inner.get_game(game_id).await
    }

    async fn list_metric_sources(&self) -> StorageResult<Vec<MetricSource>> {
        self.inner.list_metric_sources().await
    }

    async fn list_metrics(&self, source_id: Option<SourceId>) -> StorageResult<Vec<Metric>> {
        self.inner.list_metrics(source_id).await
    }

    async fn query_game_metrics(
        &self,
        game_id: GameId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<GameMetricDaily>> {
        self.inner.query_game_metrics(game_id, start, end).await
    }

    async fn get_game_metric(
        &self,
        game_id: GameId,
        metric_id: MetricId,
        date: NaiveDate,
    ) -> StorageResult<Option<GameMetricDaily>> {
        self.inner.get_game_metric(game_id, metric_id, date).await
    }

    async fn get_popularity(
        &self,
        game_id: GameId,
        date: NaiveDate,
    ) -> StorageResult<Option<PopularityIndexDaily>> {
        self.inner.get_popularity(game_id, date).await
    }

    async fn query_popularity(
        &self,
        game_id: GameId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<PopularityIndexDaily>> {
        let rows = self.inner.query_popularity(game_id, start, end).await?;
        self.gate(GatedRead::QueryPopularity).await;
        Ok(rows)
    }

    async fn latest_popularity_as_of(
        &self,
        as_of: NaiveDate,
        earliest: NaiveDate,
    ) -> StorageResult<Vec<PopularityIndexDaily>> {
        self.inner.latest_popularity_as_of(as_of, earliest).await
    }

    async fn insert_popularity_if_absent(&self, row: PopularityIndexDaily) -> StorageResult<bool> {
        self.inner.insert_popularity_if_absent(row).await
    }

    async fn get_snapshot(
        &self,
        period: &str,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<Vec<LeaderboardSnapshot>> {
        self.inner.get_snapshot(period, timestamp).await
    }

    async fn latest_snapshot_timestamp(
        &self,
        period: &str,
    ) -> StorageResult<Option<DateTime<Utc>>> {
        let latest = self.inner.latest_snapshot_timestamp(period).await?;
        self.gate(GatedRead::LatestSnapshotTimestamp).await;
        Ok(latest)
    }

    async fn insert_snapshot_batch(
        &self,
        period: &str,
        timestamp: DateTime<Utc>,
        rows: Vec<LeaderboardSnapshot>,
    ) -> StorageResult<bool> {
        self.inner.insert_snapshot_batch(period, timestamp, rows).await
    }

    async fn put_game(&self, game: Game) -> StorageResult<()> {
        self.inner.put_game(game).await
    }

    async fn remove_game(&self, game_id: GameId) -> StorageResult<bool> {
        self.inner.remove_game(game_id).await
    }

    async fn put_metric_source(&self, source: MetricSource) -> StorageResult<()> {
        self.inner.put_metric_source(source).await
    }

    async fn put_metric(&self, metric: Metric) -> StorageResult<()> {
        self.inner.put_metric(metric).await
    }

    async fn put_game_metric(&self, fact: GameMetricDaily) -> StorageResult<()> {
        self.inner.put_game_metric(fact).await
    }
}
