// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sled-backed storage gateway
//!
//! One sled tree per record kind, bincode-encoded values. Keys are built
//! from order-preserving big-endian encodings so that prefix and range scans
//! return rows in (game, date) order without sorting.
//!
//! ```text
//! games            id
//! metric_sources   id
//! metrics          id
//! game_metrics     game | date | metric
//! popularity       game | date
//! snapshots        'm' len period ts           -> snapshot marker
//!                  'r' len period ts rank      -> snapshot row
//! ```
//!
//! `len` is the period's byte length as a big-endian u32, so no period's
//! prefix can be a prefix of another's. `ts` is seconds since the epoch
//! followed by the sub-second nanoseconds, keeping the full precision of
//! `DateTime<Utc>`.

use super::gateway::StorageGateway;
use super::types::{
    Game, GameId, GameMetricDaily, LeaderboardSnapshot, Metric, MetricId, MetricSource,
    PopularityIndexDaily, SourceId, StorageError, StorageResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::collections::BTreeMap;
use std::path::Path;

const TREE_GAMES: &str = "games";
const TREE_SOURCES: &str = "metric_sources";
const TREE_METRICS: &str = "metrics";
const TREE_FACTS: &str = "game_metrics";
const TREE_POPULARITY: &str = "popularity";
const TREE_SNAPSHOTS: &str = "snapshots";

const SNAPSHOT_MARKER: u8 = b'm';
const SNAPSHOT_ROW: u8 = b'r';

/// Persistent storage gateway on sled
#[derive(Clone)]
pub struct SledGateway {
    db: sled::Db,
    games: sled::Tree,
    sources: sled::Tree,
    metrics: sled::Tree,
    facts: sled::Tree,
    popularity: sled::Tree,
    snapshots: sled::Tree,
}

impl SledGateway {
    /// Open or create a store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        info!("Opening sled gateway at {:?}", path.as_ref());
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Open a store that is deleted when dropped
    pub fn temporary() -> StorageResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> StorageResult<Self> {
        let gateway = Self {
            games: db.open_tree(TREE_GAMES)?,
            sources: db.open_tree(TREE_SOURCES)?,
            metrics: db.open_tree(TREE_METRICS)?,
            facts: db.open_tree(TREE_FACTS)?,
            popularity: db.open_tree(TREE_POPULARITY)?,
            snapshots: db.open_tree(TREE_SNAPSHOTS)?,
            db,
        };
        debug!("Sled gateway trees ready");
        Ok(gateway)
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

// ---- key encoding ----

fn encode_id(id: i64) -> [u8; 8] {
    ((id as u64) ^ (1 << 63)).to_be_bytes()
}

fn encode_date(date: NaiveDate) -> [u8; 4] {
    ((date.num_days_from_ce() as u32) ^ (1 << 31)).to_be_bytes()
}

fn encode_timestamp(ts: DateTime<Utc>) -> [u8; 12] {
    let mut out = [0u8; 12];
    out[..8].copy_from_slice(&encode_id(ts.timestamp()));
    out[8..].copy_from_slice(&ts.timestamp_subsec_nanos().to_be_bytes());
    out
}

fn game_date_key(game_id: GameId, date: NaiveDate) -> Vec<u8> {
    let mut key = Vec::with_capacity(12);
    key.extend_from_slice(&encode_id(game_id));
    key.extend_from_slice(&encode_date(date));
    key
}

fn fact_key(game_id: GameId, date: NaiveDate, metric_id: MetricId) -> Vec<u8> {
    let mut key = game_date_key(game_id, date);
    key.extend_from_slice(&encode_id(metric_id));
    key
}

fn snapshot_prefix(tag: u8, period: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(period.len() + 5);
    key.push(tag);
    key.extend_from_slice(&(period.len() as u32).to_be_bytes());
    key.extend_from_slice(period.as_bytes());
    key
}

fn snapshot_key(tag: u8, period: &str, timestamp: DateTime<Utc>) -> Vec<u8> {
    let mut key = snapshot_prefix(tag, period);
    key.extend_from_slice(&encode_timestamp(timestamp));
    key
}

fn snapshot_row_key(period: &str, timestamp: DateTime<Utc>, rank: u32) -> Vec<u8> {
    let mut key = snapshot_key(SNAPSHOT_ROW, period, timestamp);
    key.extend_from_slice(&rank.to_be_bytes());
    key
}

// ---- value encoding ----

fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    Ok(bincode::deserialize(bytes)?)
}

fn decode_all<T, I>(iter: I) -> StorageResult<Vec<T>>
where
    T: DeserializeOwned,
    I: Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>,
{
    let mut out = Vec::new();
    for entry in iter {
        let (_, value) = entry?;
        out.push(decode(&value)?);
    }
    Ok(out)
}

#[async_trait]
impl StorageGateway for SledGateway {
    async fn list_games(&self) -> StorageResult<Vec<Game>> {
        decode_all(self.games.iter())
    }

    async fn get_game(&self, game_id: GameId) -> StorageResult<Option<Game>> {
        match self.games.get(encode_id(game_id))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn list_metric_sources(&self) -> StorageResult<Vec<MetricSource>> {
        decode_all(self.sources.iter())
    }

    async fn list_metrics(&self, source_id: Option<SourceId>) -> StorageResult<Vec<Metric>> {
        let metrics: Vec<Metric> = decode_all(self.metrics.iter())?;
        Ok(metrics
            .into_iter()
            .filter(|m| source_id.map_or(true, |id| m.source_id == id))
            .collect())
    }

    async fn query_game_metrics(
        &self,
        game_id: GameId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<GameMetricDaily>> {
        if start > end {
            return Ok(Vec::new());
        }
        let lo = fact_key(game_id, start, MetricId::MIN);
        let hi = fact_key(game_id, end, MetricId::MAX);
        decode_all(self.facts.range(lo..=hi))
    }

    async fn get_game_metric(
        &self,
        game_id: GameId,
        metric_id: MetricId,
        date: NaiveDate,
    ) -> StorageResult<Option<GameMetricDaily>> {
        match self.facts.get(fact_key(game_id, date, metric_id))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn get_popularity(
        &self,
        game_id: GameId,
        date: NaiveDate,
    ) -> StorageResult<Option<PopularityIndexDaily>> {
        match self.popularity.get(game_date_key(game_id, date))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn query_popularity(
        &self,
        game_id: GameId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StorageResult<Vec<PopularityIndexDaily>> {
        if start > end {
            return Ok(Vec::new());
        }
        let lo = game_date_key(game_id, start);
        let hi = game_date_key(game_id, end);
        decode_all(self.popularity.range(lo..=hi))
    }

    async fn latest_popularity_as_of(
        &self,
        as_of: NaiveDate,
        earliest: NaiveDate,
    ) -> StorageResult<Vec<PopularityIndexDaily>> {
        let mut latest: BTreeMap<GameId, PopularityIndexDaily> = BTreeMap::new();
        for entry in self.popularity.iter() {
            let (_, value) = entry?;
            let row: PopularityIndexDaily = decode(&value)?;
            if row.date >= earliest && row.date <= as_of {
                latest.insert(row.game_id, row);
            }
        }
        Ok(latest.into_values().collect())
    }

    async fn insert_popularity_if_absent(&self, row: PopularityIndexDaily) -> StorageResult<bool> {
        let key = game_date_key(row.game_id, row.date);
        let value = encode(&row)?;
        let swapped = self
            .popularity
            .compare_and_swap(key, None as Option<&[u8]>, Some(value))?;
        Ok(swapped.is_ok())
    }

    async fn get_snapshot(
        &self,
        period: &str,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<Vec<LeaderboardSnapshot>> {
        let prefix = snapshot_key(SNAPSHOT_ROW, period, timestamp);
        decode_all(self.snapshots.scan_prefix(prefix))
    }

    async fn latest_snapshot_timestamp(
        &self,
        period: &str,
    ) -> StorageResult<Option<DateTime<Utc>>> {
        let prefix = snapshot_prefix(SNAPSHOT_MARKER, period);
        match self.snapshots.scan_prefix(prefix).next_back() {
            Some(entry) => {
                let (_, value) = entry?;
                Ok(Some(decode(&value)?))
            }
            None => Ok(None),
        }
    }

    async fn insert_snapshot_batch(
        &self,
        period: &str,
        timestamp: DateTime<Utc>,
        rows: Vec<LeaderboardSnapshot>,
    ) -> StorageResult<bool> {
        let mut encoded = Vec::with_capacity(rows.len());
        for row in &rows {
            if row.period != period || row.timestamp != timestamp {
                return Err(StorageError::ConstraintViolation(format!(
                    "snapshot row for game {} does not belong to ({}, {})",
                    row.game_id, period, timestamp
                )));
            }
            encoded.push((snapshot_row_key(period, timestamp, row.rank), encode(row)?));
        }
        let marker = snapshot_key(SNAPSHOT_MARKER, period, timestamp);
        let marker_value = encode(&timestamp)?;

        let outcome = self.snapshots.transaction(|tx| {
            if tx.get(marker.as_slice())?.is_some() {
                return Ok(false);
            }
            for (key, value) in &encoded {
                if tx.insert(key.as_slice(), value.as_slice())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        StorageError::ConstraintViolation(format!(
                            "orphan snapshot row for ({}, {})",
                            period, timestamp
                        )),
                    ));
                }
            }
            tx.insert(marker.as_slice(), marker_value.as_slice())?;
            Ok(true)
        });

        match outcome {
            Ok(written) => Ok(written),
            Err(TransactionError::Abort(err)) => Err(err),
            Err(TransactionError::Storage(err)) => Err(err.into()),
        }
    }

    async fn put_game(&self, game: Game) -> StorageResult<()> {
        self.games.insert(encode_id(game.id), encode(&game)?)?;
        Ok(())
    }

    async fn remove_game(&self, game_id: GameId) -> StorageResult<bool> {
        Ok(self.games.remove(encode_id(game_id))?.is_some())
    }

    async fn put_metric_source(&self, source: MetricSource) -> StorageResult<()> {
        self.sources.insert(encode_id(source.id), encode(&source)?)?;
        Ok(())
    }

    async fn put_metric(&self, metric: Metric) -> StorageResult<()> {
        self.metrics.insert(encode_id(metric.id), encode(&metric)?)?;
        Ok(())
    }

    async fn put_game_metric(&self, fact: GameMetricDaily) -> StorageResult<()> {
        let key = fact_key(fact.game_id, fact.date, fact.metric_id);
        self.facts.insert(key, encode(&fact)?)?;
        Ok(())
    }
}
