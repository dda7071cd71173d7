// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Leaderboard snapshot generation
//!
//! A snapshot freezes the ranking of every game's latest index as of the
//! date of its timestamp. Generation reads the indices and then writes all
//! ranks as one atomic batch. The gateway re-checks that the snapshot is
//! absent inside that batch, so racing generators write it once.
//!
//! Reads and the write are not isolated from index computation: an index
//! stored for the reference date while a generation is in flight may be
//! missing from that snapshot. Snapshots are immutable, so such an index is
//! only picked up by a later (period, timestamp).

use super::ranking::rank;
use crate::cache::{CacheManager, InvalidationEvent};
use crate::clock::Clock;
use crate::config::LeaderboardConfig;
use crate::error::{EngineError, EngineResult};
use crate::storage::{LeaderboardSnapshot, StorageGateway};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

/// What a call to [`LeaderboardGenerator::generate_snapshot`] did
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotOutcome {
    /// This call wrote the snapshot
    Generated { rows: Vec<LeaderboardSnapshot> },
    /// The snapshot existed already; rows are the stored ones
    AlreadyExists { rows: Vec<LeaderboardSnapshot> },
}

impl SnapshotOutcome {
    pub fn rows(&self) -> &[LeaderboardSnapshot] {
        match self {
            SnapshotOutcome::Generated { rows } | SnapshotOutcome::AlreadyExists { rows } => rows,
        }
    }

    pub fn into_rows(self) -> Vec<LeaderboardSnapshot> {
        match self {
            SnapshotOutcome::Generated { rows } | SnapshotOutcome::AlreadyExists { rows } => rows,
        }
    }

    pub fn was_generated(&self) -> bool {
        matches!(self, SnapshotOutcome::Generated { .. })
    }
}

pub struct LeaderboardGenerator {
    gateway: Arc<dyn StorageGateway>,
    cache: Arc<CacheManager>,
    config: LeaderboardConfig,
    clock: Arc<dyn Clock>,
}

impl LeaderboardGenerator {
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        cache: Arc<CacheManager>,
        config: LeaderboardConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            cache,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &LeaderboardConfig {
        &self.config
    }

    /// Rank every game's latest index as of `timestamp`'s date and store
    /// the result under (period, timestamp). A second call is a no-op.
    pub async fn generate_snapshot(
        &self,
        period: &str,
        timestamp: DateTime<Utc>,
    ) -> EngineResult<SnapshotOutcome> {
        let period = period.trim();
        if period.is_empty() {
            warn!("Rejected snapshot with blank period");
            return Err(EngineError::InvalidArgument(
                "period must not be blank".to_string(),
            ));
        }
        let now = self.clock.now();
        if timestamp > now {
            warn!("Rejected {} snapshot at future timestamp {}", period, timestamp);
            return Err(EngineError::InvalidArgument(format!(
                "timestamp {} is after now ({})",
                timestamp, now
            )));
        }

        let existing = self.gateway.get_snapshot(period, timestamp).await?;
        if !existing.is_empty() {
            debug!("Snapshot {} at {} already exists", period, timestamp);
            return Ok(SnapshotOutcome::AlreadyExists { rows: existing });
        }

        let reference_date = timestamp.date_naive();
        let earliest = reference_date
            .checked_sub_signed(Duration::days(i64::from(self.config.lookback_days)))
            .unwrap_or(chrono::NaiveDate::MIN);
        let indices = self
            .gateway
            .latest_popularity_as_of(reference_date, earliest)
            .await?;

        let rows: Vec<LeaderboardSnapshot> = rank(indices, self.config.max_entries)
            .into_iter()
            .map(|ranked| LeaderboardSnapshot {
                period: period.to_string(),
                timestamp,
                game_id: ranked.game_id,
                rank: ranked.rank,
                index_value: ranked.index_value,
                created_at: now,
            })
            .collect();

        if self
            .gateway
            .insert_snapshot_batch(period, timestamp, rows.clone())
            .await?
        {
            info!(
                "Generated {} snapshot at {} with {} ranked games",
                period,
                timestamp,
                rows.len()
            );
            self.cache.handle_event(InvalidationEvent::LeaderboardChanged {
                period: period.to_string(),
            });
            return Ok(SnapshotOutcome::Generated { rows });
        }

        debug!("Snapshot {} at {} written concurrently", period, timestamp);
        let stored = self.gateway.get_snapshot(period, timestamp).await?;
        Ok(SnapshotOutcome::AlreadyExists { rows: stored })
    }
}
