// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Popularity index computation

use super::weighting::{CompositeScore, WeightingPolicy};
use crate::cache::{CacheManager, InvalidationEvent};
use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};
use crate::storage::{GameId, PopularityIndexDaily, StorageGateway};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::sync::Arc;

/// What happened to a (game, date) index
#[derive(Debug, Clone, PartialEq)]
pub enum ComputeOutcome {
    /// A new row was persisted
    Created(PopularityIndexDaily),
    /// The row existed already and was left untouched
    AlreadyPresent(PopularityIndexDaily),
}

impl ComputeOutcome {
    pub fn row(&self) -> &PopularityIndexDaily {
        match self {
            ComputeOutcome::Created(row) | ComputeOutcome::AlreadyPresent(row) => row,
        }
    }

    pub fn into_row(self) -> PopularityIndexDaily {
        match self {
            ComputeOutcome::Created(row) | ComputeOutcome::AlreadyPresent(row) => row,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, ComputeOutcome::Created(_))
    }
}

/// Result of computing every game for one date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub date: Option<NaiveDate>,
    pub created: Vec<PopularityIndexDaily>,
    pub already_present: Vec<PopularityIndexDaily>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.created.len() + self.already_present.len()
    }
}

/// Computes and persists composite popularity indices
pub struct AggregationEngine {
    gateway: Arc<dyn StorageGateway>,
    cache: Arc<CacheManager>,
    policy: WeightingPolicy,
    clock: Arc<dyn Clock>,
}

impl AggregationEngine {
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        cache: Arc<CacheManager>,
        policy: WeightingPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            cache,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &WeightingPolicy {
        &self.policy
    }

    fn check_date(&self, date: NaiveDate) -> EngineResult<()> {
        let today = self.clock.today();
        if date > today {
            warn!("Rejected index computation for future date {} (today is {})", date, today);
            return Err(EngineError::InvalidArgument(format!(
                "date {} is after today ({})",
                date, today
            )));
        }
        Ok(())
    }

    async fn check_game(&self, game_id: GameId) -> EngineResult<()> {
        if self.gateway.get_game(game_id).await?.is_none() {
            warn!("Rejected index computation for unknown game {}", game_id);
            return Err(EngineError::InvalidArgument(format!(
                "game {} does not exist",
                game_id
            )));
        }
        Ok(())
    }

    async fn score(&self, game_id: GameId, date: NaiveDate) -> EngineResult<CompositeScore> {
        let metrics = self.gateway.list_metrics(None).await?;
        let facts = self.gateway.query_game_metrics(game_id, date, date).await?;
        Ok(self.policy.composite(&metrics, &facts))
    }

    /// Compute and store the index for one game on one day.
    ///
    /// Returns the existing row untouched when one is already stored.
    pub async fn compute_popularity_index(
        &self,
        game_id: GameId,
        date: NaiveDate,
    ) -> EngineResult<ComputeOutcome> {
        self.check_date(date)?;
        self.check_game(game_id).await?;
        self.compute_validated(game_id, date).await
    }

    async fn compute_validated(
        &self,
        game_id: GameId,
        date: NaiveDate,
    ) -> EngineResult<ComputeOutcome> {
        if let Some(existing) = self.gateway.get_popularity(game_id, date).await? {
            debug!("Index for game {} on {} already present", game_id, date);
            return Ok(ComputeOutcome::AlreadyPresent(existing));
        }

        let score = self.score(game_id, date).await?;
        let row = PopularityIndexDaily {
            game_id,
            date,
            index_value: score.index_value,
            created_at: self.clock.now(),
        };

        if self.gateway.insert_popularity_if_absent(row.clone()).await? {
            info!(
                "Stored popularity index {:.4} for game {} on {} from {} facts",
                row.index_value, game_id, date, score.facts_used
            );
            self.cache
                .handle_event(InvalidationEvent::PopularityChanged { game_id });
            return Ok(ComputeOutcome::Created(row));
        }

        // Lost a race against another writer for the same (game, date)
        debug!("Index for game {} on {} written concurrently", game_id, date);
        match self.gateway.get_popularity(game_id, date).await? {
            Some(existing) => Ok(ComputeOutcome::AlreadyPresent(existing)),
            None => Err(EngineError::Storage(
                crate::storage::StorageError::ConstraintViolation(format!(
                    "index for game {} on {} reported present but not found",
                    game_id, date
                )),
            )),
        }
    }

    /// Compute the index of every known game for `date`
    ///
    /// Stops at the first storage failure; rows written before it stay.
    pub async fn compute_all_for_date(&self, date: NaiveDate) -> EngineResult<BatchSummary> {
        self.check_date(date)?;

        let games = self.gateway.list_games().await?;
        let mut summary = BatchSummary {
            date: Some(date),
            ..BatchSummary::default()
        };

        for game in games {
            match self.compute_validated(game.id, date).await? {
                ComputeOutcome::Created(row) => summary.created.push(row),
                ComputeOutcome::AlreadyPresent(row) => summary.already_present.push(row),
            }
        }

        info!(
            "Computed indices for {}: {} created, {} already present",
            date,
            summary.created.len(),
            summary.already_present.len()
        );
        Ok(summary)
    }

    /// Score a (game, date) without persisting anything
    pub async fn preview_index(
        &self,
        game_id: GameId,
        date: NaiveDate,
    ) -> EngineResult<CompositeScore> {
        self.check_date(date)?;
        self.check_game(game_id).await?;
        self.score(game_id, date).await
    }
}
