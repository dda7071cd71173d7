// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache invalidation events and history

use super::keys;
use crate::storage::GameId;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Events that can trigger cache invalidation
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidationEvent {
    /// A popularity index row was written for this game
    PopularityChanged { game_id: GameId },

    /// A snapshot was written for this period
    LeaderboardChanged { period: String },

    /// Games, sources or metric definitions changed in the catalog
    ReferenceDataChanged,

    /// Manual invalidation
    Manual { prefixes: Vec<String>, reason: String },
}

impl InvalidationEvent {
    /// Key prefixes affected by this event
    pub fn prefixes(&self) -> Vec<String> {
        match self {
            InvalidationEvent::PopularityChanged { game_id } => vec![
                keys::popularity_prefix(*game_id),
                keys::GAMES_PREFIX.to_string(),
            ],
            InvalidationEvent::LeaderboardChanged { period } => {
                vec![keys::leaderboard_prefix(period)]
            }
            InvalidationEvent::ReferenceDataChanged => vec![
                keys::GAMES_PREFIX.to_string(),
                keys::SOURCES_PREFIX.to_string(),
                keys::METRICS_PREFIX.to_string(),
            ],
            InvalidationEvent::Manual { prefixes, .. } => prefixes.clone(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InvalidationEvent::PopularityChanged { .. } => "popularity_changed",
            InvalidationEvent::LeaderboardChanged { .. } => "leaderboard_changed",
            InvalidationEvent::ReferenceDataChanged => "reference_data_changed",
            InvalidationEvent::Manual { .. } => "manual",
        }
    }
}

/// Result of invalidation operation
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidationResult {
    pub entries_invalidated: usize,
    pub prefixes: Vec<String>,
    pub duration: Duration,
}

/// Invalidation statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InvalidationStats {
    pub total_events: u64,
    pub total_invalidations: u64,
}

/// Keeps a bounded history of handled invalidation events
pub struct InvalidationManager {
    history: RwLock<VecDeque<(InvalidationEvent, InvalidationResult, Instant)>>,
    max_history_size: usize,
    stats: RwLock<InvalidationStats>,
}

impl InvalidationManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            history: RwLock::new(VecDeque::new()),
            max_history_size,
            stats: RwLock::new(InvalidationStats::default()),
        }
    }

    /// Record an event once the cache has applied it
    pub fn record(&self, event: InvalidationEvent, result: InvalidationResult) {
        {
            let mut stats = self.stats.write();
            stats.total_events += 1;
            stats.total_invalidations += result.entries_invalidated as u64;
        }

        if self.max_history_size == 0 {
            return;
        }
        let mut history = self.history.write();
        if history.len() >= self.max_history_size {
            history.pop_front();
        }
        history.push_back((event, result, Instant::now()));
    }

    /// Most recent events first
    pub fn recent(&self, limit: usize) -> Vec<(InvalidationEvent, InvalidationResult)> {
        self.history
            .read()
            .iter()
            .rev()
            .take(limit)
            .map(|(event, result, _)| (event.clone(), result.clone()))
            .collect()
    }

    pub fn stats(&self) -> InvalidationStats {
        self.stats.read().clone()
    }

    pub fn clear_history(&self) {
        self.history.write().clear();
    }
}
