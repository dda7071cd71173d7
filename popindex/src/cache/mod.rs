// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Read-through caching for the query path
//!
//! This module caches:
//! - Reference data (games, metric sources, metric definitions)
//! - Popularity series per (game, date range)
//! - Raw metric series per (game, date range)
//! - Leaderboards per (period, timestamp) and the latest one per period
//!
//! The cache is an optimization only. Every value held here can be rebuilt
//! from the storage gateway, and write paths invalidate by key prefix.

pub mod cache_config;
pub mod cache_manager;
pub mod invalidation;
pub mod keys;

pub use cache_config::{CacheConfig, EvictionPolicy};
pub use cache_manager::{CacheManager, CacheStats};
pub use invalidation::{InvalidationEvent, InvalidationManager, InvalidationResult};

use crate::storage::{
    Game, GameMetricDaily, LeaderboardSnapshot, Metric, MetricSource, PopularityIndexDaily,
};
use std::time::{Duration, Instant};

/// Cache entry metadata
#[derive(Debug, Clone)]
pub struct CacheEntryMetadata {
    pub created_at: Instant,
    pub last_accessed: Instant,
    pub access_count: u32,
    pub ttl: Duration,
}

impl CacheEntryMetadata {
    pub fn new(ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            created_at: now,
            last_accessed: now,
            access_count: 0,
            ttl,
        }
    }

    pub fn expires_at(&self) -> Instant {
        self.created_at + self.ttl
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    pub fn update_access(&mut self) {
        self.last_accessed = Instant::now();
        self.access_count = self.access_count.saturating_add(1);
    }
}

/// Values the query path caches
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Games(Vec<Game>),
    MetricSources(Vec<MetricSource>),
    Metrics(Vec<Metric>),
    Popularity(Vec<PopularityIndexDaily>),
    GameMetrics(Vec<GameMetricDaily>),
    Leaderboard(Vec<LeaderboardSnapshot>),
}

impl CachedValue {
    pub fn kind(&self) -> &'static str {
        match self {
            CachedValue::Games(_) => "games",
            CachedValue::MetricSources(_) => "metric_sources",
            CachedValue::Metrics(_) => "metrics",
            CachedValue::Popularity(_) => "popularity",
            CachedValue::GameMetrics(_) => "game_metrics",
            CachedValue::Leaderboard(_) => "leaderboard",
        }
    }

    pub fn into_games(self) -> Option<Vec<Game>> {
        match self {
            CachedValue::Games(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_metric_sources(self) -> Option<Vec<MetricSource>> {
        match self {
            CachedValue::MetricSources(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_metrics(self) -> Option<Vec<Metric>> {
        match self {
            CachedValue::Metrics(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_popularity(self) -> Option<Vec<PopularityIndexDaily>> {
        match self {
            CachedValue::Popularity(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_game_metrics(self) -> Option<Vec<GameMetricDaily>> {
        match self {
            CachedValue::GameMetrics(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_leaderboard(self) -> Option<Vec<LeaderboardSnapshot>> {
        match self {
            CachedValue::Leaderboard(v) => Some(v),
            _ => None,
        }
    }
}
