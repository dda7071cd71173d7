// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Record types and error types for the storage gateway
//!
//! Games, metric sources and metric definitions are reference data owned by
//! the catalog subsystem. Daily metric facts are written by ingestion. The
//! engine only ever writes popularity index rows and leaderboard snapshots.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type GameId = i64;
pub type SourceId = i64;
pub type MetricId = i64;

/// Error types for storage gateway operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

#[cfg(feature = "sled-backend")]
impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A game tracked by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub genre: Option<String>,
    pub description: Option<String>,
}

impl Game {
    pub fn new(id: GameId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            genre: None,
            description: None,
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// An external data provider (a platform, a social network, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSource {
    pub id: SourceId,
    pub name: String,
    pub note: Option<String>,
}

impl MetricSource {
    pub fn new(id: SourceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            note: None,
        }
    }
}

/// A named, unit-tagged measurable quantity belonging to one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: MetricId,
    pub source_id: SourceId,
    pub name: String,
    pub unit: String,
    /// Inactive metrics are skipped by aggregation
    pub is_active: bool,
}

impl Metric {
    pub fn new(
        id: MetricId,
        source_id: SourceId,
        name: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id,
            source_id,
            name: name.into(),
            unit: unit.into(),
            is_active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// How ingestion collapsed intra-day samples into the daily value.
/// Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMethod {
    Max,
    Avg,
    Sum,
    Last,
}

/// Provenance of a daily fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    /// Measured directly at the source
    Real,
    /// Interpolated or extrapolated from partial data
    Estimated,
    /// Generated, e.g. for backfills or demos
    Synthetic,
}

impl DataQuality {
    pub fn is_real(&self) -> bool {
        matches!(self, DataQuality::Real)
    }
}

/// A raw daily fact: (game, metric, date) -> value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMetricDaily {
    pub game_id: GameId,
    pub metric_id: MetricId,
    pub date: NaiveDate,
    pub value: f64,
    pub aggregation: AggregationMethod,
    pub quality: DataQuality,
}

impl GameMetricDaily {
    pub fn real(game_id: GameId, metric_id: MetricId, date: NaiveDate, value: f64) -> Self {
        Self {
            game_id,
            metric_id,
            date,
            value,
            aggregation: AggregationMethod::Max,
            quality: DataQuality::Real,
        }
    }

    pub fn with_quality(mut self, quality: DataQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationMethod) -> Self {
        self.aggregation = aggregation;
        self
    }
}

/// Computed composite index for one game on one day. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularityIndexDaily {
    pub game_id: GameId,
    pub date: NaiveDate,
    pub index_value: f64,
    pub created_at: DateTime<Utc>,
}

/// One ranked row of a frozen leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardSnapshot {
    pub period: String,
    pub timestamp: DateTime<Utc>,
    pub game_id: GameId,
    /// 1-based, dense within one (period, timestamp)
    pub rank: u32,
    pub index_value: f64,
    pub created_at: DateTime<Utc>,
}
