// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Engine configuration

use crate::aggregation::WeightingConfig;
use crate::cache::CacheConfig;
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Leaderboard generation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// Days before the reference date an index may be carried forward from.
    /// Zero means only indices dated on the reference date are ranked.
    pub lookback_days: u32,

    /// Keep only the top N games in a snapshot. When set, a snapshot holds
    /// `min(max_entries, eligible games)` rows instead of one per eligible
    /// game, and ranks still run contiguously from 1. `None` keeps every game.
    pub max_entries: Option<usize>,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            lookback_days: 0,
            max_entries: None,
        }
    }
}

impl LeaderboardConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_entries == Some(0) {
            return Err("leaderboard max_entries must be greater than zero".to_string());
        }
        if self.lookback_days > 3660 {
            return Err("leaderboard lookback_days must not exceed 3660".to_string());
        }
        Ok(())
    }
}

/// Top-level configuration for a [`crate::PopularityEngine`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cache: CacheConfig,
    pub weighting: WeightingConfig,
    pub leaderboard: LeaderboardConfig,
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidConfig(format!("malformed JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::InvalidConfig(format!("cannot serialize: {}", e)))
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.cache
            .validate()
            .and_then(|_| self.weighting.validate())
            .and_then(|_| self.leaderboard.validate())
            .map_err(EngineError::InvalidConfig)
    }
}
