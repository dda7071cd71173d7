// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache configuration and policies

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Read-through cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable/disable caching entirely
    pub enabled: bool,

    /// Maximum number of entries across all key families
    pub max_entries: usize,

    /// TTL for games, metric sources and metric definitions
    pub reference_ttl: Duration,

    /// TTL for popularity and raw metric series
    pub series_ttl: Duration,

    /// TTL for leaderboards
    pub leaderboard_ttl: Duration,

    /// Which entry to drop when the cache is full
    pub eviction_policy: EvictionPolicy,

    /// Invalidation events remembered for debugging
    pub max_history: usize,
}

/// Eviction policies for when cache is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictionPolicy {
    /// Least Recently Used
    Lru,
    /// First In First Out
    Fifo,
    /// Soonest to expire first
    Ttl,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10_000,
            reference_ttl: Duration::from_secs(900), // 15 minutes
            series_ttl: Duration::from_secs(300),    // 5 minutes
            leaderboard_ttl: Duration::from_secs(600), // 10 minutes
            eviction_policy: EvictionPolicy::Lru,
            max_history: 1000,
        }
    }
}

impl CacheConfig {
    /// Create configuration optimized for read-heavy workloads
    pub fn read_optimized() -> Self {
        Self {
            max_entries: 50_000,
            series_ttl: Duration::from_secs(600), // 10 minutes
            leaderboard_ttl: Duration::from_secs(900), // 15 minutes
            ..Self::default()
        }
    }

    /// Create configuration for memory-constrained environments
    pub fn memory_constrained() -> Self {
        let mut config = Self::default();
        config.max_entries = 500;
        config.max_history = 100;
        config.eviction_policy = EvictionPolicy::Ttl;
        config
    }

    /// Configuration with caching switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }

        if self.max_entries == 0 {
            return Err("Cache must have max_entries > 0".to_string());
        }

        for (name, ttl) in [
            ("reference_ttl", self.reference_ttl),
            ("series_ttl", self.series_ttl),
            ("leaderboard_ttl", self.leaderboard_ttl),
        ] {
            if ttl.is_zero() {
                return Err(format!("{} must be greater than zero", name));
            }
        }

        Ok(())
    }
}
