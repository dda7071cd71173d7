// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Central cache management and coordination

use log::{debug, trace};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::{
    CacheConfig, CacheEntryMetadata, CachedValue, EvictionPolicy, InvalidationEvent,
    InvalidationManager, InvalidationResult,
};

struct CacheEntry {
    value: CachedValue,
    metadata: CacheEntryMetadata,
    /// Insertion order, for FIFO eviction
    sequence: u64,
}

/// Cache statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub invalidated_entries: u64,
    pub entries: usize,
    pub last_reset: Option<Instant>,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Process-local key/value cache with per-entry TTL
///
/// One instance is created per engine and shared by handle. Each call takes
/// the entry lock once, so get, set and invalidate are individually atomic.
///
/// Every invalidation advances a generation counter. A read-through fill
/// snapshots [`CacheManager::generation`] before going to storage and stores
/// its result with [`CacheManager::set_if_generation`], which refuses the
/// write when an invalidation ran in between.
pub struct CacheManager {
    config: CacheConfig,
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Only advanced while the entry write lock is held
    generation: AtomicU64,
    next_sequence: RwLock<u64>,
    stats: RwLock<CacheStats>,
    invalidation_manager: InvalidationManager,
}

impl CacheManager {
    /// Create new cache manager with configuration
    pub fn new(config: CacheConfig) -> Result<Self, String> {
        config.validate()?;

        let invalidation_manager = InvalidationManager::new(config.max_history);
        Ok(Self {
            config,
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            next_sequence: RwLock::new(0),
            stats: RwLock::new(CacheStats::default()),
            invalidation_manager,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Look up a live entry. Expired entries are dropped on access.
    pub fn get(&self, key: &str) -> Option<CachedValue> {
        if !self.config.enabled {
            return None;
        }

        let mut entries = self.entries.write();
        let (value, expired) = match entries.get_mut(key) {
            Some(entry) if entry.metadata.is_expired() => (None, true),
            Some(entry) => {
                entry.metadata.update_access();
                (Some(entry.value.clone()), false)
            }
            None => (None, false),
        };
        if expired {
            entries.remove(key);
        }
        drop(entries);

        let mut stats = self.stats.write();
        if value.is_some() {
            stats.hits += 1;
            trace!("Cache hit for '{}'", key);
        } else {
            stats.misses += 1;
            if expired {
                stats.expirations += 1;
                debug!("Cache entry '{}' expired", key);
            }
        }
        value
    }

    /// Current invalidation generation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Store `value` under `key` for `ttl`, replacing any previous entry
    pub fn set(&self, key: impl Into<String>, value: CachedValue, ttl: Duration) {
        self.store(key.into(), value, ttl, None);
    }

    /// Store `value` only if no invalidation happened since `generation` was
    /// read. Returns whether the value was stored.
    pub fn set_if_generation(
        &self,
        key: impl Into<String>,
        value: CachedValue,
        ttl: Duration,
        generation: u64,
    ) -> bool {
        self.store(key.into(), value, ttl, Some(generation))
    }

    fn store(
        &self,
        key: String,
        value: CachedValue,
        ttl: Duration,
        expected_generation: Option<u64>,
    ) -> bool {
        if !self.config.enabled {
            return false;
        }

        let sequence = {
            let mut next = self.next_sequence.write();
            *next += 1;
            *next
        };

        let mut entries = self.entries.write();
        if let Some(expected) = expected_generation {
            let current = self.generation.load(Ordering::Acquire);
            if current != expected {
                debug!(
                    "Skipping stale fill of '{}' (generation {} -> {})",
                    key, expected, current
                );
                return false;
            }
        }

        let mut evicted = 0;
        let mut expired = 0;
        if !entries.contains_key(&key) && entries.len() >= self.config.max_entries {
            expired = Self::purge_expired_locked(&mut entries);
            if entries.len() >= self.config.max_entries {
                if let Some(victim) = self.pick_victim(&entries) {
                    debug!("Evicting cache entry '{}'", victim);
                    entries.remove(&victim);
                    evicted = 1;
                }
            }
        }

        trace!("Caching {} under '{}'", value.kind(), key);
        entries.insert(
            key,
            CacheEntry {
                value,
                metadata: CacheEntryMetadata::new(ttl),
                sequence,
            },
        );
        drop(entries);

        let mut stats = self.stats.write();
        stats.inserts += 1;
        stats.evictions += evicted;
        stats.expirations += expired as u64;
        true
    }

    /// Remove the entry equal to `key_or_prefix` and every entry whose key
    /// starts with it. Returns the number of entries removed.
    ///
    /// Advances the generation even when nothing matched, since a fill for a
    /// matching key may still be in flight.
    pub fn invalidate(&self, key_or_prefix: &str) -> usize {
        let mut entries = self.entries.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(key_or_prefix));
        let removed = before - entries.len();
        drop(entries);

        if removed > 0 {
            debug!(
                "Invalidated {} cache entries under '{}'",
                removed, key_or_prefix
            );
            self.stats.write().invalidated_entries += removed as u64;
        }
        removed
    }

    /// Apply an invalidation event and record it in the history
    pub fn handle_event(&self, event: InvalidationEvent) -> InvalidationResult {
        let started = Instant::now();
        let prefixes = event.prefixes();
        let entries_invalidated = prefixes.iter().map(|p| self.invalidate(p)).sum();

        let result = InvalidationResult {
            entries_invalidated,
            prefixes,
            duration: started.elapsed(),
        };
        debug!(
            "Handled {} invalidation: {} entries",
            event.label(),
            result.entries_invalidated
        );
        self.invalidation_manager.record(event, result.clone());
        result
    }

    /// Drop every expired entry
    pub fn purge_expired(&self) -> usize {
        let removed = Self::purge_expired_locked(&mut self.entries.write());
        if removed > 0 {
            self.stats.write().expirations += removed as u64;
        }
        removed
    }

    /// Clear all entries and reset statistics
    pub fn clear_all(&self) {
        {
            let mut entries = self.entries.write();
            self.generation.fetch_add(1, Ordering::AcqRel);
            entries.clear();
        }
        self.invalidation_manager.clear_history();

        let mut stats = self.stats.write();
        *stats = CacheStats::default();
        stats.last_reset = Some(Instant::now());
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .read()
            .get(key)
            .is_some_and(|entry| !entry.metadata.is_expired())
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.read().clone();
        stats.entries = self.len();
        stats
    }

    /// Recent invalidation events, most recent first
    pub fn recent_invalidations(
        &self,
        limit: usize,
    ) -> Vec<(InvalidationEvent, InvalidationResult)> {
        self.invalidation_manager.recent(limit)
    }

    fn purge_expired_locked(entries: &mut HashMap<String, CacheEntry>) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| !entry.metadata.is_expired());
        before - entries.len()
    }

    fn pick_victim(&self, entries: &HashMap<String, CacheEntry>) -> Option<String> {
        let victim = match self.config.eviction_policy {
            EvictionPolicy::Lru => entries
                .iter()
                .min_by_key(|(_, e)| (e.metadata.last_accessed, e.sequence)),
            EvictionPolicy::Fifo => entries.iter().min_by_key(|(_, e)| e.sequence),
            EvictionPolicy::Ttl => entries
                .iter()
                .min_by_key(|(_, e)| (e.metadata.expires_at(), e.sequence)),
        };
        victim.map(|(key, _)| key.clone())
    }
}
