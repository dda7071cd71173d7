// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Composite index weighting policy
//!
//! Each active metric contributes a log-scaled score in `[0, 1]`:
//!
//! ```text
//! s = min(1, ln(1 + v * q) / ln(1 + ceiling))
//! ```
//!
//! where `q` is 1 for real facts and `estimated_quality_factor` otherwise.
//! The composite is the weighted mean of those scores over all active
//! metrics, scaled to `0..=100`. A metric without a fact for the day scores
//! zero but still counts in the denominator, so games with different metric
//! mixes stay on one scale. Every step is non-decreasing in `v`.

use crate::storage::{DataQuality, GameMetricDaily, Metric, MetricId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper bound of the composite scale
pub const INDEX_SCALE: f64 = 100.0;

const ROUNDING: f64 = 10_000.0;

/// Coarse grouping of metrics that share a weight and a reference ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricCategory {
    /// Players, viewers, sessions
    Engagement,
    /// Mentions, followers, likes
    Social,
    /// Forum posts, reviews, comments
    Community,
    Other,
}

const ENGAGEMENT_KEYWORDS: &[&str] = &[
    "concurrent", "player", "user", "viewer", "session", "peak", "playtime", "stream",
];
const SOCIAL_KEYWORDS: &[&str] = &[
    "mention", "follower", "like", "share", "tweet", "subscriber", "social", "hashtag",
];
const COMMUNITY_KEYWORDS: &[&str] = &[
    "forum", "post", "review", "comment", "thread", "reply", "discussion",
];

impl MetricCategory {
    /// Classify a metric by keywords in its name
    pub fn classify(metric_name: &str) -> Self {
        let name = metric_name.to_ascii_lowercase();
        let matches = |keywords: &[&str]| keywords.iter().any(|k| name.contains(k));

        if matches(ENGAGEMENT_KEYWORDS) {
            MetricCategory::Engagement
        } else if matches(SOCIAL_KEYWORDS) {
            MetricCategory::Social
        } else if matches(COMMUNITY_KEYWORDS) {
            MetricCategory::Community
        } else {
            MetricCategory::Other
        }
    }
}

/// Weight and reference ceiling for one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeight {
    pub weight: f64,
    /// Raw value that maps to a full score
    pub ceiling: f64,
}

/// Tunable weighting parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightingConfig {
    pub engagement: CategoryWeight,
    pub social: CategoryWeight,
    pub community: CategoryWeight,
    pub other: CategoryWeight,

    /// Per-metric weight overrides, keyed by metric name
    pub metric_weights: HashMap<String, f64>,

    /// Per-metric ceiling overrides, keyed by metric name
    pub metric_ceilings: HashMap<String, f64>,

    /// Multiplier applied to estimated and synthetic facts
    pub estimated_quality_factor: f64,
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self {
            engagement: CategoryWeight {
                weight: 0.5,
                ceiling: 1_000_000.0,
            },
            social: CategoryWeight {
                weight: 0.25,
                ceiling: 100_000.0,
            },
            community: CategoryWeight {
                weight: 0.2,
                ceiling: 10_000.0,
            },
            other: CategoryWeight {
                weight: 0.05,
                ceiling: 10_000.0,
            },
            metric_weights: HashMap::new(),
            metric_ceilings: HashMap::new(),
            estimated_quality_factor: 0.5,
        }
    }
}

impl WeightingConfig {
    pub fn category(&self, category: MetricCategory) -> CategoryWeight {
        match category {
            MetricCategory::Engagement => self.engagement,
            MetricCategory::Social => self.social,
            MetricCategory::Community => self.community,
            MetricCategory::Other => self.other,
        }
    }

    pub fn with_metric_weight(mut self, metric_name: impl Into<String>, weight: f64) -> Self {
        self.metric_weights.insert(metric_name.into(), weight);
        self
    }

    pub fn with_metric_ceiling(mut self, metric_name: impl Into<String>, ceiling: f64) -> Self {
        self.metric_ceilings.insert(metric_name.into(), ceiling);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, cw) in [
            ("engagement", self.engagement),
            ("social", self.social),
            ("community", self.community),
            ("other", self.other),
        ] {
            if !cw.weight.is_finite() || cw.weight < 0.0 {
                return Err(format!("{} weight must be a non-negative number", name));
            }
            if !cw.ceiling.is_finite() || cw.ceiling <= 0.0 {
                return Err(format!("{} ceiling must be positive", name));
            }
        }
        for (name, weight) in &self.metric_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(format!("weight for metric '{}' must be non-negative", name));
            }
        }
        for (name, ceiling) in &self.metric_ceilings {
            if !ceiling.is_finite() || *ceiling <= 0.0 {
                return Err(format!("ceiling for metric '{}' must be positive", name));
            }
        }
        if !(0.0..=1.0).contains(&self.estimated_quality_factor) {
            return Err("estimated_quality_factor must be within [0, 1]".to_string());
        }
        Ok(())
    }
}

/// How one metric contributed to a composite
#[derive(Debug, Clone, PartialEq)]
pub struct MetricContribution {
    pub metric_id: MetricId,
    pub metric_name: String,
    pub category: MetricCategory,
    pub weight: f64,
    /// Normalized score in `[0, 1]`, zero when the fact is missing
    pub score: f64,
}

/// Result of weighting one (game, date)
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeScore {
    pub index_value: f64,
    pub contributions: Vec<MetricContribution>,
    /// Facts that belonged to an active metric
    pub facts_used: usize,
}

/// Stateless weighting function over a [`WeightingConfig`]
#[derive(Debug, Clone, Default)]
pub struct WeightingPolicy {
    config: WeightingConfig,
}

impl WeightingPolicy {
    pub fn new(config: WeightingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WeightingConfig {
        &self.config
    }

    fn weight_for(&self, metric: &Metric, category: MetricCategory) -> f64 {
        self.config
            .metric_weights
            .get(&metric.name)
            .copied()
            .unwrap_or_else(|| self.config.category(category).weight)
    }

    fn ceiling_for(&self, metric: &Metric, category: MetricCategory) -> f64 {
        self.config
            .metric_ceilings
            .get(&metric.name)
            .copied()
            .unwrap_or_else(|| self.config.category(category).ceiling)
    }

    /// Normalized score in `[0, 1]`
    pub fn normalize(&self, value: f64, quality: DataQuality, ceiling: f64) -> f64 {
        if !value.is_finite() || value <= 0.0 {
            return 0.0;
        }
        let factor = if quality.is_real() {
            1.0
        } else {
            self.config.estimated_quality_factor
        };
        let scaled = (value * factor).ln_1p() / ceiling.ln_1p();
        scaled.clamp(0.0, 1.0)
    }

    /// Composite index for one day's facts. Inactive metrics and facts for
    /// unknown metrics are ignored.
    pub fn composite(&self, metrics: &[Metric], facts: &[GameMetricDaily]) -> CompositeScore {
        let facts_by_metric: HashMap<MetricId, &GameMetricDaily> =
            facts.iter().map(|f| (f.metric_id, f)).collect();

        let mut contributions = Vec::new();
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        let mut facts_used = 0;

        let mut active: Vec<&Metric> = metrics.iter().filter(|m| m.is_active).collect();
        active.sort_by_key(|m| m.id);

        for metric in active {
            let category = MetricCategory::classify(&metric.name);
            let weight = self.weight_for(metric, category);
            let score = match facts_by_metric.get(&metric.id) {
                Some(fact) => {
                    facts_used += 1;
                    self.normalize(fact.value, fact.quality, self.ceiling_for(metric, category))
                }
                None => 0.0,
            };

            weighted_sum += weight * score;
            total_weight += weight;
            contributions.push(MetricContribution {
                metric_id: metric.id,
                metric_name: metric.name.clone(),
                category,
                weight,
                score,
            });
        }

        let index_value = if total_weight > 0.0 {
            round_index(INDEX_SCALE * weighted_sum / total_weight)
        } else {
            0.0
        };

        CompositeScore {
            index_value: index_value.clamp(0.0, INDEX_SCALE),
            contributions,
            facts_used,
        }
    }
}

fn round_index(value: f64) -> f64 {
    (value * ROUNDING).round() / ROUNDING
}
