// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Composite popularity index computation
//!
//! [`weighting`] holds the pure scoring policy; [`engine`] validates input,
//! reads facts through the gateway and persists one row per (game, date).

pub mod engine;
pub mod weighting;

pub use engine::{AggregationEngine, BatchSummary, ComputeOutcome};
pub use weighting::{
    CategoryWeight, CompositeScore, MetricCategory, MetricContribution, WeightingConfig,
    WeightingPolicy, INDEX_SCALE,
};
