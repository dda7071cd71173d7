// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache key layout
//!
//! Every family prefix ends with ':' so that invalidating `popularity:1:`
//! never touches `popularity:12:...`.

use crate::storage::{GameId, SourceId};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

pub const GAMES_PREFIX: &str = "games:";
pub const SOURCES_PREFIX: &str = "sources:";
pub const METRICS_PREFIX: &str = "metrics:";

pub fn games_all() -> String {
    format!("{}all", GAMES_PREFIX)
}

pub fn sources_all() -> String {
    format!("{}all", SOURCES_PREFIX)
}

pub fn metrics(source_id: Option<SourceId>) -> String {
    match source_id {
        Some(id) => format!("{}source:{}", METRICS_PREFIX, id),
        None => format!("{}all", METRICS_PREFIX),
    }
}

pub fn popularity_prefix(game_id: GameId) -> String {
    format!("popularity:{}:", game_id)
}

pub fn popularity(game_id: GameId, start: NaiveDate, end: NaiveDate) -> String {
    format!("{}{}:{}", popularity_prefix(game_id), start, end)
}

pub fn game_metrics_prefix(game_id: GameId) -> String {
    format!("game_metrics:{}:", game_id)
}

pub fn game_metrics(game_id: GameId, start: NaiveDate, end: NaiveDate) -> String {
    format!("{}{}:{}", game_metrics_prefix(game_id), start, end)
}

pub fn leaderboard_prefix(period: &str) -> String {
    format!("leaderboard:{}:", period)
}

pub fn leaderboard(period: &str, timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(ts) => format!(
            "{}{}",
            leaderboard_prefix(period),
            ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
        ),
        None => format!("{}latest", leaderboard_prefix(period)),
    }
}
