// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Command-line argument definitions

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "popindex",
    author,
    version,
    about = "Popularity index and leaderboard engine for game metrics"
)]
pub struct Cli {
    /// Path to the store directory
    #[arg(long, short = 'p', global = true, default_value = "./popdb")]
    pub path: PathBuf,

    /// JSON engine configuration; missing fields take defaults
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<log::Level>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the popularity index of one game for one day
    Compute {
        /// Game id
        game_id: i64,

        /// Day to compute (YYYY-MM-DD), today when omitted
        #[arg(long, short = 'd')]
        date: Option<NaiveDate>,

        /// Show the per-metric breakdown without storing anything
        #[arg(long)]
        preview: bool,
    },

    /// Compute the popularity index of every game for one day
    ComputeAll {
        /// Day to compute (YYYY-MM-DD), today when omitted
        #[arg(long, short = 'd')]
        date: Option<NaiveDate>,
    },

    /// Freeze a ranked leaderboard snapshot
    Snapshot {
        /// Period label, e.g. daily or weekly
        period: String,

        /// Snapshot timestamp (RFC 3339), now when omitted
        #[arg(long, short = 't')]
        timestamp: Option<DateTime<Utc>>,
    },

    /// Show a stored leaderboard
    Leaderboard {
        period: String,

        /// Exact snapshot timestamp (RFC 3339), latest when omitted
        #[arg(long, short = 't')]
        timestamp: Option<DateTime<Utc>>,
    },

    /// Show a game's popularity series
    Popularity {
        game_id: i64,

        /// First day (inclusive)
        #[arg(long)]
        from: NaiveDate,

        /// Last day (inclusive), today when omitted
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// List games
    Games,

    /// Show version information
    Version,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
