// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result formatting for CLI output

use super::commands::OutputFormat;
use chrono::NaiveDate;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use popindex::{
    BatchSummary, CompositeScore, ComputeOutcome, Game, GameId, LeaderboardSnapshot,
    PopularityIndexDaily, SnapshotOutcome,
};
use std::collections::HashMap;

/// Result formatter for the supported output formats
pub struct ResultFormatter;

impl ResultFormatter {
    pub fn format_compute(outcome: &ComputeOutcome, format: OutputFormat) -> String {
        let row = outcome.row();
        match format {
            OutputFormat::Json => Self::to_json(&serde_json::json!({
                "status": if outcome.was_created() { "created" } else { "already_present" },
                "index": row,
            })),
            OutputFormat::Table => {
                let status = if outcome.was_created() {
                    "Stored".green()
                } else {
                    "Already present".yellow()
                };
                format!(
                    "{} index {:.4} for game {} on {}",
                    status, row.index_value, row.game_id, row.date
                )
            }
        }
    }

    pub fn format_score(
        game_id: GameId,
        date: NaiveDate,
        score: &CompositeScore,
        format: OutputFormat,
    ) -> String {
        match format {
            OutputFormat::Json => Self::to_json(&serde_json::json!({
                "game_id": game_id,
                "date": date,
                "index_value": score.index_value,
                "facts_used": score.facts_used,
                "contributions": score.contributions.iter().map(|c| serde_json::json!({
                    "metric_id": c.metric_id,
                    "metric": c.metric_name,
                    "category": c.category,
                    "weight": c.weight,
                    "score": c.score,
                })).collect::<Vec<_>>(),
            })),
            OutputFormat::Table => {
                let mut table = Self::table(&["Metric", "Category", "Weight", "Score"]);
                for c in &score.contributions {
                    table.add_row(vec![
                        c.metric_name.clone(),
                        format!("{:?}", c.category),
                        format!("{:.3}", c.weight),
                        format!("{:.4}", c.score),
                    ]);
                }
                format!(
                    "{}\nPreview for game {} on {}: {} ({} facts)\n",
                    table,
                    game_id,
                    date,
                    format!("{:.4}", score.index_value).bold(),
                    score.facts_used
                )
            }
        }
    }

    pub fn format_batch(summary: &BatchSummary, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => Self::to_json(&serde_json::json!({
                "date": summary.date,
                "created": summary.created,
                "already_present": summary.already_present,
            })),
            OutputFormat::Table => {
                let mut table = Self::table(&["Game", "Index", "Status"]);
                let rows = summary
                    .created
                    .iter()
                    .map(|r| (r, "created"))
                    .chain(summary.already_present.iter().map(|r| (r, "already present")));
                for (row, status) in rows {
                    table.add_row(vec![
                        row.game_id.to_string(),
                        format!("{:.4}", row.index_value),
                        status.to_string(),
                    ]);
                }
                format!(
                    "{}\n{} created, {} already present\n",
                    table,
                    summary.created.len(),
                    summary.already_present.len()
                )
            }
        }
    }

    pub fn format_snapshot(outcome: &SnapshotOutcome, format: OutputFormat) -> String {
        let status = if outcome.was_generated() {
            "generated"
        } else {
            "already_exists"
        };
        match format {
            OutputFormat::Json => Self::to_json(&serde_json::json!({
                "status": status,
                "rows": outcome.rows(),
            })),
            OutputFormat::Table => {
                let headline = if outcome.was_generated() {
                    format!("Snapshot generated with {} games", outcome.rows().len()).green()
                } else {
                    "Snapshot already exists; nothing written".yellow()
                };
                format!("{}\n{}", headline, Self::leaderboard_table(outcome.rows(), &[]))
            }
        }
    }

    pub fn format_leaderboard(
        rows: &[LeaderboardSnapshot],
        games: &[Game],
        format: OutputFormat,
    ) -> String {
        match format {
            OutputFormat::Json => Self::to_json(&rows),
            OutputFormat::Table if rows.is_empty() => {
                format!("{}", "No leaderboard found".yellow())
            }
            OutputFormat::Table => {
                let header = format!(
                    "{} {} at {}",
                    "Leaderboard".bold().green(),
                    rows[0].period,
                    rows[0].timestamp.to_rfc3339()
                );
                format!("{}\n{}", header, Self::leaderboard_table(rows, games))
            }
        }
    }

    pub fn format_popularity(rows: &[PopularityIndexDaily], format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => Self::to_json(&rows),
            OutputFormat::Table if rows.is_empty() => {
                format!("{}", "No popularity data in range".yellow())
            }
            OutputFormat::Table => {
                let mut table = Self::table(&["Date", "Index"]);
                for row in rows {
                    table.add_row(vec![row.date.to_string(), format!("{:.4}", row.index_value)]);
                }
                table.to_string()
            }
        }
    }

    pub fn format_games(games: &[Game], format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => Self::to_json(&games),
            OutputFormat::Table if games.is_empty() => format!("{}", "No games found".yellow()),
            OutputFormat::Table => {
                let mut table = Self::table(&["Id", "Name", "Genre"]);
                for game in games {
                    table.add_row(vec![
                        game.id.to_string(),
                        game.name.clone(),
                        game.genre.clone().unwrap_or_default(),
                    ]);
                }
                table.to_string()
            }
        }
    }

    fn leaderboard_table(rows: &[LeaderboardSnapshot], games: &[Game]) -> String {
        let names: HashMap<GameId, &str> =
            games.iter().map(|g| (g.id, g.name.as_str())).collect();

        let mut table = Self::table(&["Rank", "Game", "Name", "Index"]);
        for row in rows {
            table.add_row(vec![
                row.rank.to_string(),
                row.game_id.to_string(),
                names.get(&row.game_id).copied().unwrap_or("").to_string(),
                format!("{:.4}", row.index_value),
            ]);
        }
        table.to_string()
    }

    fn table(headers: &[&str]) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Green))
                .collect::<Vec<_>>(),
        );
        table
    }

    fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| {
            "{\"status\": \"error\", \"error\": \"Could not serialize results to JSON\"}"
                .to_string()
        })
    }
}
