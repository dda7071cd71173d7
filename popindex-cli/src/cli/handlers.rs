// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Command handlers

use super::commands::{Commands, OutputFormat};
use super::output::ResultFormatter;
use chrono::Utc;
use colored::Colorize;
use popindex::{EngineConfig, PopularityEngine};
use std::path::{Path, PathBuf};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the engine and dispatch one command
pub async fn run(
    path: PathBuf,
    config: Option<PathBuf>,
    format: OutputFormat,
    command: Commands,
) -> CliResult {
    let config = load_config(config.as_deref())?;
    let engine = PopularityEngine::from_path(&path, config)?;
    log::debug!("Opened store at {:?}", path);

    let today = Utc::now().date_naive();
    let output = match command {
        Commands::Compute {
            game_id,
            date,
            preview,
        } => {
            let date = date.unwrap_or(today);
            if preview {
                let score = engine.preview_index(game_id, date).await?;
                ResultFormatter::format_score(game_id, date, &score, format)
            } else {
                let outcome = engine.compute_popularity_index(game_id, date).await?;
                ResultFormatter::format_compute(&outcome, format)
            }
        }

        Commands::ComputeAll { date } => {
            let summary = engine.compute_all_for_date(date.unwrap_or(today)).await?;
            ResultFormatter::format_batch(&summary, format)
        }

        Commands::Snapshot { period, timestamp } => {
            let outcome = engine
                .generate_snapshot(&period, timestamp.unwrap_or_else(Utc::now))
                .await?;
            ResultFormatter::format_snapshot(&outcome, format)
        }

        Commands::Leaderboard { period, timestamp } => {
            let rows = engine.get_leaderboard(&period, timestamp).await?;
            let games = engine.list_games().await?;
            ResultFormatter::format_leaderboard(&rows, &games, format)
        }

        Commands::Popularity { game_id, from, to } => {
            let rows = engine
                .get_game_popularity(game_id, from, to.unwrap_or(today))
                .await?;
            ResultFormatter::format_popularity(&rows, format)
        }

        Commands::Games => {
            let games = engine.list_games().await?;
            ResultFormatter::format_games(&games, format)
        }

        Commands::Version => {
            format!("{} {}", "PopIndex".bold().green(), popindex::VERSION)
        }
    };

    println!("{}", output);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {:?}: {}", path, e))?;
            Ok(EngineConfig::from_json_str(&json)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_config_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_config_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "leaderboard": {{ "lookback_days": 3 }} }}"#).unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.leaderboard.lookback_days, 3);
    }

    #[test]
    fn test_unreadable_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("missing.json").as_path())).is_err());
    }

    #[tokio::test]
    async fn test_games_on_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        run(
            dir.path().join("db"),
            None,
            OutputFormat::Json,
            Commands::Games,
        )
        .await
        .unwrap();
    }
}
