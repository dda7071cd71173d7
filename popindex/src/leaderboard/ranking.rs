// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Deterministic ranking of index rows

use crate::storage::{GameId, PopularityIndexDaily};
use std::cmp::Ordering;

/// A game with its 1-based position
#[derive(Debug, Clone, PartialEq)]
pub struct RankedGame {
    pub game_id: GameId,
    pub rank: u32,
    pub index_value: f64,
}

/// Higher index first; equal indices by ascending game id
fn compare(a: &PopularityIndexDaily, b: &PopularityIndexDaily) -> Ordering {
    b.index_value
        .total_cmp(&a.index_value)
        .then_with(|| a.game_id.cmp(&b.game_id))
}

/// Rank rows densely from 1, optionally keeping only the top `limit`
pub fn rank(mut rows: Vec<PopularityIndexDaily>, limit: Option<usize>) -> Vec<RankedGame> {
    rows.sort_by(compare);
    if let Some(limit) = limit {
        rows.truncate(limit);
    }

    rows.into_iter()
        .zip(1u32..)
        .map(|(row, rank)| RankedGame {
            game_id: row.game_id,
            rank,
            index_value: row.index_value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn row(game_id: GameId, index_value: f64) -> PopularityIndexDaily {
        PopularityIndexDaily {
            game_id,
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            index_value,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_descending_by_index() {
        let ranked = rank(vec![row(2, 75.0), row(1, 85.5), row(3, 10.0)], None);
        let order: Vec<_> = ranked.iter().map(|r| (r.game_id, r.rank)).collect();
        assert_eq!(order, vec![(1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_ties_break_by_game_id() {
        let ranked = rank(vec![row(9, 50.0), row(4, 50.0), row(7, 50.0)], None);
        let ids: Vec<_> = ranked.iter().map(|r| r.game_id).collect();
        assert_eq!(ids, vec![4, 7, 9]);
        let ranks: Vec<_> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_limit_keeps_ranks_dense() {
        let rows = (1..=10).map(|id| row(id, id as f64)).collect();
        let ranked = rank(rows, Some(3));
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].game_id, 10);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank(Vec::new(), None).is_empty());
    }

    #[test]
    fn test_random_permutations_rank_identically() {
        let rows: Vec<_> = (1..=50)
            .map(|id| row(id, (id % 7) as f64 * 3.5))
            .collect();
        let expected = rank(rows.clone(), None);

        for _ in 0..20 {
            let mut shuffled = rows.clone();
            fastrand::shuffle(&mut shuffled);
            assert_eq!(rank(shuffled, None), expected);
        }
    }
}
