//! Integration tests for the cache-first read path

#[path = "testutils/mod.rs"]
mod testutils;

use popindex::{EngineError, StorageGateway};
use testutils::test_fixture::*;

#[tokio::test]
async fn test_list_metrics_by_source() {
    let fixture = TestFixture::with_catalog().await;

    let steam = fixture.engine.list_metrics(Some(1)).await.unwrap();
    assert!(!steam.is_empty());
    assert!(steam.iter().all(|m| m.source_id == 1));

    let all = fixture.engine.list_metrics(None).await.unwrap();
    assert_eq!(all.len(), 4);

    let unknown = fixture.engine.list_metrics(Some(99)).await.unwrap();
    assert!(unknown.is_empty());
}

#[tokio::test]
async fn test_reference_listings_are_ordered() {
    let fixture = TestFixture::with_catalog().await;

    let games = fixture.engine.list_games().await.unwrap();
    let ids: Vec<_> = games.iter().map(|g| g.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(games[0].genre.as_deref(), Some("MMO"));

    let sources = fixture.engine.list_metric_sources().await.unwrap();
    let names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["steam", "community"]);
}

#[tokio::test]
async fn test_reversed_range_is_empty_for_any_game() {
    let fixture = TestFixture::with_catalog().await;
    let day = TestFixture::today();
    fixture.add_index(1, day, 5.0).await;

    for game_id in [-1, 0, 1, 2, 12345] {
        let rows = fixture
            .engine
            .get_game_popularity(game_id, day, TestFixture::days_ago(1))
            .await
            .unwrap();
        assert!(rows.is_empty(), "game {} returned rows", game_id);
    }
}

#[tokio::test]
async fn test_future_only_range_is_empty() {
    let fixture = TestFixture::with_catalog().await;
    let tomorrow = TestFixture::today().succ_opt().unwrap();
    let later = tomorrow.succ_opt().unwrap();

    let rows = fixture
        .engine
        .get_game_popularity(1, tomorrow, later)
        .await
        .unwrap();
    assert!(rows.is_empty());
    let facts = fixture.engine.get_game_metrics(1, tomorrow, later).await.unwrap();
    assert!(facts.is_empty());
}

#[tokio::test]
async fn test_popularity_range_is_inclusive_and_ascending() {
    let fixture = TestFixture::with_catalog().await;
    for days in [5, 3, 0, 1, 7] {
        fixture
            .add_index(1, TestFixture::days_ago(days), days as f64)
            .await;
    }
    fixture.add_index(2, TestFixture::days_ago(2), 1.0).await;

    let rows = fixture
        .engine
        .get_game_popularity(1, TestFixture::days_ago(5), TestFixture::today())
        .await
        .unwrap();
    let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
    assert_eq!(
        dates,
        vec![
            TestFixture::days_ago(5),
            TestFixture::days_ago(3),
            TestFixture::days_ago(1),
            TestFixture::today(),
        ]
    );
    assert!(rows.iter().all(|r| r.game_id == 1));
}

#[tokio::test]
async fn test_range_straddling_today_is_served() {
    let fixture = TestFixture::with_catalog().await;
    fixture.add_index(1, TestFixture::today(), 3.0).await;

    let rows = fixture
        .engine
        .get_game_popularity(
            1,
            TestFixture::today(),
            TestFixture::today().succ_opt().unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_game_metrics_ordered_by_date_then_metric() {
    let fixture = TestFixture::with_catalog().await;
    let d0 = TestFixture::days_ago(1);
    let d1 = TestFixture::today();
    fixture.add_fact(1, TWITTER_MENTIONS, d1, 3.0).await;
    fixture.add_fact(1, CONCURRENT_USERS, d1, 1.0).await;
    fixture.add_fact(1, FORUM_POSTS, d0, 2.0).await;
    fixture.add_fact(2, FORUM_POSTS, d0, 9.0).await;

    let facts = fixture.engine.get_game_metrics(1, d0, d1).await.unwrap();
    let keys: Vec<_> = facts.iter().map(|f| (f.date, f.metric_id)).collect();
    assert_eq!(
        keys,
        vec![(d0, FORUM_POSTS), (d1, CONCURRENT_USERS), (d1, TWITTER_MENTIONS)]
    );
}

#[tokio::test]
async fn test_computed_index_visible_after_cached_empty_read() {
    let fixture = TestFixture::with_catalog().await;
    let day = TestFixture::today();
    fixture.add_fact(2, CONCURRENT_USERS, day, 400.0).await;

    let before = fixture.engine.get_game_popularity(2, day, day).await.unwrap();
    assert!(before.is_empty());

    fixture.engine.compute_popularity_index(2, day).await.unwrap();

    let after = fixture.engine.get_game_popularity(2, day, day).await.unwrap();
    assert_eq!(after.len(), 1);
}

#[tokio::test]
async fn test_read_failures_propagate() {
    let fixture = TestFixture::with_catalog().await;
    fixture.gateway.set_unavailable(true);

    let day = TestFixture::today();
    let err = fixture
        .engine
        .get_game_popularity(1, day, day)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Storage(_)));
    assert!(fixture.engine.list_metrics(None).await.is_err());
    assert!(fixture.engine.get_leaderboard("daily", None).await.is_err());
}

#[tokio::test]
async fn test_cached_read_survives_outage() {
    let fixture = TestFixture::with_catalog().await;
    let games = fixture.engine.list_games().await.unwrap();

    fixture.gateway.set_unavailable(true);
    assert_eq!(fixture.engine.list_games().await.unwrap(), games);

    fixture.engine.clear_reference_cache();
    assert!(fixture.engine.list_games().await.is_err());

    fixture.gateway.set_unavailable(false);
    assert_eq!(fixture.gateway.list_games().await.unwrap().len(), 3);
}
