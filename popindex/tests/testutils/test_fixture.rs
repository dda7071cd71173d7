//! Test fixture for PopIndex integration tests
//!
//! Builds an engine through the public API only. The gateway is kept next to
//! the engine so tests can seed facts and inject storage failures.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use popindex::{
    EngineConfig, FixedClock, Game, GameMetricDaily, MemoryGateway, Metric, MetricSource,
    PopularityEngine, PopularityIndexDaily, StorageGateway,
};
use std::sync::Arc;

use super::gated_gateway::GatedGateway;

/// Metric ids seeded by [`TestFixture::with_catalog`]
pub const CONCURRENT_USERS: i64 = 1;
pub const FORUM_POSTS: i64 = 2;
pub const TWITTER_MENTIONS: i64 = 3;
pub const LEGACY_RATING: i64 = 4;

/// Test fixture with an isolated in-memory store
pub struct TestFixture {
    pub engine: PopularityEngine,
    pub gateway: MemoryGateway,
    pub clock: Arc<FixedClock>,
}

impl TestFixture {
    /// The fixed "today" every fixture starts at
    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    pub fn days_ago(days: i64) -> NaiveDate {
        Self::today() - Duration::days(days)
    }

    /// Noon of `date`, UTC
    pub fn noon(date: NaiveDate) -> DateTime<Utc> {
        date.and_hms_opt(12, 0, 0).unwrap().and_utc()
    }

    /// Empty store, default configuration, clock at 18:00 today
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let gateway = MemoryGateway::new();
        Self::over(gateway.clone(), Arc::new(gateway), config)
    }

    /// Catalog-seeded fixture whose engine reads through a [`GatedGateway`].
    /// `gateway` still points at the shared in-memory store underneath.
    pub async fn gated_with_catalog() -> (Self, Arc<GatedGateway>) {
        let gateway = MemoryGateway::new();
        let gated = Arc::new(GatedGateway::new(gateway.clone()));
        let fixture = Self::over(gateway, gated.clone(), EngineConfig::default());
        fixture.seed_catalog().await;
        (fixture, gated)
    }

    fn over(
        gateway: MemoryGateway,
        engine_gateway: Arc<dyn StorageGateway>,
        config: EngineConfig,
    ) -> Self {
        let clock = Arc::new(FixedClock::new(
            Self::today().and_hms_opt(18, 0, 0).unwrap().and_utc(),
        ));
        let engine = PopularityEngine::with_clock(engine_gateway, config, clock.clone())
            .expect("Failed to create engine");

        Self {
            engine,
            gateway,
            clock,
        }
    }

    /// Three games, two sources and four metrics (one inactive)
    pub async fn with_catalog() -> Self {
        let fixture = Self::new();
        fixture.seed_catalog().await;
        fixture
    }

    pub async fn seed_catalog(&self) {
        for game in [
            Game::new(1, "Starfall").with_genre("MMO"),
            Game::new(2, "Pixel Farm").with_genre("Simulation"),
            Game::new(3, "Deep Rune").with_description("Roguelike dungeon crawler"),
        ] {
            self.gateway.put_game(game).await.unwrap();
        }

        self.gateway
            .put_metric_source(MetricSource::new(1, "steam"))
            .await
            .unwrap();
        self.gateway
            .put_metric_source(MetricSource::new(2, "community"))
            .await
            .unwrap();

        for metric in [
            Metric::new(CONCURRENT_USERS, 1, "concurrent_users", "users"),
            Metric::new(FORUM_POSTS, 2, "forum_posts", "posts"),
            Metric::new(TWITTER_MENTIONS, 2, "twitter_mentions", "mentions"),
            Metric::new(LEGACY_RATING, 1, "legacy_rating", "stars").inactive(),
        ] {
            self.gateway.put_metric(metric).await.unwrap();
        }
    }

    pub async fn add_fact(&self, game_id: i64, metric_id: i64, date: NaiveDate, value: f64) {
        self.gateway
            .put_game_metric(GameMetricDaily::real(game_id, metric_id, date, value))
            .await
            .unwrap();
    }

    /// Store an index row directly, bypassing the weighting policy
    pub async fn add_index(&self, game_id: i64, date: NaiveDate, index_value: f64) {
        self.gateway
            .insert_popularity_if_absent(PopularityIndexDaily {
                game_id,
                date,
                index_value,
                created_at: Self::noon(date),
            })
            .await
            .unwrap();
    }
}
