//! Offline tests for devpulse-db pool configuration and row conversions.
//! These tests do not require a live database connection.

use chrono::{NaiveDate, TimeZone, Utc};
use devpulse_core::{
    counters, AppConfig, Environment, EventType, IncrementalRecord, MetricSnapshot,
    MilestoneEvent,
};
use devpulse_db::{ArticleMetricRow, DailyAnalyticsRow, DbError, MilestoneRow, PoolConfig};
use uuid::Uuid;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        engine_config_path: None,
        author_username: None,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn metric_row_maps_columns_to_counter_keys() {
    let row = ArticleMetricRow {
        id: 1,
        article_id: 77,
        collected_at: Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap(),
        views: 1_500,
        reactions: 42,
        comments: 6,
    };

    let snapshot: MetricSnapshot = row.into();
    assert_eq!(snapshot.entity_id, 77);
    assert_eq!(snapshot.counter(counters::VIEWS), Some(1_500));
    assert_eq!(snapshot.counter(counters::REACTIONS), Some(42));
    assert_eq!(snapshot.counter(counters::COMMENTS), Some(6));
}

#[test]
fn daily_row_maps_every_counter() {
    let row = DailyAnalyticsRow {
        id: 1,
        article_id: 77,
        date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        page_views: 120,
        average_read_time_seconds: 95,
        total_read_time_seconds: 11_400,
        reactions_total: 9,
        reactions_like: 6,
        reactions_readinglist: 2,
        reactions_unicorn: 1,
        comments_total: 3,
        follows_total: 2,
        collected_at: Utc::now(),
    };

    let record: IncrementalRecord = row.into();
    assert_eq!(record.counter(counters::PAGE_VIEWS), 120);
    assert_eq!(record.counter(counters::REACTIONS_READINGLIST), 2);
    assert_eq!(record.counter(counters::FOLLOWS_TOTAL), 2);
    assert_eq!(record.counters.len(), 9);
}

fn milestone_row(event_type: &str) -> MilestoneRow {
    MilestoneRow {
        id: 5,
        public_id: Uuid::new_v4(),
        article_id: None,
        event_type: event_type.to_string(),
        description: "Spoke at RustConf".to_string(),
        occurred_at: Utc.with_ymd_and_hms(2025, 9, 10, 15, 0, 0).unwrap(),
        created_at: Utc::now(),
    }
}

#[test]
fn milestone_row_converts_known_event_type() {
    let event = MilestoneEvent::try_from(milestone_row("manual")).expect("valid row");
    assert_eq!(event.event_type, EventType::Manual);
    assert!(event.entity_id.is_none());
}

#[test]
fn milestone_row_with_unknown_event_type_is_invalid() {
    let result = MilestoneEvent::try_from(milestone_row("went_viral"));
    assert!(
        matches!(result, Err(DbError::InvalidRow { table: "milestone_events", .. })),
        "expected InvalidRow, got {result:?}"
    );
}
