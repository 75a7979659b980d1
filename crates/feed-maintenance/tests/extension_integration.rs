//! Schedule extension against a migrated SQLite registry

mod common;

use anyhow::Result;
use std::sync::Arc;

use common::{
    FileDatabase, Registry, at, break_schedule_stop_pair_updates, date, setup_database,
};
use feed_maintenance::{
    catalog::SeaOrmFeedCatalog,
    config::MaintenanceConfig,
    errors::MaintenanceError,
    maintenance::{ExtensionEngine, ExtensionSummary},
    models::ExtendOutcome,
};

fn engine(database: &feed_maintenance::database::Database) -> ExtensionEngine {
    ExtensionEngine::new(
        Arc::new(SeaOrmFeedCatalog::new(database)),
        MaintenanceConfig::default(),
    )
}

#[tokio::test]
async fn test_default_window_extends_records_and_writes_marker() -> Result<()> {
    let database = setup_database().await?;
    let registry = Registry::new(&database);
    let feed = registry.feed("f-a", &[]).await?;
    let version = registry
        .version(&feed, "v1", 2, at(2022, 12, 1), date(2024, 1, 1))
        .await?;
    registry
        .schedule(
            &version,
            &[date(2023, 11, 30), date(2023, 12, 1), date(2024, 1, 1)],
        )
        .await?;

    let outcome = engine(&database)
        .extend_feed_version(&version, None, None)
        .await?;

    assert_eq!(outcome, ExtendOutcome::Extended { records_updated: 2 });
    assert_eq!(
        registry.end_dates(&version).await?,
        vec![date(2023, 11, 30), date(2025, 1, 1), date(2025, 1, 1)]
    );
    let stored = registry.feed_versions.find_by_id(version.id).await?.unwrap();
    assert_eq!(stored.tags["extend_from_date"], "2023-12-01");
    assert_eq!(stored.tags["extend_to_date"], "2025-01-01");
    assert_eq!(stored.latest_calendar_date, date(2024, 1, 1));
    Ok(())
}

#[tokio::test]
async fn test_repeated_extension_changes_nothing() -> Result<()> {
    let database = setup_database().await?;
    let registry = Registry::new(&database);
    let feed = registry.feed("f-a", &[]).await?;
    let version = registry
        .version(&feed, "v1", 2, at(2022, 12, 1), date(2024, 1, 1))
        .await?;
    registry.schedule(&version, &[date(2024, 1, 1)]).await?;
    let engine = engine(&database);

    engine.extend_feed_version(&version, None, None).await?;
    let after_first = registry.feed_versions.find_by_id(version.id).await?.unwrap();

    // Stale copy without the marker: the transaction must still see it
    let outcome = engine
        .extend_feed_version(&version, Some(date(2023, 1, 1)), Some(date(2030, 1, 1)))
        .await?;

    assert!(matches!(outcome, ExtendOutcome::AlreadyExtended { .. }));
    let after_second = registry.feed_versions.find_by_id(version.id).await?.unwrap();
    assert_eq!(after_second.tags, after_first.tags);
    assert_eq!(registry.end_dates(&version).await?, vec![date(2025, 1, 1)]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_extensions_of_one_version_extend_once() -> Result<()> {
    let file = FileDatabase::new(8).await?;
    let registry = Registry::new(&file.database);
    let feed = registry.feed("f-a", &[]).await?;
    let version = registry
        .version(&feed, "v1", 2, at(2022, 12, 1), date(2024, 1, 1))
        .await?;
    registry
        .schedule(&version, &[date(2023, 12, 1), date(2024, 1, 1)])
        .await?;

    let engine = Arc::new(engine(&file.database));
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            let version = version.clone();
            tokio::spawn(async move { engine.extend_feed_version(&version, None, None).await })
        })
        .collect();

    let mut extended = 0;
    let mut already_extended = 0;
    let mut failed = 0;
    for task in tasks {
        match task.await? {
            Ok(ExtendOutcome::Extended { records_updated }) => {
                assert_eq!(records_updated, 2);
                extended += 1;
            }
            Ok(ExtendOutcome::AlreadyExtended { .. }) => already_extended += 1,
            // Lock contention or a lost tag update
            Err(_) => failed += 1,
        }
    }

    assert_eq!(extended, 1);
    assert_eq!(extended + already_extended + failed, 8);
    assert_eq!(
        registry.end_dates(&version).await?,
        vec![date(2025, 1, 1), date(2025, 1, 1)]
    );
    let stored = registry.feed_versions.find_by_id(version.id).await?.unwrap();
    assert_eq!(stored.tags["extend_from_date"], "2023-12-01");
    assert_eq!(stored.tags["extend_to_date"], "2025-01-01");
    Ok(())
}

#[tokio::test]
async fn test_failed_bulk_update_rolls_back_marker() -> Result<()> {
    let database = setup_database().await?;
    let registry = Registry::new(&database);
    let feed = registry.feed("f-a", &[]).await?;
    let version = registry
        .version(&feed, "v1", 2, at(2022, 12, 1), date(2024, 1, 1))
        .await?;
    registry.schedule(&version, &[date(2024, 1, 1)]).await?;
    break_schedule_stop_pair_updates(&database).await?;

    let err = engine(&database)
        .extend_feed_version(&version, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, MaintenanceError::Extension { .. }));
    let stored = registry.feed_versions.find_by_id(version.id).await?.unwrap();
    assert!(!stored.tags.contains_key("extend_from_date"));
    assert!(!stored.tags.contains_key("extend_to_date"));
    assert_eq!(registry.end_dates(&version).await?, vec![date(2024, 1, 1)]);
    Ok(())
}

#[tokio::test]
async fn test_expired_run_extends_only_active_expiring_versions() -> Result<()> {
    let database = setup_database().await?;
    let registry = Registry::new(&database);

    let feed_a = registry.feed("f-a", &[]).await?;
    let expiring = registry
        .version(&feed_a, "a-active", 2, at(2022, 12, 1), date(2024, 1, 1))
        .await?;
    registry
        .feeds
        .set_active_version(feed_a.id, Some(expiring.id))
        .await?;
    registry.schedule(&expiring, &[date(2024, 1, 1)]).await?;

    // Expiring but not active
    let inactive = registry
        .version(&feed_a, "a-old", 2, at(2022, 6, 1), date(2023, 12, 31))
        .await?;
    registry.schedule(&inactive, &[date(2023, 12, 31)]).await?;

    let feed_b = registry.feed("f-b", &[]).await?;
    let healthy = registry
        .version(&feed_b, "b-active", 2, at(2022, 12, 1), date(2024, 6, 1))
        .await?;
    registry
        .feeds
        .set_active_version(feed_b.id, Some(healthy.id))
        .await?;
    registry.schedule(&healthy, &[date(2024, 6, 1)]).await?;

    let engine = engine(&database);
    let summary = engine
        .extend_expired_feed_versions(Some(date(2024, 1, 8)))
        .await?;
    assert_eq!(
        summary,
        ExtensionSummary {
            extended: 1,
            already_extended: 0,
            failed: 0,
        }
    );
    assert_eq!(registry.end_dates(&expiring).await?, vec![date(2025, 1, 1)]);
    assert_eq!(registry.end_dates(&inactive).await?, vec![date(2023, 12, 31)]);
    assert_eq!(registry.end_dates(&healthy).await?, vec![date(2024, 6, 1)]);

    let again = engine
        .extend_expired_feed_versions(Some(date(2024, 1, 8)))
        .await?;
    assert_eq!(again.already_extended, 1);
    assert_eq!(again.extended, 0);
    Ok(())
}
