//! Shared fixtures for the SQLite-backed integration tests

#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use std::path::PathBuf;
use uuid::Uuid;

use feed_maintenance::{
    config::DatabaseConfig,
    database::{Database, repositories::*},
    models::{
        Feed, FeedCreateRequest, FeedVersion, FeedVersionCreateRequest,
        ScheduleStopPairCreateRequest,
    },
    utils::tags::Tags,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// In-memory SQLite database with migrations applied
///
/// A single pooled connection keeps every query on the same in-memory database.
pub async fn setup_database() -> Result<Database> {
    let database = Database::new(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: Some(1),
    })
    .await?;
    database.migrate().await?;
    Ok(database)
}

/// SQLite database in a temporary file, removed on drop
///
/// Unlike the in-memory database this one can be shared by several pooled
/// connections, so transactions really run side by side.
pub struct FileDatabase {
    pub database: Database,
    path: PathBuf,
}

impl FileDatabase {
    pub async fn new(max_connections: u32) -> Result<Self> {
        let path = std::env::temp_dir().join(format!("feed-maintenance-{}.db", Uuid::new_v4()));
        let database = Database::new(&DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: Some(max_connections),
        })
        .await?;
        database.migrate().await?;
        Ok(Self { database, path })
    }
}

impl Drop for FileDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-journal", "-wal", "-shm"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Make every update of a schedule stop pair fail
pub async fn break_schedule_stop_pair_updates(database: &Database) -> Result<()> {
    database
        .connection()
        .execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            "CREATE TRIGGER fail_schedule_stop_pair_update \
             BEFORE UPDATE ON schedule_stop_pairs \
             BEGIN SELECT RAISE(ABORT, 'schedule stop pair update rejected'); END;",
        ))
        .await?;
    Ok(())
}

/// Repositories over one database, for seeding and inspecting state
pub struct Registry {
    pub feeds: FeedSeaOrmRepository,
    pub feed_versions: FeedVersionSeaOrmRepository,
    pub imports: FeedVersionImportSeaOrmRepository,
    pub schedule_stop_pairs: ScheduleStopPairSeaOrmRepository,
}

impl Registry {
    pub fn new(database: &Database) -> Self {
        let connection = database.connection();
        Self {
            feeds: FeedSeaOrmRepository::new(connection.clone()),
            feed_versions: FeedVersionSeaOrmRepository::new(connection.clone()),
            imports: FeedVersionImportSeaOrmRepository::new(connection.clone()),
            schedule_stop_pairs: ScheduleStopPairSeaOrmRepository::new(connection),
        }
    }

    pub async fn feed(&self, onestop_id: &str, tags: &[(&str, &str)]) -> Result<Feed> {
        Ok(self
            .feeds
            .create(FeedCreateRequest {
                onestop_id: onestop_id.to_string(),
                tags: tags
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            })
            .await?)
    }

    pub async fn version(
        &self,
        feed: &Feed,
        sha1: &str,
        import_level: i32,
        fetched_at: DateTime<Utc>,
        latest_calendar_date: NaiveDate,
    ) -> Result<FeedVersion> {
        Ok(self
            .feed_versions
            .create(FeedVersionCreateRequest {
                feed_id: feed.id,
                sha1: sha1.to_string(),
                earliest_calendar_date: date(2023, 1, 1),
                latest_calendar_date,
                import_level,
                fetched_at,
                tags: Tags::new(),
            })
            .await?)
    }

    /// One schedule stop pair per end date
    pub async fn schedule(&self, version: &FeedVersion, end_dates: &[NaiveDate]) -> Result<()> {
        let requests = end_dates
            .iter()
            .enumerate()
            .map(|(i, end)| ScheduleStopPairCreateRequest {
                feed_version_id: version.id,
                origin_onestop_id: format!("s-origin-{i}"),
                destination_onestop_id: format!("s-destination-{i}"),
                service_start_date: date(2023, 1, 1),
                service_end_date: *end,
            })
            .collect();
        self.schedule_stop_pairs.insert_many(requests).await?;
        Ok(())
    }

    /// End dates of a version's schedule stop pairs, sorted
    pub async fn end_dates(&self, version: &FeedVersion) -> Result<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = self
            .schedule_stop_pairs
            .find_by_feed_version(version.id)
            .await?
            .into_iter()
            .map(|pair| pair.service_end_date)
            .collect();
        dates.sort();
        Ok(dates)
    }
}
