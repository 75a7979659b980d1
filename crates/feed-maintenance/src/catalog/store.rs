//! Database-backed feed catalog

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::FeedCatalog;
use crate::database::Database;
use crate::database::repositories::{
    FeedSeaOrmRepository, FeedVersionImportSeaOrmRepository, FeedVersionSeaOrmRepository,
    ScheduleStopPairSeaOrmRepository,
};
use crate::errors::RepositoryResult;
use crate::models::{ExtendOutcome, ExtensionWindow, Feed, FeedVersion, FeedVersionImport};

/// [`FeedCatalog`] over the SeaORM repositories
#[derive(Clone)]
pub struct SeaOrmFeedCatalog {
    feeds: FeedSeaOrmRepository,
    feed_versions: FeedVersionSeaOrmRepository,
    imports: FeedVersionImportSeaOrmRepository,
    schedule_stop_pairs: ScheduleStopPairSeaOrmRepository,
}

impl SeaOrmFeedCatalog {
    pub fn new(database: &Database) -> Self {
        let connection = database.connection();
        Self {
            feeds: FeedSeaOrmRepository::new(connection.clone()),
            feed_versions: FeedVersionSeaOrmRepository::new(connection.clone()),
            imports: FeedVersionImportSeaOrmRepository::new(connection.clone()),
            schedule_stop_pairs: ScheduleStopPairSeaOrmRepository::new(connection),
        }
    }

    pub fn feed_versions(&self) -> &FeedVersionSeaOrmRepository {
        &self.feed_versions
    }
}

#[async_trait]
impl FeedCatalog for SeaOrmFeedCatalog {
    async fn list_feeds(&self) -> RepositoryResult<Vec<Feed>> {
        self.feeds.find_all().await
    }

    async fn find_feed(&self, feed_id: Uuid) -> RepositoryResult<Option<Feed>> {
        self.feeds.find_by_id(feed_id).await
    }

    async fn active_version(&self, feed: &Feed) -> RepositoryResult<Option<FeedVersion>> {
        match feed.active_feed_version_id {
            Some(id) => self.feed_versions.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn next_candidate_version(
        &self,
        feed: &Feed,
        as_of: NaiveDate,
    ) -> RepositoryResult<Option<FeedVersion>> {
        self.feed_versions.find_next_candidate(feed, as_of).await
    }

    async fn import_attempts(
        &self,
        version: &FeedVersion,
    ) -> RepositoryResult<Vec<FeedVersionImport>> {
        self.imports.find_by_feed_version(version.id).await
    }

    async fn has_import_attempt(&self, version: &FeedVersion) -> RepositoryResult<bool> {
        self.imports.exists_for_feed_version(version.id).await
    }

    async fn list_active_versions_with_coverage_before(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<FeedVersion>> {
        self.feed_versions.find_active_with_coverage_before(date).await
    }

    async fn count_schedule_records(&self, version_id: Uuid) -> RepositoryResult<u64> {
        self.schedule_stop_pairs.count_by_feed_version(version_id).await
    }

    async fn count_schedule_records_ending_on_or_after(
        &self,
        version_id: Uuid,
        date: NaiveDate,
    ) -> RepositoryResult<u64> {
        self.schedule_stop_pairs
            .count_ending_on_or_after(version_id, date)
            .await
    }

    async fn extend_schedule_records(
        &self,
        version_id: Uuid,
        window: ExtensionWindow,
    ) -> RepositoryResult<ExtendOutcome> {
        self.feed_versions
            .extend_schedule_stop_pairs(version_id, window)
            .await
    }
}
