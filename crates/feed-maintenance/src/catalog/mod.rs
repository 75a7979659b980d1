//! Read and extension access to the feed registry
//!
//! The scheduler and extension engine only see the registry through
//! [`FeedCatalog`]. [`SeaOrmFeedCatalog`] serves it from the database;
//! [`InMemoryFeedCatalog`] keeps everything in process.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::RepositoryResult;
use crate::models::{ExtendOutcome, ExtensionWindow, Feed, FeedVersion, FeedVersionImport};

pub mod memory;
pub mod store;

pub use memory::InMemoryFeedCatalog;
pub use store::SeaOrmFeedCatalog;

#[async_trait]
pub trait FeedCatalog: Send + Sync {
    /// Every feed, in a stable enumeration order
    async fn list_feeds(&self) -> RepositoryResult<Vec<Feed>>;

    async fn find_feed(&self, feed_id: Uuid) -> RepositoryResult<Option<Feed>>;

    /// The version the feed currently serves, if any
    async fn active_version(&self, feed: &Feed) -> RepositoryResult<Option<FeedVersion>>;

    /// The version the feed should move to next, as of `as_of`
    async fn next_candidate_version(
        &self,
        feed: &Feed,
        as_of: NaiveDate,
    ) -> RepositoryResult<Option<FeedVersion>>;

    /// Import attempts recorded for a version, whatever their outcome
    async fn import_attempts(
        &self,
        version: &FeedVersion,
    ) -> RepositoryResult<Vec<FeedVersionImport>>;

    /// Whether any import of the version was ever attempted
    async fn has_import_attempt(&self, version: &FeedVersion) -> RepositoryResult<bool> {
        Ok(!self.import_attempts(version).await?.is_empty())
    }

    /// Active versions whose `latest_calendar_date` is on or before `date`
    async fn list_active_versions_with_coverage_before(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<FeedVersion>>;

    async fn count_schedule_records(&self, version_id: Uuid) -> RepositoryResult<u64>;

    async fn count_schedule_records_ending_on_or_after(
        &self,
        version_id: Uuid,
        date: NaiveDate,
    ) -> RepositoryResult<u64>;

    /// Atomically write the extension marker and move expiring record end dates
    ///
    /// Implementations re-check the marker inside the same atomic unit and
    /// return [`ExtendOutcome::AlreadyExtended`] without writing when present.
    async fn extend_schedule_records(
        &self,
        version_id: Uuid,
        window: ExtensionWindow,
    ) -> RepositoryResult<ExtendOutcome>;
}
