//! In-process feed catalog
//!
//! Everything lives behind one `RwLock`, so the extension write (marker plus
//! record update) happens under a single write guard and is atomic with
//! respect to other callers.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::FeedCatalog;
use crate::config::defaults::{EXTEND_FROM_DATE_TAG, EXTEND_TO_DATE_TAG};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{
    ExtendOutcome, ExtensionWindow, Feed, FeedCreateRequest, FeedVersion,
    FeedVersionCreateRequest, FeedVersionImport, FeedVersionImportCreateRequest,
    ScheduleStopPair, ScheduleStopPairCreateRequest,
};
use crate::utils::dates::format_tag_date;

#[derive(Debug, Default)]
struct CatalogState {
    feeds: Vec<Feed>,
    versions: Vec<FeedVersion>,
    imports: Vec<FeedVersionImport>,
    schedule_stop_pairs: Vec<ScheduleStopPair>,
}

#[derive(Debug, Default)]
pub struct InMemoryFeedCatalog {
    state: RwLock<CatalogState>,
    fail_schedule_updates: AtomicBool,
    fail_listing: AtomicBool,
    fail_feed_lookup: AtomicBool,
}

impl InMemoryFeedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_feed(&self, request: FeedCreateRequest) -> Feed {
        let now = Utc::now();
        let feed = Feed {
            id: Uuid::new_v4(),
            onestop_id: request.onestop_id,
            tags: request.tags,
            active_feed_version_id: None,
            last_imported_at: None,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.feeds.push(feed.clone());
        feed
    }

    pub async fn add_version(&self, request: FeedVersionCreateRequest) -> FeedVersion {
        let now = Utc::now();
        let version = FeedVersion {
            id: Uuid::new_v4(),
            feed_id: request.feed_id,
            sha1: request.sha1,
            earliest_calendar_date: request.earliest_calendar_date,
            latest_calendar_date: request.latest_calendar_date,
            import_level: request.import_level,
            fetched_at: request.fetched_at,
            tags: request.tags,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.versions.push(version.clone());
        version
    }

    pub async fn set_active_version(
        &self,
        feed_id: Uuid,
        feed_version_id: Option<Uuid>,
    ) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        let feed = state
            .feeds
            .iter_mut()
            .find(|feed| feed.id == feed_id)
            .ok_or_else(|| RepositoryError::not_found("feeds", "id", feed_id.to_string()))?;
        feed.active_feed_version_id = feed_version_id;
        feed.updated_at = Utc::now();
        Ok(())
    }

    pub async fn mark_imported(
        &self,
        feed_id: Uuid,
        imported_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        let feed = state
            .feeds
            .iter_mut()
            .find(|feed| feed.id == feed_id)
            .ok_or_else(|| RepositoryError::not_found("feeds", "id", feed_id.to_string()))?;
        feed.last_imported_at = Some(imported_at);
        Ok(())
    }

    pub async fn record_import(
        &self,
        request: FeedVersionImportCreateRequest,
    ) -> FeedVersionImport {
        let attempt = FeedVersionImport {
            id: Uuid::new_v4(),
            feed_version_id: request.feed_version_id,
            import_level: request.import_level,
            success: request.success,
            exception_log: request.exception_log,
            created_at: Utc::now(),
        };
        self.state.write().await.imports.push(attempt.clone());
        attempt
    }

    pub async fn add_schedule_stop_pairs(&self, requests: Vec<ScheduleStopPairCreateRequest>) {
        let mut state = self.state.write().await;
        state
            .schedule_stop_pairs
            .extend(requests.into_iter().map(|request| ScheduleStopPair {
                id: Uuid::new_v4(),
                feed_version_id: request.feed_version_id,
                origin_onestop_id: request.origin_onestop_id,
                destination_onestop_id: request.destination_onestop_id,
                service_start_date: request.service_start_date,
                service_end_date: request.service_end_date,
            }));
    }

    pub async fn version(&self, version_id: Uuid) -> Option<FeedVersion> {
        self.state
            .read()
            .await
            .versions
            .iter()
            .find(|version| version.id == version_id)
            .cloned()
    }

    pub async fn schedule_stop_pairs(&self, version_id: Uuid) -> Vec<ScheduleStopPair> {
        self.state
            .read()
            .await
            .schedule_stop_pairs
            .iter()
            .filter(|pair| pair.feed_version_id == version_id)
            .cloned()
            .collect()
    }

    /// Make the schedule record update of the next extensions fail
    pub fn fail_schedule_updates(&self, fail: bool) {
        self.fail_schedule_updates.store(fail, Ordering::SeqCst);
    }

    /// Make feed enumeration fail, as if the registry were unreachable
    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Make single feed lookups fail
    pub fn fail_feed_lookup(&self, fail: bool) {
        self.fail_feed_lookup.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl FeedCatalog for InMemoryFeedCatalog {
    async fn list_feeds(&self) -> RepositoryResult<Vec<Feed>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable {
                message: "feed listing disabled".to_string(),
            });
        }
        let mut feeds = self.state.read().await.feeds.clone();
        feeds.sort_by(|a, b| a.onestop_id.cmp(&b.onestop_id));
        Ok(feeds)
    }

    async fn find_feed(&self, feed_id: Uuid) -> RepositoryResult<Option<Feed>> {
        if self.fail_feed_lookup.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable {
                message: "feed lookup disabled".to_string(),
            });
        }
        Ok(self
            .state
            .read()
            .await
            .feeds
            .iter()
            .find(|feed| feed.id == feed_id)
            .cloned())
    }

    async fn active_version(&self, feed: &Feed) -> RepositoryResult<Option<FeedVersion>> {
        let Some(active_id) = feed.active_feed_version_id else {
            return Ok(None);
        };
        Ok(self.version(active_id).await)
    }

    async fn next_candidate_version(
        &self,
        feed: &Feed,
        as_of: NaiveDate,
    ) -> RepositoryResult<Option<FeedVersion>> {
        let state = self.state.read().await;
        let active_fetched_at = feed.active_feed_version_id.and_then(|active_id| {
            state
                .versions
                .iter()
                .find(|version| version.id == active_id)
                .map(|version| version.fetched_at)
        });

        Ok(state
            .versions
            .iter()
            .filter(|version| version.feed_id == feed.id)
            .filter(|version| Some(version.id) != feed.active_feed_version_id)
            .filter(|version| version.earliest_calendar_date <= as_of)
            .filter(|version| active_fetched_at.is_none_or(|active| version.fetched_at > active))
            .max_by_key(|version| version.fetched_at)
            .cloned())
    }

    async fn import_attempts(
        &self,
        version: &FeedVersion,
    ) -> RepositoryResult<Vec<FeedVersionImport>> {
        Ok(self
            .state
            .read()
            .await
            .imports
            .iter()
            .filter(|attempt| attempt.feed_version_id == version.id)
            .cloned()
            .collect())
    }

    async fn list_active_versions_with_coverage_before(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<FeedVersion>> {
        let state = self.state.read().await;
        let mut versions: Vec<FeedVersion> = state
            .versions
            .iter()
            .filter(|version| {
                state
                    .feeds
                    .iter()
                    .any(|feed| feed.active_feed_version_id == Some(version.id))
            })
            .filter(|version| version.latest_calendar_date <= date)
            .cloned()
            .collect();
        versions.sort_by(|a, b| {
            a.latest_calendar_date
                .cmp(&b.latest_calendar_date)
                .then_with(|| a.sha1.cmp(&b.sha1))
        });
        Ok(versions)
    }

    async fn count_schedule_records(&self, version_id: Uuid) -> RepositoryResult<u64> {
        Ok(self.schedule_stop_pairs(version_id).await.len() as u64)
    }

    async fn count_schedule_records_ending_on_or_after(
        &self,
        version_id: Uuid,
        date: NaiveDate,
    ) -> RepositoryResult<u64> {
        Ok(self
            .schedule_stop_pairs(version_id)
            .await
            .iter()
            .filter(|pair| pair.service_end_date >= date)
            .count() as u64)
    }

    async fn extend_schedule_records(
        &self,
        version_id: Uuid,
        window: ExtensionWindow,
    ) -> RepositoryResult<ExtendOutcome> {
        let mut state = self.state.write().await;

        let version = state
            .versions
            .iter()
            .find(|version| version.id == version_id)
            .ok_or_else(|| {
                RepositoryError::not_found("feed_versions", "id", version_id.to_string())
            })?;

        if let Some(extend_from_date) = version.tags.get(EXTEND_FROM_DATE_TAG).cloned() {
            return Ok(ExtendOutcome::AlreadyExtended {
                extend_from_date,
                extend_to_date: version.tags.get(EXTEND_TO_DATE_TAG).cloned(),
            });
        }

        // Nothing has been written yet, so failing here leaves the state untouched
        if self.fail_schedule_updates.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable {
                message: "schedule stop pair update failed".to_string(),
            });
        }

        let mut records_updated = 0;
        for pair in state.schedule_stop_pairs.iter_mut().filter(|pair| {
            pair.feed_version_id == version_id
                && pair.service_end_date >= window.from
                && pair.service_end_date < window.to
        }) {
            pair.service_end_date = window.to;
            records_updated += 1;
        }

        if let Some(version) = state
            .versions
            .iter_mut()
            .find(|version| version.id == version_id)
        {
            version
                .tags
                .insert(EXTEND_FROM_DATE_TAG.to_string(), format_tag_date(window.from));
            version
                .tags
                .insert(EXTEND_TO_DATE_TAG.to_string(), format_tag_date(window.to));
            version.updated_at = Utc::now();
        }

        Ok(ExtendOutcome::Extended { records_updated })
    }
}
