//! Selection and dispatch of the next feed version to import
//!
//! One run walks every feed, picks at most one candidate version per feed,
//! orders the candidates so the feeds imported longest ago go first, and hands
//! a bounded batch to the job dispatcher.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::FeedCatalog;
use crate::config::MaintenanceConfig;
use crate::errors::MaintenanceResult;
use crate::job_scheduling::{ImportJob, JobDispatcher};
use crate::models::{Feed, FeedVersion};

/// A feed together with the version it should import next
#[derive(Debug, Clone)]
struct ImportCandidate {
    feed: Feed,
    version: FeedVersion,
    import_level: i32,
}

impl ImportCandidate {
    fn to_job(&self) -> ImportJob {
        ImportJob::new(
            self.feed.onestop_id.as_str(),
            self.version.sha1.as_str(),
            self.import_level,
        )
    }
}

/// Outcome of one scheduling run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Number of eligible feeds before the batch was bounded
    pub discovered: usize,
    /// Jobs the dispatcher accepted, in dispatch order
    pub dispatched: Vec<ImportJob>,
    /// Jobs the dispatcher rejected, with the reason
    pub failed: Vec<(ImportJob, String)>,
}

pub struct FeedVersionScheduler {
    catalog: Arc<dyn FeedCatalog>,
    dispatcher: Arc<dyn JobDispatcher>,
    config: MaintenanceConfig,
}

impl FeedVersionScheduler {
    pub fn new(
        catalog: Arc<dyn FeedCatalog>,
        dispatcher: Arc<dyn JobDispatcher>,
        config: MaintenanceConfig,
    ) -> Self {
        Self {
            catalog,
            dispatcher,
            config,
        }
    }

    /// Dispatch an import of the next feed version for every feed that has one
    ///
    /// `import_level` overrides the per-feed level for every dispatch.
    /// `max_imports` falls back to the configured bound, then to no bound.
    pub async fn enqueue_next_feed_versions(
        &self,
        reference_date: NaiveDate,
        import_level: Option<i32>,
        max_imports: Option<usize>,
    ) -> MaintenanceResult<DispatchReport> {
        let candidates = self.discover_candidates(reference_date, import_level).await?;
        let discovered = candidates.len();
        let max_imports = max_imports
            .or(self.config.max_imports)
            .unwrap_or(discovered);

        info!(
            "Found {} feeds to update; max_imports = {}",
            discovered, max_imports
        );

        let mut report = DispatchReport {
            discovered,
            ..Default::default()
        };

        for candidate in rank_by_last_import(candidates, max_imports) {
            let job = candidate.to_job();
            info!(
                "Adding {} {} level {}",
                job.feed_onestop_id, job.feed_version_sha1, job.import_level
            );

            match self.dispatcher.enqueue(job.clone()).await {
                Ok(()) => report.dispatched.push(job),
                Err(e) => {
                    warn!(
                        "Failed to dispatch import of {} {}: {}",
                        job.feed_onestop_id, job.feed_version_sha1, e
                    );
                    report.failed.push((job, e.to_string()));
                }
            }
        }

        info!(
            "Dispatched {} of {} feed version imports ({} failed)",
            report.dispatched.len(),
            discovered,
            report.failed.len()
        );

        Ok(report)
    }

    async fn discover_candidates(
        &self,
        reference_date: NaiveDate,
        import_level: Option<i32>,
    ) -> MaintenanceResult<Vec<ImportCandidate>> {
        let mut candidates = Vec::new();

        for feed in self.catalog.list_feeds().await? {
            if feed.is_manual_import() {
                debug!("Skipping manual import feed {}", feed.onestop_id);
                continue;
            }

            let level = match import_level {
                Some(level) => level,
                None => self
                    .catalog
                    .active_version(&feed)
                    .await?
                    .map(|active| active.import_level)
                    .unwrap_or(self.config.default_import_level),
            };

            let Some(version) = self
                .catalog
                .next_candidate_version(&feed, reference_date)
                .await?
            else {
                debug!(
                    "No next feed version for {} as of {}",
                    feed.onestop_id, reference_date
                );
                continue;
            };

            if self.catalog.has_import_attempt(&version).await? {
                debug!(
                    "Feed version {} of {} already has an import attempt, skipping",
                    version.sha1, feed.onestop_id
                );
                continue;
            }

            candidates.push(ImportCandidate {
                feed,
                version,
                import_level: level,
            });
        }

        Ok(candidates)
    }
}

/// Order candidates so never-imported feeds go first, then by oldest import,
/// and keep at most `max_imports`
///
/// The sort is stable: equal keys keep enumeration order.
fn rank_by_last_import(
    mut candidates: Vec<ImportCandidate>,
    max_imports: usize,
) -> Vec<ImportCandidate> {
    candidates.sort_by_key(|candidate| candidate.feed.last_imported_at);
    candidates.truncate(max_imports);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryFeedCatalog;
    use crate::job_scheduling::JobQueue;
    use crate::models::{
        FeedCreateRequest, FeedVersionCreateRequest, FeedVersionImportCreateRequest,
    };
    use crate::utils::tags::Tags;
    use chrono::{DateTime, TimeZone, Utc};
    use tracing_test::traced_test;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn candidate(onestop_id: &str, last_imported_at: Option<DateTime<Utc>>) -> ImportCandidate {
        let now = Utc::now();
        let feed_id = Uuid::new_v4();
        ImportCandidate {
            feed: Feed {
                id: feed_id,
                onestop_id: onestop_id.to_string(),
                tags: Tags::new(),
                active_feed_version_id: None,
                last_imported_at,
                created_at: now,
                updated_at: now,
            },
            version: FeedVersion {
                id: Uuid::new_v4(),
                feed_id,
                sha1: format!("{onestop_id}-sha"),
                earliest_calendar_date: date(2023, 1, 1),
                latest_calendar_date: date(2024, 1, 1),
                import_level: 0,
                fetched_at: now,
                tags: Tags::new(),
                created_at: now,
                updated_at: now,
            },
            import_level: 2,
        }
    }

    fn onestop_ids(candidates: &[ImportCandidate]) -> Vec<&str> {
        candidates
            .iter()
            .map(|candidate| candidate.feed.onestop_id.as_str())
            .collect()
    }

    #[test]
    fn test_rank_puts_never_imported_first_and_keeps_ties_stable() {
        let ranked = rank_by_last_import(
            vec![
                candidate("f-a", Some(at(2023, 6, 1))),
                candidate("f-b", None),
                candidate("f-c", Some(at(2023, 1, 1))),
                candidate("f-d", None),
                candidate("f-e", Some(at(2023, 1, 1))),
            ],
            10,
        );
        assert_eq!(onestop_ids(&ranked), vec!["f-b", "f-d", "f-c", "f-e", "f-a"]);
    }

    #[test]
    fn test_rank_truncates_to_max_imports() {
        let ranked = rank_by_last_import(
            vec![
                candidate("f-a", Some(at(2023, 6, 1))),
                candidate("f-b", Some(at(2023, 2, 1))),
                candidate("f-c", Some(at(2023, 4, 1))),
            ],
            2,
        );
        assert_eq!(onestop_ids(&ranked), vec!["f-b", "f-c"]);
        assert!(rank_by_last_import(vec![candidate("f-a", None)], 0).is_empty());
    }

    async fn add_feed(
        catalog: &InMemoryFeedCatalog,
        onestop_id: &str,
        tags: &[(&str, &str)],
    ) -> Feed {
        catalog
            .add_feed(FeedCreateRequest {
                onestop_id: onestop_id.to_string(),
                tags: tags
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            })
            .await
    }

    async fn add_version(
        catalog: &InMemoryFeedCatalog,
        feed: &Feed,
        sha1: &str,
        import_level: i32,
        fetched_at: DateTime<Utc>,
    ) -> FeedVersion {
        catalog
            .add_version(FeedVersionCreateRequest {
                feed_id: feed.id,
                sha1: sha1.to_string(),
                earliest_calendar_date: date(2023, 1, 1),
                latest_calendar_date: date(2024, 12, 31),
                import_level,
                fetched_at,
                tags: Tags::new(),
            })
            .await
    }

    fn scheduler(catalog: Arc<InMemoryFeedCatalog>, queue: Arc<JobQueue>) -> FeedVersionScheduler {
        FeedVersionScheduler::new(catalog, queue, MaintenanceConfig::default())
    }

    #[tokio::test]
    #[traced_test]
    async fn test_feed_without_active_version_uses_default_level() {
        let catalog = Arc::new(InMemoryFeedCatalog::new());
        let queue = Arc::new(JobQueue::new());
        let feed = add_feed(&catalog, "f-a", &[]).await;
        add_version(&catalog, &feed, "v1", 0, at(2023, 12, 1)).await;

        let report = scheduler(catalog, queue.clone())
            .enqueue_next_feed_versions(date(2024, 1, 1), None, None)
            .await
            .unwrap();

        assert_eq!(report.discovered, 1);
        assert_eq!(report.dispatched, vec![ImportJob::new("f-a", "v1", 2)]);
        assert_eq!(queue.pending().await, report.dispatched);
        assert!(logs_contain("Found 1 feeds to update; max_imports = 1"));
        assert!(logs_contain("Adding f-a v1 level 2"));
    }

    #[tokio::test]
    async fn test_only_most_recently_fetched_version_is_dispatched() {
        let catalog = Arc::new(InMemoryFeedCatalog::new());
        let queue = Arc::new(JobQueue::new());
        let feed = add_feed(&catalog, "f-a", &[]).await;
        let active = add_version(&catalog, &feed, "v-active", 1, at(2023, 9, 1)).await;
        catalog
            .set_active_version(feed.id, Some(active.id))
            .await
            .unwrap();
        add_version(&catalog, &feed, "v-oct", 0, at(2023, 10, 1)).await;
        add_version(&catalog, &feed, "v-dec", 0, at(2023, 12, 1)).await;
        add_version(&catalog, &feed, "v-nov", 0, at(2023, 11, 1)).await;

        let report = scheduler(catalog, queue.clone())
            .enqueue_next_feed_versions(date(2024, 1, 1), None, None)
            .await
            .unwrap();

        assert_eq!(report.discovered, 1);
        assert_eq!(report.dispatched, vec![ImportJob::new("f-a", "v-dec", 1)]);
        assert_eq!(queue.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_active_level_does_not_leak_between_feeds() {
        let catalog = Arc::new(InMemoryFeedCatalog::new());
        let queue = Arc::new(JobQueue::new());

        let feed_a = add_feed(&catalog, "f-a", &[]).await;
        let active = add_version(&catalog, &feed_a, "a-active", 4, at(2023, 1, 1)).await;
        catalog
            .set_active_version(feed_a.id, Some(active.id))
            .await
            .unwrap();
        add_version(&catalog, &feed_a, "a-next", 0, at(2023, 6, 1)).await;

        let feed_b = add_feed(&catalog, "f-b", &[]).await;
        add_version(&catalog, &feed_b, "b-next", 0, at(2023, 6, 1)).await;

        let report = scheduler(catalog, queue)
            .enqueue_next_feed_versions(date(2024, 1, 1), None, None)
            .await
            .unwrap();

        assert_eq!(
            report.dispatched,
            vec![
                ImportJob::new("f-a", "a-next", 4),
                ImportJob::new("f-b", "b-next", 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_override_applies_to_every_dispatch() {
        let catalog = Arc::new(InMemoryFeedCatalog::new());
        let queue = Arc::new(JobQueue::new());
        let feed = add_feed(&catalog, "f-a", &[]).await;
        let active = add_version(&catalog, &feed, "active", 3, at(2023, 1, 1)).await;
        catalog
            .set_active_version(feed.id, Some(active.id))
            .await
            .unwrap();
        add_version(&catalog, &feed, "next", 0, at(2023, 6, 1)).await;

        let report = scheduler(catalog, queue)
            .enqueue_next_feed_versions(date(2024, 1, 1), Some(1), None)
            .await
            .unwrap();

        assert_eq!(report.dispatched, vec![ImportJob::new("f-a", "next", 1)]);
    }

    #[tokio::test]
    async fn test_attempted_versions_and_manual_feeds_are_skipped() {
        let catalog = Arc::new(InMemoryFeedCatalog::new());
        let queue = Arc::new(JobQueue::new());

        let feed_a = add_feed(&catalog, "f-a", &[]).await;
        let attempted = add_version(&catalog, &feed_a, "attempted", 0, at(2023, 6, 1)).await;
        catalog
            .record_import(FeedVersionImportCreateRequest {
                feed_version_id: attempted.id,
                import_level: 2,
                success: Some(false),
                exception_log: Some("boom".to_string()),
            })
            .await;

        let feed_b = add_feed(&catalog, "f-b", &[("manual_import", "true")]).await;
        add_version(&catalog, &feed_b, "manual", 0, at(2023, 6, 1)).await;

        let report = scheduler(catalog, queue.clone())
            .enqueue_next_feed_versions(date(2024, 1, 1), None, None)
            .await
            .unwrap();

        assert_eq!(report.discovered, 0);
        assert!(report.dispatched.is_empty());
        assert_eq!(queue.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_max_imports_picks_least_recently_imported_feeds() {
        let catalog = Arc::new(InMemoryFeedCatalog::new());
        let queue = Arc::new(JobQueue::new());

        for (onestop_id, imported) in [
            ("f-a", Some(at(2023, 9, 1))),
            ("f-b", Some(at(2023, 3, 1))),
            ("f-c", None),
            ("f-d", Some(at(2023, 6, 1))),
        ] {
            let feed = add_feed(&catalog, onestop_id, &[]).await;
            if let Some(imported) = imported {
                catalog.mark_imported(feed.id, imported).await.unwrap();
            }
            let sha1 = format!("{onestop_id}-v");
            add_version(&catalog, &feed, &sha1, 0, at(2023, 10, 1)).await;
        }

        let report = scheduler(catalog, queue)
            .enqueue_next_feed_versions(date(2024, 1, 1), None, Some(2))
            .await
            .unwrap();

        assert_eq!(report.discovered, 4);
        let feeds: Vec<&str> = report
            .dispatched
            .iter()
            .map(|job| job.feed_onestop_id.as_str())
            .collect();
        assert_eq!(feeds, vec!["f-c", "f-b"]);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_dispatch_failure_does_not_stop_the_run() {
        let catalog = Arc::new(InMemoryFeedCatalog::new());
        let queue = Arc::new(JobQueue::new());
        for onestop_id in ["f-a", "f-b"] {
            let feed = add_feed(&catalog, onestop_id, &[]).await;
            let sha1 = format!("{onestop_id}-v");
            add_version(&catalog, &feed, &sha1, 0, at(2023, 10, 1)).await;
        }
        // Already queued, so the queue rejects it as a duplicate
        queue.push(ImportJob::new("f-a", "f-a-v", 2)).await.unwrap();

        let report = scheduler(catalog, queue)
            .enqueue_next_feed_versions(date(2024, 1, 1), None, None)
            .await
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0.feed_onestop_id, "f-a");
        assert_eq!(report.dispatched, vec![ImportJob::new("f-b", "f-b-v", 2)]);
        assert!(logs_contain("Failed to dispatch import of f-a f-a-v"));
    }

    #[tokio::test]
    async fn test_catalog_failure_aborts_the_run() {
        let catalog = Arc::new(InMemoryFeedCatalog::new());
        let queue = Arc::new(JobQueue::new());
        catalog.fail_listing(true);

        let result = scheduler(catalog, queue.clone())
            .enqueue_next_feed_versions(date(2024, 1, 1), None, None)
            .await;

        assert!(result.is_err());
        assert_eq!(queue.pending_count().await, 0);
    }
}
