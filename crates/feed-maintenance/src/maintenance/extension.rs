//! Coverage extension for expiring feed versions
//!
//! Pushes the end date of a version's schedule records out so service keeps
//! showing while a newer version is pending. A tag marker on the version
//! records the window and makes the operation run at most once per version.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::catalog::FeedCatalog;
use crate::config::MaintenanceConfig;
use crate::errors::{MaintenanceError, MaintenanceResult};
use crate::models::{ExtendOutcome, ExtensionWindow, FeedVersion};
use crate::utils::dates::{days_after, months_before, years_after};

/// Counts from one `extend_expired_feed_versions` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtensionSummary {
    pub extended: usize,
    pub already_extended: usize,
    pub failed: usize,
}

pub struct ExtensionEngine {
    catalog: Arc<dyn FeedCatalog>,
    config: MaintenanceConfig,
}

impl ExtensionEngine {
    pub fn new(catalog: Arc<dyn FeedCatalog>, config: MaintenanceConfig) -> Self {
        Self { catalog, config }
    }

    /// Extend every active version whose coverage ends on or before `expired_on`
    ///
    /// Defaults to today plus the configured look-ahead. A failure on one
    /// version is logged and counted; the remaining versions are still processed.
    pub async fn extend_expired_feed_versions(
        &self,
        expired_on: Option<NaiveDate>,
    ) -> MaintenanceResult<ExtensionSummary> {
        let expired_on = match expired_on {
            Some(date) => date,
            None => days_after(Utc::now().date_naive(), self.config.expiring_within_days)?,
        };

        let versions = self
            .catalog
            .list_active_versions_with_coverage_before(expired_on)
            .await?;
        info!(
            "Found {} active feed versions expiring on or before {}",
            versions.len(),
            expired_on
        );

        let mut summary = ExtensionSummary::default();
        for version in &versions {
            match self.extend_feed_version(version, None, None).await {
                Ok(ExtendOutcome::Extended { .. }) => summary.extended += 1,
                Ok(ExtendOutcome::AlreadyExtended { .. }) => summary.already_extended += 1,
                Err(e) => {
                    error!("Failed to extend feed version {}: {}", version.sha1, e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Extension run complete: {} extended, {} already extended, {} failed",
            summary.extended, summary.already_extended, summary.failed
        );

        Ok(summary)
    }

    /// Extend one version's schedule records, unless it was extended before
    ///
    /// `extend_from` defaults to the configured number of months before the
    /// version's `latest_calendar_date`, `extend_to` to the configured number
    /// of years after it.
    pub async fn extend_feed_version(
        &self,
        version: &FeedVersion,
        extend_from: Option<NaiveDate>,
        extend_to: Option<NaiveDate>,
    ) -> MaintenanceResult<ExtendOutcome> {
        let window = ExtensionWindow {
            from: match extend_from {
                Some(date) => date,
                None => {
                    months_before(version.latest_calendar_date, self.config.extend_from_months)?
                }
            },
            to: match extend_to {
                Some(date) => date,
                None => years_after(version.latest_calendar_date, self.config.extend_to_years)?,
            },
        };

        // Only used for logging
        let onestop_id = match self.catalog.find_feed(version.feed_id).await {
            Ok(feed) => feed.map(|feed| feed.onestop_id).unwrap_or_default(),
            Err(e) => {
                warn!("Could not look up feed of version {}: {}", version.sha1, e);
                String::new()
            }
        };
        let total = self.catalog.count_schedule_records(version.id).await?;

        info!(
            "Feed {} version {}: latest_calendar_date {}, {} schedule stop pairs",
            onestop_id, version.sha1, version.latest_calendar_date, total
        );

        if let Some((from, to)) = version.previous_extension() {
            info!(
                "Feed version {} already extended from {} to {}, skipping",
                version.sha1,
                from,
                to.unwrap_or("?")
            );
            return Ok(ExtendOutcome::AlreadyExtended {
                extend_from_date: from.to_string(),
                extend_to_date: to.map(str::to_string),
            });
        }

        let to_update = self
            .catalog
            .count_schedule_records_ending_on_or_after(version.id, window.from)
            .await?;
        info!(
            "Extending feed version {} from {} to {}; {} schedule stop pairs to update",
            version.sha1, window.from, window.to, to_update
        );

        let outcome = self
            .catalog
            .extend_schedule_records(version.id, window)
            .await
            .map_err(|source| MaintenanceError::Extension {
                sha1: version.sha1.clone(),
                source,
            })?;

        match &outcome {
            ExtendOutcome::Extended { records_updated } => info!(
                "Extended {} schedule stop pairs of feed version {}",
                records_updated, version.sha1
            ),
            ExtendOutcome::AlreadyExtended {
                extend_from_date, ..
            } => info!(
                "Feed version {} was extended from {} by a concurrent run, skipping",
                version.sha1, extend_from_date
            ),
        }

        Ok(outcome)
    }
}
