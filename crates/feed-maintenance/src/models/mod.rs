use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::defaults::{EXTEND_FROM_DATE_TAG, EXTEND_TO_DATE_TAG, MANUAL_IMPORT_TAG};
use crate::utils::tags::{Tags, tag_is_true};

/// A transit agency's data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: Uuid,
    pub onestop_id: String,
    pub tags: Tags,
    pub active_feed_version_id: Option<Uuid>,
    pub last_imported_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feed {
    /// Feeds tagged `manual_import = "true"` are never scheduled automatically
    pub fn is_manual_import(&self) -> bool {
        tag_is_true(&self.tags, MANUAL_IMPORT_TAG)
    }
}

/// One immutable snapshot of a feed's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedVersion {
    pub id: Uuid,
    pub feed_id: Uuid,
    pub sha1: String,
    pub earliest_calendar_date: NaiveDate,
    pub latest_calendar_date: NaiveDate,
    pub import_level: i32,
    pub fetched_at: DateTime<Utc>,
    pub tags: Tags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedVersion {
    /// The window recorded by a previous extension, if any
    pub fn previous_extension(&self) -> Option<(&str, Option<&str>)> {
        self.tags.get(EXTEND_FROM_DATE_TAG).map(|from| {
            (
                from.as_str(),
                self.tags.get(EXTEND_TO_DATE_TAG).map(String::as_str),
            )
        })
    }
}

/// A record that an import of a feed version was attempted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedVersionImport {
    pub id: Uuid,
    pub feed_version_id: Uuid,
    pub import_level: i32,
    /// `None` while the import is still running
    pub success: Option<bool>,
    pub exception_log: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A single scheduled-service entry belonging to a feed version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStopPair {
    pub id: Uuid,
    pub feed_version_id: Uuid,
    pub origin_onestop_id: String,
    pub destination_onestop_id: String,
    pub service_start_date: NaiveDate,
    pub service_end_date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct FeedCreateRequest {
    pub onestop_id: String,
    pub tags: Tags,
}

#[derive(Debug, Clone)]
pub struct FeedVersionCreateRequest {
    pub feed_id: Uuid,
    pub sha1: String,
    pub earliest_calendar_date: NaiveDate,
    pub latest_calendar_date: NaiveDate,
    pub import_level: i32,
    pub fetched_at: DateTime<Utc>,
    pub tags: Tags,
}

#[derive(Debug, Clone)]
pub struct FeedVersionImportCreateRequest {
    pub feed_version_id: Uuid,
    pub import_level: i32,
    pub success: Option<bool>,
    pub exception_log: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScheduleStopPairCreateRequest {
    pub feed_version_id: Uuid,
    pub origin_onestop_id: String,
    pub destination_onestop_id: String,
    pub service_start_date: NaiveDate,
    pub service_end_date: NaiveDate,
}

/// Dates bounding a schedule extension
///
/// Records of the version ending on or after `from` and before `to` are moved
/// to end on `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Result of the transactional extension write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendOutcome {
    /// Records were updated and the marker tags written
    Extended { records_updated: u64 },
    /// The marker was already present when the transaction re-read the version
    AlreadyExtended {
        extend_from_date: String,
        extend_to_date: Option<String>,
    },
}
