//! SeaORM-based FeedVersion repository implementation
//!
//! Besides plain lookups this repository owns the two queries the maintenance
//! jobs depend on (next import candidate, expiring active versions) and the
//! transactional schedule extension.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::config::defaults::{EXTEND_FROM_DATE_TAG, EXTEND_TO_DATE_TAG};
use crate::entities::{
    feed_versions, feeds,
    prelude::{FeedVersions, Feeds, ScheduleStopPairs},
    schedule_stop_pairs,
};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{ExtendOutcome, ExtensionWindow, Feed, FeedVersion, FeedVersionCreateRequest};
use crate::utils::dates::format_tag_date;
use crate::utils::tags::{parse_tags, serialize_tags};

/// SeaORM-based repository for FeedVersion operations
#[derive(Clone)]
pub struct FeedVersionSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl FeedVersionSeaOrmRepository {
    /// Create a new repository instance
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Create a new feed version
    pub async fn create(&self, request: FeedVersionCreateRequest) -> RepositoryResult<FeedVersion> {
        let now = Utc::now();
        let active_model = feed_versions::ActiveModel {
            id: Set(Uuid::new_v4()),
            feed_id: Set(request.feed_id),
            sha1: Set(request.sha1),
            earliest_calendar_date: Set(request.earliest_calendar_date),
            latest_calendar_date: Set(request.latest_calendar_date),
            import_level: Set(request.import_level),
            fetched_at: Set(request.fetched_at),
            tags: Set(serialize_tags(&request.tags)?),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&*self.connection).await?;
        self.model_to_domain(model)
    }

    pub async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<FeedVersion>> {
        FeedVersions::find_by_id(id)
            .one(&*self.connection)
            .await?
            .map(|model| self.model_to_domain(model))
            .transpose()
    }

    pub async fn find_by_sha1(&self, sha1: &str) -> RepositoryResult<Option<FeedVersion>> {
        FeedVersions::find()
            .filter(feed_versions::Column::Sha1.eq(sha1))
            .one(&*self.connection)
            .await?
            .map(|model| self.model_to_domain(model))
            .transpose()
    }

    /// The version a feed should move to next, as of `as_of`
    ///
    /// Candidates are the feed's versions whose service has started by `as_of`,
    /// excluding the active version and anything fetched before it. The most
    /// recently fetched candidate wins.
    pub async fn find_next_candidate(
        &self,
        feed: &Feed,
        as_of: NaiveDate,
    ) -> RepositoryResult<Option<FeedVersion>> {
        let mut query = FeedVersions::find()
            .filter(feed_versions::Column::FeedId.eq(feed.id))
            .filter(feed_versions::Column::EarliestCalendarDate.lte(as_of));

        if let Some(active_id) = feed.active_feed_version_id {
            query = query.filter(feed_versions::Column::Id.ne(active_id));
            if let Some(active) = FeedVersions::find_by_id(active_id)
                .one(&*self.connection)
                .await?
            {
                query = query.filter(feed_versions::Column::FetchedAt.gt(active.fetched_at));
            }
        }

        query
            .order_by_desc(feed_versions::Column::FetchedAt)
            .one(&*self.connection)
            .await?
            .map(|model| self.model_to_domain(model))
            .transpose()
    }

    /// Active versions whose coverage ends on or before `date`
    pub async fn find_active_with_coverage_before(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<FeedVersion>> {
        let active_versions = Query::select()
            .column(feeds::Column::ActiveFeedVersionId)
            .from(Feeds)
            .and_where(feeds::Column::ActiveFeedVersionId.is_not_null())
            .to_owned();

        FeedVersions::find()
            .filter(feed_versions::Column::Id.in_subquery(active_versions))
            .filter(feed_versions::Column::LatestCalendarDate.lte(date))
            .order_by_asc(feed_versions::Column::LatestCalendarDate)
            .order_by_asc(feed_versions::Column::Sha1)
            .all(&*self.connection)
            .await?
            .into_iter()
            .map(|model| self.model_to_domain(model))
            .collect()
    }

    /// Move the end date of expiring schedule records and mark the version as extended
    ///
    /// Runs in a single transaction. The marker is re-checked after the version
    /// is re-read, then written with a compare-and-swap on the tag text before
    /// any schedule record is touched. A failure at any step rolls back both.
    pub async fn extend_schedule_stop_pairs(
        &self,
        version_id: Uuid,
        window: ExtensionWindow,
    ) -> RepositoryResult<ExtendOutcome> {
        let txn = self.connection.begin().await?;

        let model = FeedVersions::find_by_id(version_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                RepositoryError::not_found("feed_versions", "id", version_id.to_string())
            })?;

        let mut tags = parse_tags(&model.tags)?;
        if let Some(extend_from_date) = tags.get(EXTEND_FROM_DATE_TAG).cloned() {
            let extend_to_date = tags.get(EXTEND_TO_DATE_TAG).cloned();
            txn.rollback().await?;
            return Ok(ExtendOutcome::AlreadyExtended {
                extend_from_date,
                extend_to_date,
            });
        }

        tags.insert(EXTEND_FROM_DATE_TAG.to_string(), format_tag_date(window.from));
        tags.insert(EXTEND_TO_DATE_TAG.to_string(), format_tag_date(window.to));

        let marked = FeedVersions::update_many()
            .col_expr(
                feed_versions::Column::Tags,
                Expr::value(serialize_tags(&tags)?),
            )
            .col_expr(feed_versions::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(feed_versions::Column::Id.eq(version_id))
            .filter(feed_versions::Column::Tags.eq(model.tags.as_str()))
            .exec(&txn)
            .await?;

        if marked.rows_affected == 0 {
            txn.rollback().await?;
            return Err(RepositoryError::conflict("feed_versions", version_id));
        }

        let updated = match ScheduleStopPairs::update_many()
            .col_expr(
                schedule_stop_pairs::Column::ServiceEndDate,
                Expr::value(window.to),
            )
            .filter(schedule_stop_pairs::Column::FeedVersionId.eq(version_id))
            .filter(schedule_stop_pairs::Column::ServiceEndDate.gte(window.from))
            .filter(schedule_stop_pairs::Column::ServiceEndDate.lt(window.to))
            .exec(&txn)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                txn.rollback().await?;
                return Err(e.into());
            }
        };

        txn.commit().await?;

        debug!(
            "Extended {} schedule stop pairs of feed version {} to {}",
            updated.rows_affected, model.sha1, window.to
        );

        Ok(ExtendOutcome::Extended {
            records_updated: updated.rows_affected,
        })
    }

    /// Convert SeaORM model to domain model
    fn model_to_domain(&self, model: feed_versions::Model) -> RepositoryResult<FeedVersion> {
        Ok(FeedVersion {
            id: model.id,
            feed_id: model.feed_id,
            sha1: model.sha1,
            earliest_calendar_date: model.earliest_calendar_date,
            latest_calendar_date: model.latest_calendar_date,
            import_level: model.import_level,
            fetched_at: model.fetched_at,
            tags: parse_tags(&model.tags)?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
