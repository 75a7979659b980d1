//! SeaORM-based repository for schedule stop pairs

use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::entities::{prelude::ScheduleStopPairs, schedule_stop_pairs};
use crate::errors::RepositoryResult;
use crate::models::{ScheduleStopPair, ScheduleStopPairCreateRequest};

#[derive(Clone)]
pub struct ScheduleStopPairSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl ScheduleStopPairSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Insert a batch of schedule stop pairs, returning how many were written
    pub async fn insert_many(
        &self,
        requests: Vec<ScheduleStopPairCreateRequest>,
    ) -> RepositoryResult<u64> {
        if requests.is_empty() {
            return Ok(0);
        }

        let models = requests
            .into_iter()
            .map(|request| schedule_stop_pairs::ActiveModel {
                id: Set(Uuid::new_v4()),
                feed_version_id: Set(request.feed_version_id),
                origin_onestop_id: Set(request.origin_onestop_id),
                destination_onestop_id: Set(request.destination_onestop_id),
                service_start_date: Set(request.service_start_date),
                service_end_date: Set(request.service_end_date),
            });

        let inserted = ScheduleStopPairs::insert_many(models)
            .exec_without_returning(&*self.connection)
            .await?;

        debug!("Inserted {} schedule stop pairs", inserted);
        Ok(inserted)
    }

    pub async fn find_by_feed_version(
        &self,
        feed_version_id: Uuid,
    ) -> RepositoryResult<Vec<ScheduleStopPair>> {
        let models = ScheduleStopPairs::find()
            .filter(schedule_stop_pairs::Column::FeedVersionId.eq(feed_version_id))
            .order_by_asc(schedule_stop_pairs::Column::OriginOnestopId)
            .order_by_asc(schedule_stop_pairs::Column::ServiceEndDate)
            .all(&*self.connection)
            .await?;

        Ok(models
            .into_iter()
            .map(|model| ScheduleStopPair {
                id: model.id,
                feed_version_id: model.feed_version_id,
                origin_onestop_id: model.origin_onestop_id,
                destination_onestop_id: model.destination_onestop_id,
                service_start_date: model.service_start_date,
                service_end_date: model.service_end_date,
            })
            .collect())
    }

    pub async fn count_by_feed_version(&self, feed_version_id: Uuid) -> RepositoryResult<u64> {
        Ok(ScheduleStopPairs::find()
            .filter(schedule_stop_pairs::Column::FeedVersionId.eq(feed_version_id))
            .count(&*self.connection)
            .await?)
    }

    /// Records of the version still in service on or after `date`
    pub async fn count_ending_on_or_after(
        &self,
        feed_version_id: Uuid,
        date: NaiveDate,
    ) -> RepositoryResult<u64> {
        Ok(ScheduleStopPairs::find()
            .filter(schedule_stop_pairs::Column::FeedVersionId.eq(feed_version_id))
            .filter(schedule_stop_pairs::Column::ServiceEndDate.gte(date))
            .count(&*self.connection)
            .await?)
    }
}
