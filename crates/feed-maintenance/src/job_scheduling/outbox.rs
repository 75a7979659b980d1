//! Database-backed import job outbox
//!
//! Dispatching writes a `pending` row to `import_jobs`; the external import
//! worker claims rows and moves them through the remaining statuses.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::dispatcher::JobDispatcher;
use super::types::{ImportJob, ImportJobStatus, JobSchedulingError, QueuedImportJob};
use crate::entities::{import_jobs, prelude::ImportJobs};

#[derive(Clone)]
pub struct ImportJobOutbox {
    connection: Arc<DatabaseConnection>,
}

impl ImportJobOutbox {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Jobs waiting for the import worker, oldest first
    pub async fn pending_jobs(&self) -> Result<Vec<QueuedImportJob>, JobSchedulingError> {
        ImportJobs::find()
            .filter(import_jobs::Column::Status.eq(ImportJobStatus::Pending.as_str()))
            .order_by_asc(import_jobs::Column::CreatedAt)
            .all(&*self.connection)
            .await?
            .into_iter()
            .map(Self::model_to_domain)
            .collect()
    }

    /// Move a job to another status; returns false when the job does not exist
    pub async fn set_status(
        &self,
        id: Uuid,
        status: ImportJobStatus,
    ) -> Result<bool, JobSchedulingError> {
        let result = ImportJobs::update_many()
            .col_expr(import_jobs::Column::Status, Expr::value(status.as_str()))
            .filter(import_jobs::Column::Id.eq(id))
            .exec(&*self.connection)
            .await?;
        Ok(result.rows_affected > 0)
    }

    fn model_to_domain(model: import_jobs::Model) -> Result<QueuedImportJob, JobSchedulingError> {
        Ok(QueuedImportJob {
            id: model.id,
            status: model.status.parse()?,
            job: ImportJob {
                feed_onestop_id: model.feed_onestop_id,
                feed_version_sha1: model.feed_version_sha1,
                import_level: model.import_level,
            },
            created_at: model.created_at,
        })
    }
}

#[async_trait]
impl JobDispatcher for ImportJobOutbox {
    async fn enqueue(&self, job: ImportJob) -> Result<(), JobSchedulingError> {
        let already_pending = ImportJobs::find()
            .filter(import_jobs::Column::FeedOnestopId.eq(job.feed_onestop_id.as_str()))
            .filter(import_jobs::Column::FeedVersionSha1.eq(job.feed_version_sha1.as_str()))
            .filter(import_jobs::Column::Status.is_in([
                ImportJobStatus::Pending.as_str(),
                ImportJobStatus::Running.as_str(),
            ]))
            .count(&*self.connection)
            .await?;
        if already_pending > 0 {
            return Err(JobSchedulingError::DuplicateJob { key: job.job_key() });
        }

        let active_model = import_jobs::ActiveModel {
            id: Set(Uuid::new_v4()),
            feed_onestop_id: Set(job.feed_onestop_id.clone()),
            feed_version_sha1: Set(job.feed_version_sha1.clone()),
            import_level: Set(job.import_level),
            status: Set(ImportJobStatus::Pending.as_str().to_string()),
            created_at: Set(Utc::now()),
        };
        active_model.insert(&*self.connection).await?;

        debug!("Wrote import job {} to outbox", job.job_key());
        Ok(())
    }
}
