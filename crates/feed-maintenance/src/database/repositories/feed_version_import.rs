//! SeaORM-based repository for feed version import attempts
//!
//! Import attempts are append-only. The scheduler only ever asks whether any
//! exist for a version; the import worker is the one that records them.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{feed_version_imports, prelude::FeedVersionImports};
use crate::errors::RepositoryResult;
use crate::models::{FeedVersionImport, FeedVersionImportCreateRequest};

#[derive(Clone)]
pub struct FeedVersionImportSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl FeedVersionImportSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Append an import attempt for a feed version
    pub async fn create(
        &self,
        request: FeedVersionImportCreateRequest,
    ) -> RepositoryResult<FeedVersionImport> {
        let active_model = feed_version_imports::ActiveModel {
            id: Set(Uuid::new_v4()),
            feed_version_id: Set(request.feed_version_id),
            import_level: Set(request.import_level),
            success: Set(request.success),
            exception_log: Set(request.exception_log),
            created_at: Set(Utc::now()),
        };

        let model = active_model.insert(&*self.connection).await?;
        Ok(Self::model_to_domain(model))
    }

    /// Attempts for a version, oldest first
    pub async fn find_by_feed_version(
        &self,
        feed_version_id: Uuid,
    ) -> RepositoryResult<Vec<FeedVersionImport>> {
        let models = FeedVersionImports::find()
            .filter(feed_version_imports::Column::FeedVersionId.eq(feed_version_id))
            .order_by_asc(feed_version_imports::Column::CreatedAt)
            .all(&*self.connection)
            .await?;

        Ok(models.into_iter().map(Self::model_to_domain).collect())
    }

    pub async fn exists_for_feed_version(&self, feed_version_id: Uuid) -> RepositoryResult<bool> {
        let count = FeedVersionImports::find()
            .filter(feed_version_imports::Column::FeedVersionId.eq(feed_version_id))
            .count(&*self.connection)
            .await?;
        Ok(count > 0)
    }

    fn model_to_domain(model: feed_version_imports::Model) -> FeedVersionImport {
        FeedVersionImport {
            id: model.id,
            feed_version_id: model.feed_version_id,
            import_level: model.import_level,
            success: model.success,
            exception_log: model.exception_log,
            created_at: model.created_at,
        }
    }
}
