//! SeaORM-based Feed repository implementation

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{feeds, prelude::Feeds};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{Feed, FeedCreateRequest};
use crate::utils::tags::{parse_tags, serialize_tags};

/// SeaORM-based repository for Feed operations
#[derive(Clone)]
pub struct FeedSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl FeedSeaOrmRepository {
    /// Create a new repository instance
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Create a new feed
    pub async fn create(&self, request: FeedCreateRequest) -> RepositoryResult<Feed> {
        let now = Utc::now();
        let active_model = feeds::ActiveModel {
            id: Set(Uuid::new_v4()),
            onestop_id: Set(request.onestop_id),
            tags: Set(serialize_tags(&request.tags)?),
            active_feed_version_id: Set(None),
            last_imported_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&*self.connection).await?;
        self.model_to_domain(model)
    }

    pub async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Feed>> {
        Feeds::find_by_id(id)
            .one(&*self.connection)
            .await?
            .map(|model| self.model_to_domain(model))
            .transpose()
    }

    /// List all feeds in catalog enumeration order
    pub async fn find_all(&self) -> RepositoryResult<Vec<Feed>> {
        Feeds::find()
            .order_by_asc(feeds::Column::OnestopId)
            .all(&*self.connection)
            .await?
            .into_iter()
            .map(|model| self.model_to_domain(model))
            .collect()
    }

    /// Point the feed at the version it currently serves
    pub async fn set_active_version(
        &self,
        feed_id: Uuid,
        feed_version_id: Option<Uuid>,
    ) -> RepositoryResult<Feed> {
        let mut active_model = self.require(feed_id).await?.into_active_model();
        active_model.active_feed_version_id = Set(feed_version_id);
        active_model.updated_at = Set(Utc::now());
        let model = active_model.update(&*self.connection).await?;
        self.model_to_domain(model)
    }

    /// Record when the feed was last imported
    pub async fn mark_imported(
        &self,
        feed_id: Uuid,
        imported_at: DateTime<Utc>,
    ) -> RepositoryResult<Feed> {
        let mut active_model = self.require(feed_id).await?.into_active_model();
        active_model.last_imported_at = Set(Some(imported_at));
        active_model.updated_at = Set(Utc::now());
        let model = active_model.update(&*self.connection).await?;
        self.model_to_domain(model)
    }

    async fn require(&self, feed_id: Uuid) -> RepositoryResult<feeds::Model> {
        Feeds::find_by_id(feed_id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| RepositoryError::not_found("feeds", "id", feed_id.to_string()))
    }

    /// Convert SeaORM model to domain model
    fn model_to_domain(&self, model: feeds::Model) -> RepositoryResult<Feed> {
        Ok(Feed {
            id: model.id,
            onestop_id: model.onestop_id,
            tags: parse_tags(&model.tags)?,
            active_feed_version_id: model.active_feed_version_id,
            last_imported_at: model.last_imported_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
