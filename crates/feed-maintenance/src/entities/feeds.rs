use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "feeds")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub onestop_id: String,
    #[sea_orm(column_type = "Text")]
    pub tags: String,
    pub active_feed_version_id: Option<Uuid>,
    pub last_imported_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::feed_versions::Entity")]
    FeedVersions,
}

impl Related<super::feed_versions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeedVersions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
