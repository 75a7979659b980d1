use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "feed_versions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub feed_id: Uuid,
    #[sea_orm(unique)]
    pub sha1: String,
    pub earliest_calendar_date: Date,
    pub latest_calendar_date: Date,
    pub import_level: i32,
    pub fetched_at: DateTimeUtc,
    #[sea_orm(column_type = "Text")]
    pub tags: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::feeds::Entity",
        from = "Column::FeedId",
        to = "super::feeds::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Feeds,
    #[sea_orm(has_many = "super::feed_version_imports::Entity")]
    FeedVersionImports,
    #[sea_orm(has_many = "super::schedule_stop_pairs::Entity")]
    ScheduleStopPairs,
}

impl Related<super::feeds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Feeds.def()
    }
}

impl Related<super::feed_version_imports::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeedVersionImports.def()
    }
}

impl Related<super::schedule_stop_pairs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduleStopPairs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
