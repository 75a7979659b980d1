use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "schedule_stop_pairs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub feed_version_id: Uuid,
    pub origin_onestop_id: String,
    pub destination_onestop_id: String,
    pub service_start_date: Date,
    pub service_end_date: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::feed_versions::Entity",
        from = "Column::FeedVersionId",
        to = "super::feed_versions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    FeedVersions,
}

impl Related<super::feed_versions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeedVersions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
