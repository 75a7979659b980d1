use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create tables in order of dependencies
        self.create_feeds_table(manager).await?;
        self.create_feed_versions_table(manager).await?;
        self.create_feed_version_imports_table(manager).await?;
        self.create_schedule_stop_pairs_table(manager).await?;
        self.create_import_jobs_table(manager).await?;

        self.create_indexes(manager).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order
        manager
            .drop_table(Table::drop().table(ImportJobs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScheduleStopPairs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FeedVersionImports::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FeedVersions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Feeds::Table).to_owned())
            .await?;

        Ok(())
    }
}

impl Migration {
    // Helper functions for database-specific types
    fn create_id_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.uuid().not_null(),
            _ => col.string().not_null(),
        };
        col
    }

    fn create_uuid_fk_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.uuid().not_null(),
            _ => col.string().not_null(),
        };
        col
    }

    fn create_nullable_uuid_fk_column(
        &self,
        manager: &SchemaManager,
        column: impl IntoIden,
    ) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.uuid(),
            _ => col.string(),
        };
        col
    }

    fn create_timestamp_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.timestamp_with_time_zone().not_null(),
            _ => col.string().not_null(),
        };
        col
    }

    fn create_nullable_timestamp_column(
        &self,
        manager: &SchemaManager,
        column: impl IntoIden,
    ) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.timestamp_with_time_zone(),
            _ => col.string(),
        };
        col
    }

    async fn create_feeds_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Feeds::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, Feeds::Id).primary_key())
                    .col(
                        ColumnDef::new(Feeds::OnestopId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Feeds::Tags).text().not_null())
                    // No foreign key: feed_versions also references feeds
                    .col(self.create_nullable_uuid_fk_column(manager, Feeds::ActiveFeedVersionId))
                    .col(self.create_nullable_timestamp_column(manager, Feeds::LastImportedAt))
                    .col(self.create_timestamp_column(manager, Feeds::CreatedAt))
                    .col(self.create_timestamp_column(manager, Feeds::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn create_feed_versions_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FeedVersions::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, FeedVersions::Id).primary_key())
                    .col(self.create_uuid_fk_column(manager, FeedVersions::FeedId))
                    .col(
                        ColumnDef::new(FeedVersions::Sha1)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(FeedVersions::EarliestCalendarDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeedVersions::LatestCalendarDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeedVersions::ImportLevel)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(self.create_timestamp_column(manager, FeedVersions::FetchedAt))
                    .col(ColumnDef::new(FeedVersions::Tags).text().not_null())
                    .col(self.create_timestamp_column(manager, FeedVersions::CreatedAt))
                    .col(self.create_timestamp_column(manager, FeedVersions::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feed_versions_feed_id")
                            .from(FeedVersions::Table, FeedVersions::FeedId)
                            .to(Feeds::Table, Feeds::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_feed_version_imports_table(
        &self,
        manager: &SchemaManager<'_>,
    ) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FeedVersionImports::Table)
                    .if_not_exists()
                    .col(
                        self.create_id_column(manager, FeedVersionImports::Id)
                            .primary_key(),
                    )
                    .col(self.create_uuid_fk_column(manager, FeedVersionImports::FeedVersionId))
                    .col(
                        ColumnDef::new(FeedVersionImports::ImportLevel)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FeedVersionImports::Success).boolean())
                    .col(ColumnDef::new(FeedVersionImports::ExceptionLog).text())
                    .col(self.create_timestamp_column(manager, FeedVersionImports::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feed_version_imports_feed_version_id")
                            .from(FeedVersionImports::Table, FeedVersionImports::FeedVersionId)
                            .to(FeedVersions::Table, FeedVersions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_schedule_stop_pairs_table(
        &self,
        manager: &SchemaManager<'_>,
    ) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScheduleStopPairs::Table)
                    .if_not_exists()
                    .col(
                        self.create_id_column(manager, ScheduleStopPairs::Id)
                            .primary_key(),
                    )
                    .col(self.create_uuid_fk_column(manager, ScheduleStopPairs::FeedVersionId))
                    .col(
                        ColumnDef::new(ScheduleStopPairs::OriginOnestopId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduleStopPairs::DestinationOnestopId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduleStopPairs::ServiceStartDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduleStopPairs::ServiceEndDate)
                            .date()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedule_stop_pairs_feed_version_id")
                            .from(ScheduleStopPairs::Table, ScheduleStopPairs::FeedVersionId)
                            .to(FeedVersions::Table, FeedVersions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_import_jobs_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ImportJobs::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, ImportJobs::Id).primary_key())
                    .col(
                        ColumnDef::new(ImportJobs::FeedOnestopId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ImportJobs::FeedVersionSha1)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ImportJobs::ImportLevel).integer().not_null())
                    .col(ColumnDef::new(ImportJobs::Status).string().not_null())
                    .col(self.create_timestamp_column(manager, ImportJobs::CreatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn create_indexes(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_feed_versions_feed_id")
                    .table(FeedVersions::Table)
                    .col(FeedVersions::FeedId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_feed_versions_latest_calendar_date")
                    .table(FeedVersions::Table)
                    .col(FeedVersions::LatestCalendarDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_feed_version_imports_feed_version_id")
                    .table(FeedVersionImports::Table)
                    .col(FeedVersionImports::FeedVersionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_schedule_stop_pairs_version_end_date")
                    .table(ScheduleStopPairs::Table)
                    .col(ScheduleStopPairs::FeedVersionId)
                    .col(ScheduleStopPairs::ServiceEndDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_import_jobs_status")
                    .table(ImportJobs::Table)
                    .col(ImportJobs::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Feeds {
    Table,
    Id,
    OnestopId,
    Tags,
    ActiveFeedVersionId,
    LastImportedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FeedVersions {
    Table,
    Id,
    FeedId,
    Sha1,
    EarliestCalendarDate,
    LatestCalendarDate,
    ImportLevel,
    FetchedAt,
    Tags,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FeedVersionImports {
    Table,
    Id,
    FeedVersionId,
    ImportLevel,
    Success,
    ExceptionLog,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ScheduleStopPairs {
    Table,
    Id,
    FeedVersionId,
    OriginOnestopId,
    DestinationOnestopId,
    ServiceStartDate,
    ServiceEndDate,
}

#[derive(DeriveIden)]
enum ImportJobs {
    Table,
    Id,
    FeedOnestopId,
    FeedVersionSha1,
    ImportLevel,
    Status,
    CreatedAt,
}
