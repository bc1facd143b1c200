use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Races::Table)
                    .col(
                        ColumnDef::new(Races::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Races::EventId).big_integer().not_null())
                    .col(ColumnDef::new(Races::RaceTypeId).big_integer().not_null())
                    .col(ColumnDef::new(Races::Name).string().not_null())
                    .col(ColumnDef::new(Races::ReleaseAt).timestamp())
                    .col(ColumnDef::new(Races::DistanceKm).double())
                    .col(
                        ColumnDef::new(Races::IsLive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Races::IsClosed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Races::CreatedBy).big_integer().not_null())
                    .col(
                        ColumnDef::new(Races::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Races::Table, Races::EventId)
                            .to(crate::Events::Table, crate::Events::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Races::Table, Races::RaceTypeId)
                            .to(crate::RaceTypes::Table, crate::RaceTypes::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Races::Table, Races::CreatedBy)
                            .to(crate::Users::Table, crate::Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Races::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum Races {
    Table,
    Id,
    EventId,
    RaceTypeId,
    Name,
    ReleaseAt,
    DistanceKm,
    IsLive,
    IsClosed,
    CreatedBy,
    CreatedAt,
}
