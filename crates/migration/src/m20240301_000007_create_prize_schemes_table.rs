use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PrizeSchemes::Table)
                    .col(
                        ColumnDef::new(PrizeSchemes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PrizeSchemes::Name).string().not_null())
                    .col(
                        ColumnDef::new(PrizeSchemes::CreatedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PrizeSchemes::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PrizeSchemes::Table, PrizeSchemes::CreatedBy)
                            .to(crate::Users::Table, crate::Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PrizeSchemeItems::Table)
                    .col(
                        ColumnDef::new(PrizeSchemeItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PrizeSchemeItems::PrizeSchemeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PrizeSchemeItems::RaceTypeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PrizeSchemeItems::FromPosition)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PrizeSchemeItems::ToPosition)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PrizeSchemeItems::Prize).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(PrizeSchemeItems::Table, PrizeSchemeItems::PrizeSchemeId)
                            .to(PrizeSchemes::Table, PrizeSchemes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PrizeSchemeItems::Table, PrizeSchemeItems::RaceTypeId)
                            .to(crate::RaceTypes::Table, crate::RaceTypes::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PrizeSchemeItems::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PrizeSchemes::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum PrizeSchemes {
    Table,
    Id,
    Name,
    CreatedBy,
    CreatedAt,
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum PrizeSchemeItems {
    Table,
    Id,
    PrizeSchemeId,
    RaceTypeId,
    FromPosition,
    ToPosition,
    Prize,
}
