use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .col(
                        ColumnDef::new(Events::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Events::Name).string().not_null())
                    .col(ColumnDef::new(Events::EventTypeId).big_integer().not_null())
                    .col(ColumnDef::new(Events::FeeSchemeId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Events::PrizeSchemeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Events::BettingSchemeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Events::IsOpen)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Events::StartsAt).timestamp().not_null())
                    .col(ColumnDef::new(Events::EndsAt).timestamp().not_null())
                    .col(ColumnDef::new(Events::CreatedBy).big_integer().not_null())
                    .col(
                        ColumnDef::new(Events::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Events::Table, Events::EventTypeId)
                            .to(crate::EventTypes::Table, crate::EventTypes::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Events::Table, Events::FeeSchemeId)
                            .to(crate::FeeSchemes::Table, crate::FeeSchemes::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Events::Table, Events::PrizeSchemeId)
                            .to(crate::PrizeSchemes::Table, crate::PrizeSchemes::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Events::Table, Events::BettingSchemeId)
                            .to(crate::BettingSchemes::Table, crate::BettingSchemes::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Events::Table, Events::CreatedBy)
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
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum Events {
    Table,
    Id,
    Name,
    EventTypeId,
    FeeSchemeId,
    PrizeSchemeId,
    BettingSchemeId,
    IsOpen,
    StartsAt,
    EndsAt,
    CreatedBy,
    CreatedAt,
}
