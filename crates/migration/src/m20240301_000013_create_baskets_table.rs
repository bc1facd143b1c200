use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Baskets::Table)
                    .col(
                        ColumnDef::new(Baskets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Baskets::RaceId).big_integer().not_null())
                    .col(ColumnDef::new(Baskets::Number).integer().not_null())
                    .col(ColumnDef::new(Baskets::IsRaceBasket).boolean().not_null())
                    .col(ColumnDef::new(Baskets::Capacity).integer())
                    .col(ColumnDef::new(Baskets::CreatedBy).big_integer().not_null())
                    .col(
                        ColumnDef::new(Baskets::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Baskets::Table, Baskets::RaceId)
                            .to(crate::Races::Table, crate::Races::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Baskets::Table, Baskets::CreatedBy)
                            .to(crate::Users::Table, crate::Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_baskets_race_number_type")
                    .table(Baskets::Table)
                    .col(Baskets::RaceId)
                    .col(Baskets::Number)
                    .col(Baskets::IsRaceBasket)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Baskets::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum Baskets {
    Table,
    Id,
    RaceId,
    Number,
    IsRaceBasket,
    Capacity,
    CreatedBy,
    CreatedAt,
}
